//! Shared helpers for SDK tests against a mock HTTP server

#![allow(dead_code)]

use httpmock::MockServer;
use skyform_core::{ProviderConfig, ServiceClient};

pub const PROJECT: &str = "proj";
pub const TOKEN: &str = "token-abc";

/// Client for `service` at `version`, pointed at the mock server
pub fn client_for(server: &MockServer, service: &str, version: &str) -> ServiceClient {
    let config = ProviderConfig::new("region-1", PROJECT, TOKEN)
        .with_endpoint(service, server.base_url());
    ServiceClient::for_service(reqwest::Client::new(), &config, service, version, "region-1")
        .expect("client")
}
