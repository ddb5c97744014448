//! Shared helpers for resource lifecycle tests

#![allow(dead_code)]

use httpmock::{Mock, MockServer};
use skyform_core::ProviderConfig;
use skyform_provider::PollTimings;
use std::time::Duration;

/// Waits short enough to keep the tests fast on a real clock
pub const FAST: PollTimings = PollTimings {
    delay: Duration::ZERO,
    min_timeout: Duration::from_millis(10),
};

/// Provider configuration with `service` pointed at the mock server
pub fn config_for(server: &MockServer, service: &str) -> ProviderConfig {
    ProviderConfig::new("region-1", "proj", "token-abc").with_endpoint(service, server.base_url())
}

/// Block until `mock` has been hit at least `hits` times
pub async fn wait_for_hits(mock: &Mock<'_>, hits: usize) {
    while mock.hits_async().await < hits {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
