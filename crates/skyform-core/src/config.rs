//! Configuration types for the skyform system
//!
//! A [`ProviderConfig`] is built once by the host and passed explicitly to
//! every component that needs a service client. There is no process-wide
//! client cache.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Default cloud domain used to derive service endpoints
pub const DEFAULT_DOMAIN: &str = "myhuaweicloud.com";

/// Provider-wide configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Default region for resources that do not set one
    pub region: String,

    /// Cloud domain, endpoints are `https://{service}.{region}.{domain}`
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Project (tenant) ID substituted into resource paths
    pub project_id: String,

    /// IAM token sent as `X-Auth-Token`
    /// ⚠️ NEVER log this value
    pub auth_token: String,

    /// Per-service endpoint overrides (service name → base URL)
    #[serde(default)]
    pub endpoints: HashMap<String, String>,

    /// HTTP request timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Default timeouts for long-running resource operations
    #[serde(default)]
    pub timeouts: ResourceTimeouts,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("domain", &self.domain)
            .field("project_id", &self.project_id)
            .field("auth_token", &"<REDACTED>")
            .field("endpoints", &self.endpoints)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a new configuration with default domain and timeouts
    pub fn new(
        region: impl Into<String>,
        project_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            domain: default_domain(),
            project_id: project_id.into(),
            auth_token: auth_token.into(),
            endpoints: HashMap::new(),
            http_timeout_secs: default_http_timeout_secs(),
            timeouts: ResourceTimeouts::default(),
        }
    }

    /// Override the base URL of one service (e.g. a private endpoint or a test server)
    pub fn with_endpoint(mut self, service: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(service.into(), url.into());
        self
    }

    /// Replace the default resource timeouts
    pub fn with_timeouts(mut self, timeouts: ResourceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Load configuration from `SKYFORM_*` environment variables
    ///
    /// - `SKYFORM_REGION` (required)
    /// - `SKYFORM_PROJECT_ID` (required)
    /// - `SKYFORM_AUTH_TOKEN` (required)
    /// - `SKYFORM_DOMAIN`
    /// - `SKYFORM_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, crate::Error> {
        let required = |name: &str| {
            env::var(name).map_err(|_| crate::Error::config(format!("{name} is required")))
        };

        let mut config = Self::new(
            required("SKYFORM_REGION")?,
            required("SKYFORM_PROJECT_ID")?,
            required("SKYFORM_AUTH_TOKEN")?,
        );

        if let Ok(domain) = env::var("SKYFORM_DOMAIN") {
            config.domain = domain;
        }
        if let Ok(secs) = env::var("SKYFORM_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = secs.parse().map_err(|_| {
                crate::Error::config(format!(
                    "SKYFORM_HTTP_TIMEOUT_SECS must be a number of seconds. Got: {secs}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.region.is_empty() {
            return Err(crate::Error::config("Region cannot be empty"));
        }
        if self.project_id.is_empty() {
            return Err(crate::Error::config("Project ID cannot be empty"));
        }
        if self.auth_token.is_empty() {
            return Err(crate::Error::config("Auth token cannot be empty"));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        for (service, url) in &self.endpoints {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "Endpoint for service {service} must use HTTP or HTTPS scheme. Got: {url}"
                )));
            }
        }

        self.timeouts.validate()
    }

    /// Base URL for a service in a region, honouring overrides
    pub fn endpoint_for(&self, service: &str, region: &str) -> String {
        match self.endpoints.get(service) {
            Some(url) if url.ends_with('/') => url.clone(),
            Some(url) => format!("{url}/"),
            None => format!("https://{}.{}.{}/", service, region, self.domain),
        }
    }

    /// HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Deadlines for long-running create/update/delete operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTimeouts {
    /// Create deadline (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub create_secs: u64,

    /// Update deadline (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub update_secs: u64,

    /// Delete deadline (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub delete_secs: u64,
}

impl ResourceTimeouts {
    /// Validate the timeouts
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.create_secs == 0 || self.update_secs == 0 || self.delete_secs == 0 {
            return Err(crate::Error::config("Resource timeouts must be > 0"));
        }
        Ok(())
    }

    /// Create deadline
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    /// Update deadline
    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    /// Delete deadline
    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            create_secs: default_operation_timeout_secs(),
            update_secs: default_operation_timeout_secs(),
            delete_secs: default_operation_timeout_secs(),
        }
    }
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_operation_timeout_secs() -> u64 {
    600
}
