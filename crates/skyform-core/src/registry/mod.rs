//! Resource registry
//!
//! The registry maps Terraform-style type names to resource factories so a
//! host can dispatch on the type name found in its configuration, without a
//! hard-coded list of resource kinds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skyform_core::{ProviderConfig, ResourceRegistry};
//!
//! let registry = ResourceRegistry::new();
//! skyform_provider::register(&registry);
//!
//! let config = ProviderConfig::from_env()?;
//! let http = skyform_core::client::build_http_client(&config)?;
//! let nat = registry.create_resource("skyform_vpc_nat_gateway_v2", &config, &http)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{Resource, ResourceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of resource factories keyed by type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ResourceRegistry {
    /// Registered resource factories
    resources: RwLock<HashMap<String, Box<dyn ResourceFactory>>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource factory under its type name
    pub fn register_resource(&self, name: impl Into<String>, factory: Box<dyn ResourceFactory>) {
        let mut resources = self
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        resources.insert(name.into(), factory);
    }

    /// Create a resource for a type name
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Resource>)`: Created resource instance
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_resource(
        &self,
        name: &str,
        config: &ProviderConfig,
        http: &reqwest::Client,
    ) -> Result<Box<dyn Resource>> {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = resources
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown resource type: {}", name)))?;

        factory.create(config, http)
    }

    /// List all registered resource type names, sorted
    pub fn list_resources(&self) -> Vec<String> {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = resources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a resource type is registered
    pub fn has_resource(&self, name: &str) -> bool {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        resources.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockResourceFactory;

    impl ResourceFactory for MockResourceFactory {
        fn create(
            &self,
            _config: &ProviderConfig,
            _http: &reqwest::Client,
        ) -> Result<Box<dyn Resource>> {
            Err(Error::not_found("Mock resource not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ResourceRegistry::new();

        // Initially empty
        assert!(!registry.has_resource("mock"));

        // Register
        registry.register_resource("mock", Box::new(MockResourceFactory));

        // Now present
        assert!(registry.has_resource("mock"));
        assert_eq!(registry.list_resources(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_unknown_resource_type() {
        let registry = ResourceRegistry::new();
        let config = ProviderConfig::new("region", "proj", "token");

        let err = registry
            .create_resource("nope", &config, &reqwest::Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
