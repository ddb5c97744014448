// # Resource Trait
//
// Defines the Terraform-style CRUD interface for one managed resource kind.
//
// ## Implementations
//
// - NAT gateway and EVS volume: `skyform-provider` crate
//
// ## Usage
//
// ```rust,ignore
// use skyform_core::{Resource, ResourceData};
//
// let mut d = ResourceData::new(serde_json::json!({
//     "name": "gw",
//     "spec": "1",
//     "router_id": "vpc-1",
//     "internal_network_id": "net-1",
// }))?;
// resource.create(&mut d).await?;
// println!("created {}", d.id().unwrap_or_default());
// ```

use crate::config::{ProviderConfig, ResourceTimeouts};
use crate::data::ResourceData;
use async_trait::async_trait;

/// Trait for managed resource implementations
///
/// Each operation reads its inputs from and writes its results to the
/// [`ResourceData`]. Long-running operations block until the remote side
/// converges, using [`StateChangeConf`](crate::waiter::StateChangeConf).
///
/// # Error Handling
///
/// Errors are returned to the host as-is (wrapped with the action that
/// failed). Resources never retry on their own; the only retrying happens
/// inside the poller while the remote state is still pending.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name the host dispatches on, e.g. `skyform_vpc_nat_gateway_v2`
    fn type_name(&self) -> &'static str;

    /// Deadlines used when the host does not set any
    fn default_timeouts(&self) -> ResourceTimeouts {
        ResourceTimeouts::default()
    }

    /// Create the remote resource and wait until it is usable
    async fn create(&self, d: &mut ResourceData) -> crate::Result<()>;

    /// Refresh `d` from the remote resource; clears the ID if it is gone
    async fn read(&self, d: &mut ResourceData) -> crate::Result<()>;

    /// Push changed fields to the remote resource
    async fn update(&self, d: &mut ResourceData) -> crate::Result<()>;

    /// Delete the remote resource and wait until it is gone
    async fn delete(&self, d: &mut ResourceData) -> crate::Result<()>;
}

/// Helper trait for constructing resources from configuration
pub trait ResourceFactory: Send + Sync {
    /// Create a Resource instance bound to a provider configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider-wide configuration
    /// - `http`: Shared HTTP client
    fn create(
        &self,
        config: &ProviderConfig,
        http: &reqwest::Client,
    ) -> crate::Result<Box<dyn Resource>>;
}
