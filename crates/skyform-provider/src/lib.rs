// # skyform-provider
//
// Terraform-style resources built on `skyform-sdk`.
//
// ## Resources
//
// | type name                    | implementation                     |
// |------------------------------|------------------------------------|
// | `skyform_vpc_nat_gateway_v2` | [`nat_gateway::NatGatewayResource`] |
// | `skyform_evs_volume_v3`      | [`volume::VolumeResource`]          |
//
// ## Responsibilities
//
// Each resource turns `ResourceData` into SDK option structs, issues one
// SDK call per step and hands a refresher to `StateChangeConf` whenever the
// backend converges asynchronously. Resources never sleep or retry on their
// own.
//
// ## Usage
//
// ```rust,ignore
// let registry = ResourceRegistry::new();
// skyform_provider::register(&registry);
// ```

pub mod logging;
pub mod nat_gateway;
pub mod volume;

use skyform_core::{Error, ProviderConfig, ResourceData, ResourceRegistry, Result};
use std::time::Duration;
use tracing::info;

pub use nat_gateway::{NatGatewayDeletion, NatGatewayFactory, NatGatewayResource};
pub use volume::{VolumeDeletion, VolumeFactory, VolumeResource};

/// Register every resource kind of this provider
pub fn register(registry: &ResourceRegistry) {
    registry.register_resource(nat_gateway::TYPE_NAME, Box::new(NatGatewayFactory));
    registry.register_resource(volume::TYPE_NAME, Box::new(VolumeFactory));
}

/// Timing of the waits a resource performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimings {
    /// Wait before the first refresh
    pub delay: Duration,
    /// Minimum time between refreshes
    pub min_timeout: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            min_timeout: Duration::from_secs(3),
        }
    }
}

/// Region of a resource: its own `region` attribute, or the provider default
pub(crate) fn region_of<'a>(d: &'a ResourceData, config: &'a ProviderConfig) -> &'a str {
    d.get_non_empty_str("region").unwrap_or(&config.region)
}

/// Handle a failed read
///
/// A 404 means the resource vanished outside of our control: the ID is
/// cleared so the host plans a re-create, and the read succeeds. Any other
/// error is returned with context.
pub fn check_deleted(d: &mut ResourceData, err: Error, kind: &str) -> Result<()> {
    if err.is_not_found() {
        info!(kind, id = d.id().unwrap_or_default(), "Resource is gone, removing it from state");
        d.clear_id();
        return Ok(());
    }
    Err(Error::resource(format!("reading {kind}"), err))
}
