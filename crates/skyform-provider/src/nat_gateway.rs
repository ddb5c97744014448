//! NAT gateway resource (`skyform_vpc_nat_gateway_v2`)
//!
//! ## Attributes
//!
//! | name                  | kind                          |
//! |-----------------------|-------------------------------|
//! | `region`              | optional, force-new           |
//! | `name`                | required                      |
//! | `description`         | optional                      |
//! | `spec`                | required, `"1"`..`"4"`        |
//! | `tenant_id`           | optional, force-new           |
//! | `router_id`           | required, force-new           |
//! | `internal_network_id` | required, force-new           |
//! | `status`              | computed                      |
//!
//! ## Lifecycle
//!
//! Create waits for `ACTIVE`. Delete polls with [`NatGatewayDeletion`],
//! which keeps asking for deletion until the gateway is gone.

use crate::{PollTimings, check_deleted, region_of};
use async_trait::async_trait;
use skyform_core::{
    DELETED, Error, PollOutcome, ProviderConfig, Resource, ResourceData, ResourceFactory,
    ResourceTimeouts, Result, ServiceClient, StateChangeConf, StateRefresh,
};
use skyform_sdk::vpc::natgateways::{self, CreateOpts, NatGateway, Spec, UpdateOpts, status};
use skyform_sdk::vpc::{NAT_API_VERSION, NAT_SERVICE};
use tracing::{debug, info};

/// Type name the host dispatches on
pub const TYPE_NAME: &str = "skyform_vpc_nat_gateway_v2";

const KIND: &str = "NAT gateway";

/// Response root of the gateway API
const ROOT: &str = "nat_gateway";

/// Reports the current status of one gateway
pub struct NatGatewayState {
    client: ServiceClient,
    id: String,
}

impl NatGatewayState {
    pub fn new(client: ServiceClient, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
        }
    }
}

#[async_trait]
impl StateRefresh for NatGatewayState {
    type Value = NatGateway;

    async fn refresh(&mut self) -> Result<PollOutcome<NatGateway>> {
        let gw: NatGateway = natgateways::get(&self.client, &self.id)
            .await
            .extract_into(ROOT)?;
        debug!(id = %self.id, status = %gw.status, "NAT gateway refreshed");
        let state = gw.status.clone();
        Ok(PollOutcome::new(gw, state))
    }
}

/// Drives a gateway to deletion
///
/// Each refresh reads the gateway. A 404 means it is gone. Otherwise the
/// delete call is re-issued unless the gateway is already `PENDING_DELETE`,
/// and its observed status is reported. A 404 from the delete call also
/// means it is gone, which ends the wait.
pub struct NatGatewayDeletion {
    client: ServiceClient,
    id: String,
}

impl NatGatewayDeletion {
    pub fn new(client: ServiceClient, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
        }
    }

    fn gone(&self) -> PollOutcome<NatGateway> {
        debug!(id = %self.id, "NAT gateway deleted");
        PollOutcome::absent(DELETED)
    }
}

#[async_trait]
impl StateRefresh for NatGatewayDeletion {
    type Value = NatGateway;

    async fn refresh(&mut self) -> Result<PollOutcome<NatGateway>> {
        let gw: NatGateway = match natgateways::get(&self.client, &self.id)
            .await
            .extract_into(ROOT)
        {
            Ok(gw) => gw,
            Err(e) if e.is_not_found() => return Ok(self.gone()),
            Err(e) => return Err(e),
        };

        if gw.status != status::PENDING_DELETE {
            debug!(id = %self.id, status = %gw.status, "Requesting NAT gateway deletion");
            match natgateways::delete(&self.client, &self.id).await.extract_err() {
                Ok(()) => {}
                Err(e) if e.is_not_found() => return Ok(self.gone()),
                Err(e) => return Err(e),
            }
        }

        let state = gw.status.clone();
        Ok(PollOutcome::new(gw, state))
    }
}

/// NAT gateway resource
pub struct NatGatewayResource {
    config: ProviderConfig,
    http: reqwest::Client,
    timings: PollTimings,
}

impl NatGatewayResource {
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            timings: PollTimings::default(),
        }
    }

    /// Override the delay and minimum interval of every wait
    pub fn with_poll_timings(mut self, timings: PollTimings) -> Self {
        self.timings = timings;
        self
    }

    fn client(&self, d: &ResourceData) -> Result<ServiceClient> {
        ServiceClient::for_service(
            self.http.clone(),
            &self.config,
            NAT_SERVICE,
            NAT_API_VERSION,
            region_of(d, &self.config),
        )
    }

    fn timeouts(&self, d: &ResourceData) -> ResourceTimeouts {
        d.timeouts().unwrap_or_else(|| self.default_timeouts())
    }

    fn wait(&self, target: &[&str], pending: &[&str], timeout: std::time::Duration) -> StateChangeConf {
        StateChangeConf::new(target, timeout)
            .with_pending(pending)
            .with_delay(self.timings.delay)
            .with_min_timeout(self.timings.min_timeout)
    }
}

fn parse_spec(d: &ResourceData) -> Result<Spec> {
    d.get_str("spec").unwrap_or_default().parse()
}

#[async_trait]
impl Resource for NatGatewayResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn default_timeouts(&self) -> ResourceTimeouts {
        self.config.timeouts
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let opts = CreateOpts {
            name: d.get_str("name").unwrap_or_default().to_string(),
            spec: parse_spec(d)?,
            router_id: d.get_str("router_id").unwrap_or_default().to_string(),
            internal_network_id: d.get_str("internal_network_id").unwrap_or_default().to_string(),
            description: d.get_str("description").map(str::to_string),
            tenant_id: d.get_non_empty_str("tenant_id").map(str::to_string),
            enterprise_project_id: d
                .get_non_empty_str("enterprise_project_id")
                .map(str::to_string),
        };
        debug!(?opts, "Creating NAT gateway");

        let gw: NatGateway = natgateways::create(&client, &opts)
            .await
            .extract_into(ROOT)
            .map_err(|e| Error::resource("creating NAT gateway", e))?;

        // Known to the host even if the wait below fails
        d.set_id(gw.id.clone());
        info!(id = %gw.id, "Waiting for NAT gateway to become active");

        let conf = self.wait(
            &[status::ACTIVE],
            &[status::PENDING_CREATE],
            self.timeouts(d).create(),
        );
        conf.wait_for_state(&mut NatGatewayState::new(client, &gw.id))
            .await
            .map_err(|e| Error::resource("waiting for NAT gateway to become active", e))?;

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let id = d.require_id(KIND)?.to_string();

        let gw: NatGateway = match natgateways::get(&client, &id).await.extract_into(ROOT) {
            Ok(gw) => gw,
            Err(e) => return check_deleted(d, e, KIND),
        };

        d.set("name", &gw.name)?;
        d.set("description", &gw.description)?;
        d.set("spec", &gw.spec)?;
        d.set("router_id", &gw.router_id)?;
        d.set("internal_network_id", &gw.internal_network_id)?;
        d.set("tenant_id", &gw.tenant_id)?;
        d.set("status", &gw.status)?;
        let region = region_of(d, &self.config).to_string();
        d.set("region", region)?;
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let id = d.require_id(KIND)?.to_string();

        let mut opts = UpdateOpts::default();
        if d.has_change("name") {
            opts.name = Some(d.get_str("name").unwrap_or_default().to_string());
        }
        if d.has_change("description") {
            opts.description = Some(d.get_str("description").unwrap_or_default().to_string());
        }
        if d.has_change("spec") {
            opts.spec = Some(parse_spec(d)?);
        }

        if opts == UpdateOpts::default() {
            debug!(id = %id, "No NAT gateway fields changed");
            return self.read(d).await;
        }
        debug!(id = %id, ?opts, "Updating NAT gateway");

        natgateways::update(&client, &id, &opts)
            .await
            .extract_err()
            .map_err(|e| Error::resource("updating NAT gateway", e))?;

        let conf = self.wait(
            &[status::ACTIVE],
            &[status::PENDING_UPDATE],
            self.timeouts(d).update(),
        );
        conf.wait_for_state(&mut NatGatewayState::new(client, &id))
            .await
            .map_err(|e| Error::resource("waiting for NAT gateway update", e))?;

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let id = d.require_id(KIND)?.to_string();
        info!(id = %id, "Deleting NAT gateway");

        let conf = self.wait(
            &[DELETED],
            &[
                status::ACTIVE,
                status::INACTIVE,
                status::ERROR,
                status::PENDING_DELETE,
            ],
            self.timeouts(d).delete(),
        );
        conf.wait_for_state(&mut NatGatewayDeletion::new(client, &id))
            .await
            .map_err(|e| Error::resource("deleting NAT gateway", e))?;

        d.clear_id();
        Ok(())
    }
}

/// Factory for [`NatGatewayResource`]
pub struct NatGatewayFactory;

impl ResourceFactory for NatGatewayFactory {
    fn create(&self, config: &ProviderConfig, http: &reqwest::Client) -> Result<Box<dyn Resource>> {
        config.validate()?;
        Ok(Box::new(NatGatewayResource::new(config.clone(), http.clone())))
    }
}
