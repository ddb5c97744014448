//! VPC NAT gateways
//!
//! Bodies are wrapped under `nat_gateway`, responses likewise.

use crate::time::optional_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use skyform_core::{ApiResult, Error, RequestBody, RequestOpts, Result, ServiceClient, ToRequestBody};
use std::fmt;
use std::str::FromStr;

/// Gateway states
pub mod status {
    pub const ACTIVE: &str = "ACTIVE";
    pub const PENDING_CREATE: &str = "PENDING_CREATE";
    pub const PENDING_UPDATE: &str = "PENDING_UPDATE";
    pub const PENDING_DELETE: &str = "PENDING_DELETE";
    pub const INACTIVE: &str = "INACTIVE";
    pub const ERROR: &str = "ERROR";
}

const ROOT: &str = "nat_gateway";

/// Gateway size
///
/// Sent as the strings `"1"` through `"4"`, from small (up to 10 000
/// connections) to extra-large (up to 1 000 000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spec {
    #[serde(rename = "1")]
    Small,
    #[serde(rename = "2")]
    Medium,
    #[serde(rename = "3")]
    Large,
    #[serde(rename = "4")]
    ExtraLarge,
}

impl Spec {
    /// All sizes, smallest first
    pub const ALL: [Spec; 4] = [Spec::Small, Spec::Medium, Spec::Large, Spec::ExtraLarge];

    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Spec::Small => "1",
            Spec::Medium => "2",
            Spec::Large => "3",
            Spec::ExtraLarge => "4",
        }
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Spec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Spec::ALL
            .into_iter()
            .find(|spec| spec.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "spec must be one of [1 2 3 4], got {s:?}"
                ))
            })
    }
}

/// Options for [`create`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOpts {
    pub name: String,
    pub spec: Spec,
    pub router_id: String,
    pub internal_network_id: String,
    pub description: Option<String>,
    pub tenant_id: Option<String>,
    pub enterprise_project_id: Option<String>,
}

impl ToRequestBody for CreateOpts {
    fn to_request_body(&self) -> Result<serde_json::Value> {
        Ok(RequestBody::new()
            .required("name", &self.name)?
            .required("spec", self.spec)?
            .required("router_id", &self.router_id)?
            .required("internal_network_id", &self.internal_network_id)?
            .optional("description", self.description.as_ref())?
            .optional("tenant_id", self.tenant_id.as_ref())?
            .optional("enterprise_project_id", self.enterprise_project_id.as_ref())?
            .wrap(ROOT))
    }
}

/// Options for [`update`]; only `Some` fields are sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOpts {
    pub name: Option<String>,
    pub description: Option<String>,
    pub spec: Option<Spec>,
}

impl ToRequestBody for UpdateOpts {
    fn to_request_body(&self) -> Result<serde_json::Value> {
        Ok(RequestBody::new()
            .optional("name", self.name.as_ref())?
            .optional("description", self.description.as_ref())?
            .optional("spec", self.spec)?
            .wrap(ROOT))
    }
}

/// A NAT gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatGateway {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw size label, kept as sent so newer sizes still decode
    pub spec: String,
    pub status: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default)]
    pub tenant_id: String,
    pub router_id: String,
    pub internal_network_id: String,
    #[serde(default)]
    pub enterprise_project_id: String,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

impl NatGateway {
    /// The size as a [`Spec`], if it is one this client knows
    pub fn known_spec(&self) -> Option<Spec> {
        self.spec.parse().ok()
    }
}

/// Create a gateway; it starts out `PENDING_CREATE`
pub async fn create(client: &ServiceClient, opts: &impl ToRequestBody) -> ApiResult {
    let body = match opts.to_request_body() {
        Ok(body) => body,
        Err(e) => return ApiResult::err(e),
    };
    client
        .post(
            &client.service_url(&["nat_gateways"]),
            &body,
            RequestOpts::ok_codes(&[200, 201, 202]),
        )
        .await
}

/// Get a gateway; a missing gateway is a `NotFound` error
pub async fn get(client: &ServiceClient, id: &str) -> ApiResult {
    client
        .get(&client.service_url(&["nat_gateways", id]), RequestOpts::default())
        .await
}

/// Update name, description or size of a gateway
pub async fn update(client: &ServiceClient, id: &str, opts: &impl ToRequestBody) -> ApiResult {
    let body = match opts.to_request_body() {
        Ok(body) => body,
        Err(e) => return ApiResult::err(e),
    };
    client
        .put(
            &client.service_url(&["nat_gateways", id]),
            &body,
            RequestOpts::ok_codes(&[200]),
        )
        .await
}

/// Request deletion of a gateway; does not wait for it to disappear
pub async fn delete(client: &ServiceClient, id: &str) -> ApiResult {
    client
        .delete(
            &client.service_url(&["nat_gateways", id]),
            RequestOpts::ok_codes(&[200, 202, 204]),
        )
        .await
}
