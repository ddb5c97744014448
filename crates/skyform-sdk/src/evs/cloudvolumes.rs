//! EVS cloud volumes
//!
//! ## Endpoints
//!
//! - Create: POST `v2.1/{project}/cloudvolumes`
//! - Get: GET `v2/{project}/cloudvolumes/{id}`
//! - Update: PUT `v2/{project}/cloudvolumes/{id}`
//! - Extend: POST `v2.1/{project}/cloudvolumes/{id}/action`
//! - Delete: DELETE `v2/{project}/cloudvolumes/{id}?cascade=...`

use super::{API_VERSION, API_VERSION_ACTIONS};
use crate::time::optional_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use skyform_core::body::append_query;
use skyform_core::{
    ApiResult, RequestBody, RequestOpts, Result, ServiceClient, ToQuery, ToRequestBody,
};
use std::collections::HashMap;
use tracing::debug;

/// Volume states reported by EVS
pub mod status {
    pub const CREATING: &str = "creating";
    pub const AVAILABLE: &str = "available";
    pub const IN_USE: &str = "in-use";
    pub const EXTENDING: &str = "extending";
    pub const DELETING: &str = "deleting";
    pub const DOWNLOADING: &str = "downloading";
    pub const ERROR: &str = "error";
    pub const ERROR_DELETING: &str = "error_deleting";
    pub const ERROR_EXTENDING: &str = "error_extending";
}

/// Properties of the volume to create
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeOpts {
    /// Availability zone (required)
    pub availability_zone: String,

    /// Disk type such as `SATA`, `SAS` or `SSD` (required)
    pub volume_type: String,

    pub name: Option<String>,
    pub description: Option<String>,

    /// Size in GB
    pub size: Option<i64>,

    /// Number of volumes to create in one batch
    pub count: Option<i64>,

    pub backup_id: Option<String>,
    pub snapshot_id: Option<String>,

    /// IMS image to create the volume from
    pub image_id: Option<String>,

    /// Whether the volume can be attached to several servers
    pub multiattach: Option<bool>,

    pub metadata: Option<HashMap<String, String>>,
    pub tags: Option<HashMap<String, String>>,
    pub enterprise_project_id: Option<String>,
}

impl VolumeOpts {
    fn to_body(&self) -> Result<RequestBody> {
        RequestBody::new()
            .required("availability_zone", &self.availability_zone)?
            .required("volume_type", &self.volume_type)?
            .optional("name", self.name.as_ref())?
            .optional("description", self.description.as_ref())?
            .optional("size", self.size)?
            .optional("count", self.count)?
            .optional("backup_id", self.backup_id.as_ref())?
            .optional("snapshot_id", self.snapshot_id.as_ref())?
            .optional("imageRef", self.image_id.as_ref())?
            .optional("multiattach", self.multiattach)?
            .optional("metadata", self.metadata.as_ref())?
            .optional("tags", self.tags.as_ref())?
            .optional("enterprise_project_id", self.enterprise_project_id.as_ref())
    }
}

/// Billing parameters for prepaid volumes (`bssParam`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChargeInfo {
    /// `prePaid` or `postPaid`
    pub charging_mode: Option<String>,
    /// `month` or `year`
    pub period_type: Option<String>,
    pub period_num: Option<i64>,
    pub is_auto_renew: Option<String>,
    pub is_auto_pay: Option<String>,
}

impl ChargeInfo {
    fn to_body(&self) -> Result<RequestBody> {
        RequestBody::new()
            .optional("chargingMode", self.charging_mode.as_ref())?
            .optional("periodType", self.period_type.as_ref())?
            .optional("periodNum", self.period_num)?
            .optional("isAutoRenew", self.is_auto_renew.as_ref())?
            .optional("isAutoPay", self.is_auto_pay.as_ref())
    }
}

/// Scheduler hints (`OS-SCH-HNT:scheduler_hints`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerOpts {
    /// Dedicated distributed storage pool to place the volume in
    pub dedicated_storage_id: Option<String>,
}

/// Options for [`create`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOpts {
    pub volume: VolumeOpts,
    pub charge_info: Option<ChargeInfo>,
    pub scheduler: Option<SchedulerOpts>,

    /// Server to attach a prepaid volume to once created
    pub server_id: Option<String>,
}

impl ToRequestBody for CreateOpts {
    fn to_request_body(&self) -> Result<serde_json::Value> {
        let charge_info = self.charge_info.as_ref().map(ChargeInfo::to_body).transpose()?;
        let scheduler = self
            .scheduler
            .as_ref()
            .map(|s| RequestBody::new().optional("dedicated_storage_id", s.dedicated_storage_id.as_ref()))
            .transpose()?;

        Ok(RequestBody::new()
            .nested("volume", self.volume.to_body()?)
            .nested_optional("bssParam", charge_info)
            .nested_optional("OS-SCH-HNT:scheduler_hints", scheduler)
            .optional("server_id", self.server_id.as_ref())?
            .build())
    }
}

/// Options for [`extend_size`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendOpts {
    /// New size in GB, must be larger than the current size
    pub new_size: i64,

    /// Pay the order automatically (prepaid volumes only)
    pub is_auto_pay: Option<String>,
}

impl ToRequestBody for ExtendOpts {
    fn to_request_body(&self) -> Result<serde_json::Value> {
        let charge = RequestBody::new().optional("is_auto_pay", self.is_auto_pay.as_ref())?;
        Ok(RequestBody::new()
            .nested("os-extend", RequestBody::new().required("new_size", self.new_size)?)
            .nested_optional("bssParam", Some(charge))
            .build())
    }
}

/// Options for [`update`]; only `Some` fields are sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOpts {
    pub name: Option<String>,

    /// `Some("")` clears the description
    pub description: Option<String>,
}

impl ToRequestBody for UpdateOpts {
    fn to_request_body(&self) -> Result<serde_json::Value> {
        Ok(RequestBody::new()
            .optional("name", self.name.as_ref())?
            .optional("description", self.description.as_ref())?
            .wrap("volume"))
    }
}

/// Options for [`delete`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOpts {
    /// Also delete every snapshot of the volume
    pub cascade: bool,
}

impl ToQuery for DeleteOpts {
    fn to_query(&self) -> Vec<(String, String)> {
        vec![("cascade".to_string(), self.cascade.to_string())]
    }
}

/// Response of asynchronous EVS calls (create, extend)
///
/// Postpaid creates usually return the job only; prepaid creates return an
/// order and, once paid, the volume IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobResponse {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub volume_ids: Vec<String>,
}

/// A server attachment of a volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub attachment_id: String,
    #[serde(default)]
    pub device: String,
}

/// An EVS volume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub availability_zone: String,
    #[serde(default)]
    pub volume_type: String,
    #[serde(default)]
    pub multiattach: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub enterprise_project_id: String,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// Create one or more volumes
///
/// # Returns
///
/// An envelope holding a [`JobResponse`]. The volume is not usable until it
/// reaches `available`.
pub async fn create(client: &ServiceClient, opts: &impl ToRequestBody) -> ApiResult {
    let body = match opts.to_request_body() {
        Ok(body) => body,
        Err(e) => return ApiResult::err(e),
    };

    let client = client.with_api_version(API_VERSION, API_VERSION_ACTIONS);
    let url = client.service_url(&["cloudvolumes"]);
    debug!(url = %url, "Creating volume");
    client.post(&url, &body, RequestOpts::default()).await
}

/// Get a volume; a missing volume is a `NotFound` error
pub async fn get(client: &ServiceClient, id: &str) -> ApiResult {
    client
        .get(&client.service_url(&["cloudvolumes", id]), RequestOpts::default())
        .await
}

/// Update the name or description of a volume
pub async fn update(client: &ServiceClient, id: &str, opts: &impl ToRequestBody) -> ApiResult {
    let body = match opts.to_request_body() {
        Ok(body) => body,
        Err(e) => return ApiResult::err(e),
    };
    client
        .put(
            &client.service_url(&["cloudvolumes", id]),
            &body,
            RequestOpts::ok_codes(&[200]),
        )
        .await
}

/// Grow a volume
///
/// Returns immediately; the volume passes through `extending` afterwards.
pub async fn extend_size(client: &ServiceClient, id: &str, opts: &impl ToRequestBody) -> ApiResult {
    let body = match opts.to_request_body() {
        Ok(body) => body,
        Err(e) => return ApiResult::err(e),
    };

    let client = client.with_api_version(API_VERSION, API_VERSION_ACTIONS);
    let url = client.service_url(&["cloudvolumes", id, "action"]);
    debug!(url = %url, "Extending volume");
    client.post(&url, &body, RequestOpts::ok_codes(&[202])).await
}

/// Request deletion of a volume; does not wait for it to disappear
pub async fn delete(client: &ServiceClient, id: &str, opts: Option<&DeleteOpts>) -> ApiResult {
    let base = client.service_url(&["cloudvolumes", id]);
    let url = match opts {
        Some(opts) => match append_query(&base, &opts.to_query()) {
            Ok(url) => url,
            Err(e) => return ApiResult::err(e),
        },
        None => base,
    };
    client.delete(&url, RequestOpts::ok_codes(&[200, 202])).await
}
