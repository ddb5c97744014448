//! EVS asynchronous jobs
//!
//! Create and extend calls answer with a job ID. The job record tells
//! whether the backend finished the work and which volume it produced.

use super::API_VERSION;
use serde::Deserialize;
use skyform_core::{ApiResult, RequestOpts, ServiceClient};

/// Job states
pub mod status {
    pub const INIT: &str = "INIT";
    pub const RUNNING: &str = "RUNNING";
    pub const SUCCESS: &str = "SUCCESS";
    pub const FAIL: &str = "FAIL";
}

/// Job query API version
const JOBS_API_VERSION: &str = "v1";

/// Objects a job operates on
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobEntities {
    #[serde(default)]
    pub volume_id: Option<String>,

    /// Per-volume jobs of a batch create
    #[serde(default)]
    pub sub_jobs: Vec<Job>,
}

/// An EVS job record
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub job_type: String,
    pub status: String,
    #[serde(default)]
    pub entities: JobEntities,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

impl Job {
    /// ID of the volume this job produced, looking into sub-jobs of a batch
    pub fn volume_id(&self) -> Option<&str> {
        self.entities
            .volume_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.entities.sub_jobs.iter().find_map(Job::volume_id))
    }

    /// Failure description, if the backend gave one
    pub fn failure(&self) -> String {
        match (&self.error_code, &self.fail_reason) {
            (Some(code), Some(reason)) => format!("{code}: {reason}"),
            (None, Some(reason)) => reason.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "no reason given".to_string(),
        }
    }
}

/// Get a job record
///
/// Jobs live under the `v1` API; `client` is the regular `v2` volume client.
pub async fn get(client: &ServiceClient, job_id: &str) -> ApiResult {
    let client = client.with_api_version(API_VERSION, JOBS_API_VERSION);
    client
        .get(&client.service_url(&["jobs", job_id]), RequestOpts::default())
        .await
}
