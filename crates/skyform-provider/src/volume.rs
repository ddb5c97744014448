//! EVS volume resource (`skyform_evs_volume_v3`)
//!
//! ## Attributes
//!
//! | name                    | kind                                  |
//! |-------------------------|---------------------------------------|
//! | `region`                | optional, force-new                   |
//! | `availability_zone`     | required, force-new                   |
//! | `volume_type`           | required, force-new                   |
//! | `name`                  | optional                              |
//! | `description`           | optional                              |
//! | `size`                  | optional, can only grow               |
//! | `image_id`              | optional, force-new                   |
//! | `backup_id`             | optional, force-new                   |
//! | `snapshot_id`           | optional, force-new                   |
//! | `multiattach`           | optional, force-new                   |
//! | `tags`                  | optional map                          |
//! | `enterprise_project_id` | optional, force-new                   |
//! | `dedicated_storage_id`  | optional, force-new                   |
//! | `cascade`               | optional, delete snapshots on destroy |
//! | `status`, `attachment`  | computed                              |
//!
//! ## Lifecycle
//!
//! Create returns a job. When the response carries no volume ID the job is
//! polled until it names one, then the volume is polled until `available`.
//! Growing `size` extends the volume and waits for the extension to finish.

use crate::{PollTimings, check_deleted, region_of};
use async_trait::async_trait;
use serde_json::json;
use skyform_core::{
    DELETED, Error, Instant, PollOutcome, ProviderConfig, Resource, ResourceData,
    ResourceFactory, ResourceTimeouts, Result, ServiceClient, StateChangeConf, StateRefresh,
    deadline_after,
};
use skyform_sdk::evs::cloudvolumes::{
    self, CreateOpts, DeleteOpts, ExtendOpts, JobResponse, SchedulerOpts, UpdateOpts, Volume,
    VolumeOpts, status,
};
use skyform_sdk::evs::jobs::{self, Job};
use skyform_sdk::evs::{API_VERSION, SERVICE};
use std::time::Duration;
use tracing::{debug, info};

/// Type name the host dispatches on
pub const TYPE_NAME: &str = "skyform_evs_volume_v3";

const KIND: &str = "volume";

/// Response root of the volume API
const ROOT: &str = "volume";

/// Reports the status of one volume
pub struct VolumeState {
    client: ServiceClient,
    id: String,
}

impl VolumeState {
    pub fn new(client: ServiceClient, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
        }
    }
}

#[async_trait]
impl StateRefresh for VolumeState {
    type Value = Volume;

    async fn refresh(&mut self) -> Result<PollOutcome<Volume>> {
        let volume: Volume = cloudvolumes::get(&self.client, &self.id)
            .await
            .extract_into(ROOT)?;
        debug!(id = %self.id, status = %volume.status, "Volume refreshed");
        let state = volume.status.clone();
        Ok(PollOutcome::new(volume, state))
    }
}

/// Reports the status of one EVS job
///
/// A failed job is an error carrying the backend's reason rather than an
/// unexpected state label.
pub struct JobState {
    client: ServiceClient,
    job_id: String,
}

impl JobState {
    pub fn new(client: ServiceClient, job_id: impl Into<String>) -> Self {
        Self {
            client,
            job_id: job_id.into(),
        }
    }
}

#[async_trait]
impl StateRefresh for JobState {
    type Value = Job;

    async fn refresh(&mut self) -> Result<PollOutcome<Job>> {
        let job: Job = jobs::get(&self.client, &self.job_id).await.extract()?;
        debug!(job_id = %self.job_id, status = %job.status, "Job refreshed");

        if job.status == jobs::status::FAIL {
            return Err(Error::Other(format!(
                "job {} failed: {}",
                self.job_id,
                job.failure()
            )));
        }
        let state = job.status.clone();
        Ok(PollOutcome::new(job, state))
    }
}

/// Drives a volume to deletion
///
/// While the volume is present and not yet `deleting`, every refresh sends
/// the delete call again, so a dropped request is repeated. A 404 from
/// either call means it is gone, which ends the wait.
pub struct VolumeDeletion {
    client: ServiceClient,
    id: String,
    opts: DeleteOpts,
}

impl VolumeDeletion {
    pub fn new(client: ServiceClient, id: impl Into<String>, opts: DeleteOpts) -> Self {
        Self {
            client,
            id: id.into(),
            opts,
        }
    }

    fn gone(&self) -> PollOutcome<Volume> {
        debug!(id = %self.id, "Volume deleted");
        PollOutcome::absent(DELETED)
    }
}

#[async_trait]
impl StateRefresh for VolumeDeletion {
    type Value = Volume;

    async fn refresh(&mut self) -> Result<PollOutcome<Volume>> {
        let volume: Volume = match cloudvolumes::get(&self.client, &self.id)
            .await
            .extract_into(ROOT)
        {
            Ok(volume) => volume,
            Err(e) if e.is_not_found() => return Ok(self.gone()),
            Err(e) => return Err(e),
        };

        if volume.status != status::DELETING {
            debug!(id = %self.id, cascade = self.opts.cascade, "Requesting volume deletion");
            match cloudvolumes::delete(&self.client, &self.id, Some(&self.opts))
                .await
                .extract_err()
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => return Ok(self.gone()),
                Err(e) => return Err(e),
            }
        }

        let state = volume.status.clone();
        Ok(PollOutcome::new(volume, state))
    }
}

/// EVS volume resource
pub struct VolumeResource {
    config: ProviderConfig,
    http: reqwest::Client,
    timings: PollTimings,
}

impl VolumeResource {
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
            SERVICE,
            API_VERSION,
            region_of(d, &self.config),
        )
    }

    fn timeouts(&self, d: &ResourceData) -> ResourceTimeouts {
        d.timeouts().unwrap_or_else(|| self.default_timeouts())
    }

    fn wait(&self, target: &[&str], pending: &[&str], timeout: Duration) -> StateChangeConf {
        StateChangeConf::new(target, timeout)
            .with_pending(pending)
            .with_delay(self.timings.delay)
            .with_min_timeout(self.timings.min_timeout)
    }

    fn create_opts(d: &ResourceData) -> Result<CreateOpts> {
        let owned = |key: &str| d.get_non_empty_str(key).map(str::to_string);

        Ok(CreateOpts {
            volume: VolumeOpts {
                availability_zone: d.get_str("availability_zone").unwrap_or_default().to_string(),
                volume_type: d.get_str("volume_type").unwrap_or_default().to_string(),
                name: owned("name"),
                description: owned("description"),
                size: d.get_i64("size"),
                count: None,
                backup_id: owned("backup_id"),
                snapshot_id: owned("snapshot_id"),
                image_id: owned("image_id"),
                multiattach: d.get_bool("multiattach"),
                metadata: None,
                tags: d.get_string_map("tags")?,
                enterprise_project_id: owned("enterprise_project_id"),
            },
            charge_info: None,
            scheduler: owned("dedicated_storage_id").map(|id| SchedulerOpts {
                dedicated_storage_id: Some(id),
            }),
            server_id: None,
        })
    }

    /// Resolve the volume ID of a create response, polling the job if needed
    async fn created_volume_id(
        &self,
        client: &ServiceClient,
        response: JobResponse,
        timeout: Duration,
        deadline: Instant,
    ) -> Result<String> {
        if let Some(id) = response.volume_ids.into_iter().next() {
            return Ok(id);
        }
        if response.job_id.is_empty() {
            return Err(Error::Other(
                "create response carried neither a volume ID nor a job ID".to_string(),
            ));
        }

        info!(job_id = %response.job_id, "Waiting for volume creation job");
        let conf = self
            .wait(
                &[jobs::status::SUCCESS],
                &[jobs::status::INIT, jobs::status::RUNNING],
                timeout,
            )
            .with_deadline(deadline);
        let job = conf
            .wait_for_state(&mut JobState::new(client.clone(), &response.job_id))
            .await?
            .into_value()?;

        job.volume_id().map(str::to_string).ok_or_else(|| {
            Error::Other(format!("job {} finished without a volume ID", response.job_id))
        })
    }
}

#[async_trait]
impl Resource for VolumeResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn default_timeouts(&self) -> ResourceTimeouts {
        self.config.timeouts
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let opts = Self::create_opts(d)?;
        debug!(?opts, "Creating volume");

        let response: JobResponse = cloudvolumes::create(&client, &opts)
            .await
            .extract()
            .map_err(|e| Error::resource("creating volume", e))?;

        // The job wait and the volume wait share one create deadline
        let timeout = self.timeouts(d).create();
        let deadline = deadline_after(timeout);
        let id = self
            .created_volume_id(&client, response, timeout, deadline)
            .await
            .map_err(|e| Error::resource("creating volume", e))?;
        d.set_id(id.clone());
        info!(id = %id, "Waiting for volume to become available");

        let conf = self
            .wait(
                &[status::AVAILABLE],
                &[status::CREATING, status::DOWNLOADING],
                timeout,
            )
            .with_deadline(deadline);
        conf.wait_for_state(&mut VolumeState::new(client, &id))
            .await
            .map_err(|e| Error::resource("waiting for volume to become available", e))?;

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let id = d.require_id(KIND)?.to_string();

        let volume: Volume = match cloudvolumes::get(&client, &id).await.extract_into(ROOT) {
            Ok(volume) => volume,
            Err(e) => return check_deleted(d, e, KIND),
        };

        d.set("name", &volume.name)?;
        d.set("description", &volume.description)?;
        d.set("size", volume.size)?;
        d.set("availability_zone", &volume.availability_zone)?;
        d.set("volume_type", &volume.volume_type)?;
        d.set("multiattach", volume.multiattach)?;
        d.set("tags", &volume.tags)?;
        d.set("enterprise_project_id", &volume.enterprise_project_id)?;
        d.set("status", &volume.status)?;
        let attachment: Vec<_> = volume
            .attachments
            .iter()
            .map(|a| json!({"server_id": a.server_id, "device": a.device}))
            .collect();
        d.set("attachment", attachment)?;
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
        if opts != UpdateOpts::default() {
            debug!(id = %id, ?opts, "Updating volume");
            cloudvolumes::update(&client, &id, &opts)
                .await
                .extract_err()
                .map_err(|e| Error::resource("updating volume", e))?;
        }

        if d.has_change("size") {
            let new_size = d
                .get_i64("size")
                .ok_or_else(|| Error::invalid_input("size cannot be removed from a volume"))?;
            let current: Volume = cloudvolumes::get(&client, &id)
                .await
                .extract_into(ROOT)
                .map_err(|e| Error::resource("reading volume", e))?;

            if new_size < current.size {
                return Err(Error::invalid_input(format!(
                    "volume size can only grow, {} GB is smaller than {} GB",
                    new_size, current.size
                )));
            }
            if new_size > current.size {
                info!(id = %id, from = current.size, to = new_size, "Extending volume");
                let extend = ExtendOpts {
                    new_size,
                    is_auto_pay: None,
                };
                cloudvolumes::extend_size(&client, &id, &extend)
                    .await
                    .extract_err()
                    .map_err(|e| Error::resource("extending volume", e))?;

                let conf = self.wait(
                    &[status::AVAILABLE, status::IN_USE],
                    &[status::EXTENDING],
                    self.timeouts(d).update(),
                );
                conf.wait_for_state(&mut VolumeState::new(client, &id))
                    .await
                    .map_err(|e| Error::resource("waiting for volume extension", e))?;
            }
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let client = self.client(d)?;
        let id = d.require_id(KIND)?.to_string();
        let opts = DeleteOpts {
            cascade: d.get_bool("cascade").unwrap_or(false),
        };
        info!(id = %id, cascade = opts.cascade, "Deleting volume");

        let conf = self.wait(
            &[DELETED],
            &[status::AVAILABLE, status::ERROR, status::DELETING],
            self.timeouts(d).delete(),
        );
        conf.wait_for_state(&mut VolumeDeletion::new(client, &id, opts))
            .await
            .map_err(|e| Error::resource("deleting volume", e))?;

        d.clear_id();
        Ok(())
    }
}

/// Factory for [`VolumeResource`]
pub struct VolumeFactory;

impl ResourceFactory for VolumeFactory {
    fn create(&self, config: &ProviderConfig, http: &reqwest::Client) -> Result<Box<dyn Resource>> {
        config.validate()?;
        Ok(Box::new(VolumeResource::new(config.clone(), http.clone())))
    }
}
