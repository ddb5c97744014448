//! Elastic Volume Service
//!
//! Create and extend calls are served by the `v2.1` API while the rest of
//! the volume API lives under `v2`. Callers pass a `v2` client; the
//! operations that need `v2.1` derive a copy with
//! [`ServiceClient::with_api_version`](skyform_core::ServiceClient::with_api_version).

pub mod cloudvolumes;
pub mod jobs;

/// Service name used to derive the endpoint
pub const SERVICE: &str = "evs";

/// API version of the base client
pub const API_VERSION: &str = "v2";

/// API version serving create and extend
pub(crate) const API_VERSION_ACTIONS: &str = "v2.1";
