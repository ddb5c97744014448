// # skyform-core
//
// Core library for the skyform cloud provider.
//
// ## Architecture Overview
//
// This library provides the pieces every resource kind builds on:
// - **ServiceClient**: HTTP verbs against one service endpoint, typed error classification
// - **ApiResult**: Result envelope of a single API call
// - **RequestBody**: Explicit request-body builder with optional-field semantics
// - **StateRefresh**: Trait for observing the state of one remote resource
// - **StateChangeConf**: Poller that waits for a remote resource to reach a target state
// - **Resource / ResourceRegistry**: Terraform-style CRUD interface and type-name dispatch
//
// ## Design Principles
//
// 1. **Poller owns timing**: Refreshers and resources never sleep or retry
// 2. **Fatal by default**: Only "still pending" is retried; every error kind is terminal
// 3. **Explicit configuration**: No process-wide clients, config is passed in
// 4. **Explicit presence**: `Option` marks request fields, zero values are still sent

pub mod body;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod registry;
pub mod result;
pub mod traits;
pub mod waiter;

// Re-export core types for convenience
pub use body::{RequestBody, ToQuery, ToRequestBody};
pub use client::{RequestOpts, ServiceClient};
pub use config::{ProviderConfig, ResourceTimeouts};
pub use data::ResourceData;
pub use error::{Error, Result};
pub use registry::ResourceRegistry;
pub use result::ApiResult;
pub use traits::{PollOutcome, Resource, ResourceFactory, StateRefresh, refresh_fn};
pub use waiter::{DELETED, Instant, Settled, StateChangeConf, deadline_after};
