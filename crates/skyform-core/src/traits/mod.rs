//! Core traits for the skyform system
//!
//! - [`StateRefresh`]: Observe and classify the state of one remote resource
//! - [`Resource`]: Create/read/update/delete one managed resource kind

pub mod resource;
pub mod state_refresh;

pub use resource::{Resource, ResourceFactory};
pub use state_refresh::{PollOutcome, RefreshFn, StateRefresh, refresh_fn};
