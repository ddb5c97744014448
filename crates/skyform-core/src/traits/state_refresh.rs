// # State Refresh Trait
//
// Defines the interface the state poller uses to observe a remote resource.
//
// ## Implementations
//
// - Per resource kind in `skyform-provider` (NAT gateway, volume, EVS job)
// - Ad hoc closures through [`refresh_fn`]
//
// ## Usage
//
// ```rust,ignore
// use skyform_core::{PollOutcome, StateChangeConf, refresh_fn};
//
// let mut refresher = refresh_fn(|| async {
//     let gw = natgateways::get(&client, &id).await.extract_into::<NatGateway>("nat_gateway")?;
//     let state = gw.status.clone();
//     Ok(PollOutcome::new(gw, state))
// });
//
// let settled = StateChangeConf::new(&["ACTIVE"], timeout)
//     .with_pending(&["PENDING_CREATE"])
//     .wait_for_state(&mut refresher)
//     .await?;
// ```

use async_trait::async_trait;
use std::future::Future;

/// One observation of a remote resource
///
/// Together with the `Err` side of the surrounding `Result` this is the
/// (value, state, error) triple the poller classifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome<T> {
    /// Current value, `None` when the resource could not be seen
    pub value: Option<T>,
    /// Current state label
    pub state: String,
}

impl<T> PollOutcome<T> {
    /// An observation carrying the current value
    pub fn new(value: T, state: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            state: state.into(),
        }
    }

    /// An observation without a value (e.g. the resource is gone)
    pub fn absent(state: impl Into<String>) -> Self {
        Self {
            value: None,
            state: state.into(),
        }
    }
}

/// Trait for refreshing the observed state of one remote resource
///
/// A refresher is owned by exactly one poll loop and may keep state between
/// calls (`&mut self`), e.g. to remember that a delete was already issued.
///
/// # Contract
///
/// - Perform at most the API calls needed for one observation
/// - Never sleep or retry: cadence and deadlines belong to
///   [`StateChangeConf`](crate::waiter::StateChangeConf)
/// - Return `Err` only for failures the poller should classify; an
///   in-progress resource is `Ok` with a pending label
#[async_trait]
pub trait StateRefresh: Send {
    /// The observed resource type
    type Value: Send;

    /// Fetch the current remote state and classify it
    async fn refresh(&mut self) -> crate::Result<PollOutcome<Self::Value>>;
}

/// [`StateRefresh`] backed by a closure returning a future
pub struct RefreshFn<F> {
    f: F,
}

/// Adapt a closure into a [`StateRefresh`]
pub fn refresh_fn<F, Fut, T>(f: F) -> RefreshFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = crate::Result<PollOutcome<T>>> + Send,
    T: Send,
{
    RefreshFn { f }
}

#[async_trait]
impl<F, Fut, T> StateRefresh for RefreshFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = crate::Result<PollOutcome<T>>> + Send,
    T: Send,
{
    type Value = T;

    async fn refresh(&mut self) -> crate::Result<PollOutcome<T>> {
        (self.f)().await
    }
}
