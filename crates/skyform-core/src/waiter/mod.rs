//! State poller
//!
//! [`StateChangeConf`] converges a long-running create/update/delete to a
//! terminal, observable state. It owns every timing decision: the initial
//! delay, the cadence between refreshes and the overall deadline.
//!
//! ## Flow
//!
//! ```text
//!  delay ──► refresh ──┬── Err(NotFound) && target ∋ DELETED ──► Ok (deleted)
//!               ▲      ├── Err(other) ─────────────────────────► Err (fatal)
//!               │      ├── state ∈ target ─────────────────────► Ok (settled)
//!               │      ├── no value, state ∉ target ───────────► not-found tick
//!               │      ├── state ∈ pending ──┐
//!               │      └── anything else ────┼─────────────────► Err (unexpected state)
//!               └──────── sleep ◄────────────┘
//!                           │
//!                           └── deadline passed ───────────────► Err (timeout)
//! ```
//!
//! ## Concurrency
//!
//! A poll loop borrows its refresher mutably and owns its own timer, so
//! independent resources can be polled concurrently with no shared state.
//! The deadline is the only cancellation mechanism.

use crate::error::{Error, Result};
use crate::traits::{PollOutcome, StateRefresh};
use std::time::Duration;
use tokio::time::{sleep, timeout_at};
use tracing::{debug, info, warn};

pub use tokio::time::Instant;

/// Target label signalling that the resource is expected to disappear
///
/// When it is part of the target set, a `NotFound` error from the refresher
/// is terminal success rather than a failure.
pub const DELETED: &str = "DELETED";

/// Number of consecutive "no value" observations tolerated by default
pub const DEFAULT_NOT_FOUND_CHECKS: usize = 20;

/// First backoff step when no poll interval is configured
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Upper bound of the exponential backoff
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Stand-in for a deadline that does not fit in an [`Instant`]
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Point in time `timeout` from now
///
/// Timeouts too large to represent are clamped to about thirty years.
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    /// Last observed value (`None` when the resource is gone)
    pub value: Option<T>,
    /// Target label that ended the wait
    pub state: String,
    /// Number of refresh calls made
    pub refreshes: usize,
}

impl<T> Settled<T> {
    /// The observed value, or `NotFound` if the wait ended without one
    pub fn into_value(self) -> Result<T> {
        self.value.ok_or_else(|| {
            Error::not_found(format!("no value observed in state {}", self.state))
        })
    }
}

/// Configuration of one wait for a remote state change
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    /// Labels meaning "still in progress"
    pub pending: Vec<String>,

    /// Labels meaning "done"
    pub target: Vec<String>,

    /// Wait before the first refresh
    pub delay: Duration,

    /// Fixed time between refreshes; exponential backoff when `None`
    pub poll_interval: Option<Duration>,

    /// Lower bound for the time between refreshes
    pub min_timeout: Duration,

    /// Overall deadline, measured from the start of the wait
    pub timeout: Duration,

    /// Absolute deadline shared with earlier waits, overriding `timeout`
    pub deadline: Option<Instant>,

    /// Consecutive "no value" observations tolerated before failing
    pub not_found_checks: usize,

    /// Consecutive target observations required before succeeding
    pub continuous_target_occurrence: usize,
}

impl StateChangeConf {
    /// Wait for any of `target` within `timeout`
    pub fn new(target: &[&str], timeout: Duration) -> Self {
        Self {
            pending: Vec::new(),
            target: labels(target),
            delay: Duration::ZERO,
            poll_interval: None,
            min_timeout: Duration::ZERO,
            timeout,
            deadline: None,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
        }
    }

    /// Set the pending labels
    pub fn with_pending(mut self, pending: &[&str]) -> Self {
        self.pending = labels(pending);
        self
    }

    /// Set the initial delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Poll at a fixed interval instead of backing off
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// End the wait at `deadline` instead of `timeout` after its start
    ///
    /// Lets several waits in a row share one overall deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the minimum time between refreshes
    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Set how many "no value" observations are tolerated
    pub fn with_not_found_checks(mut self, checks: usize) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Require the target state to be observed this many times in a row
    pub fn with_continuous_target_occurrence(mut self, occurrences: usize) -> Self {
        self.continuous_target_occurrence = occurrences;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.target.is_empty() {
            return Err(Error::config("State change target cannot be empty"));
        }
        if let Some(label) = self.pending.iter().find(|p| self.target.contains(*p)) {
            return Err(Error::config(format!(
                "State {label:?} cannot be both pending and target"
            )));
        }
        if self.timeout <= self.delay {
            return Err(Error::config(format!(
                "Timeout ({:?}) must be greater than the initial delay ({:?})",
                self.timeout, self.delay
            )));
        }
        if self.continuous_target_occurrence == 0 {
            return Err(Error::config("Continuous target occurrence must be > 0"));
        }
        Ok(())
    }

    /// Poll `refresher` until a target state, a fatal error or the deadline
    ///
    /// # Returns
    ///
    /// - `Ok(Settled)`: a target label was observed, or the resource vanished
    ///   while [`DELETED`] is a target
    /// - `Err(Error::Timeout)`: the deadline passed first
    /// - `Err(Error::UnexpectedState)`: a label outside pending and target
    /// - `Err(_)`: any error returned by the refresher, unretried
    pub async fn wait_for_state<R>(&self, refresher: &mut R) -> Result<Settled<R::Value>>
    where
        R: StateRefresh,
    {
        self.validate()?;

        let deadline = self
            .deadline
            .unwrap_or_else(|| deadline_after(self.timeout));
        debug!(
            pending = ?self.pending,
            target = ?self.target,
            timeout = ?self.timeout,
            "Waiting for state to become target"
        );

        if !self.delay.is_zero() {
            sleep(self.delay).await;
            if Instant::now() >= deadline {
                return Err(self.timeout_error(String::new()));
            }
        }

        let mut last_state = String::new();
        let mut backoff = INITIAL_BACKOFF;
        let mut refreshes = 0;
        let mut target_hits = 0;
        let mut not_found_ticks = 0;

        loop {
            let observed = match timeout_at(deadline, refresher.refresh()).await {
                Ok(observed) => observed,
                Err(_) => return Err(self.timeout_error(last_state)),
            };
            refreshes += 1;

            let PollOutcome { value, state } = match observed {
                Ok(outcome) => outcome,
                Err(e) if e.is_not_found() && self.expects_deletion() => {
                    info!(refreshes, "Resource is gone, treating as deleted");
                    return Ok(Settled {
                        value: None,
                        state: DELETED.to_string(),
                        refreshes,
                    });
                }
                Err(e) => {
                    warn!(refreshes, error = %e, "Refresh failed, giving up");
                    return Err(e);
                }
            };

            debug!(state = %state, refreshes, "Refreshed remote state");

            if self.target.contains(&state) {
                target_hits += 1;
                if target_hits >= self.continuous_target_occurrence {
                    info!(state = %state, refreshes, "Reached target state");
                    return Ok(Settled {
                        value,
                        state,
                        refreshes,
                    });
                }
            } else {
                target_hits = 0;
                if value.is_none() {
                    not_found_ticks += 1;
                    if not_found_ticks > self.not_found_checks {
                        warn!(state = %state, not_found_ticks, "Resource never appeared");
                        return Err(Error::not_found(format!(
                            "resource not visible after {not_found_ticks} checks (last state {state:?})"
                        )));
                    }
                } else if !self.pending.contains(&state) {
                    warn!(state = %state, "Unexpected state, giving up");
                    return Err(Error::UnexpectedState {
                        state,
                        expected: self.expected_labels(),
                    });
                }
            }

            last_state = state;

            let wait = self.next_wait(&mut backoff, target_hits > 0);
            let now = Instant::now();
            if now >= deadline {
                return Err(self.timeout_error(last_state));
            }
            sleep(wait.min(deadline - now)).await;
            if Instant::now() >= deadline {
                return Err(self.timeout_error(last_state));
            }
        }
    }

    /// Time to sleep before the next refresh
    ///
    /// While waiting for a repeated target observation the backoff does not grow.
    fn next_wait(&self, backoff: &mut Duration, awaiting_repeat: bool) -> Duration {
        if !awaiting_repeat {
            *backoff = (*backoff * 2).min(MAX_BACKOFF);
        }
        match self.poll_interval {
            Some(interval) if !interval.is_zero() => interval.max(self.min_timeout),
            _ => (*backoff).max(self.min_timeout),
        }
    }

    fn expects_deletion(&self) -> bool {
        self.target.iter().any(|t| t == DELETED)
    }

    fn expected_labels(&self) -> Vec<String> {
        self.pending.iter().chain(&self.target).cloned().collect()
    }

    fn timeout_error(&self, last_state: String) -> Error {
        warn!(last_state = %last_state, timeout = ?self.timeout, "Timed out waiting for target state");
        Error::Timeout {
            last_state,
            target: self.target.clone(),
            timeout: self.timeout,
        }
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
