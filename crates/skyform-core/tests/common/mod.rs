//! Test doubles and common utilities for poller contract tests
//!
//! This module provides a scripted refresher that replays a fixed sequence
//! of observations and records how often it was called.

#![allow(dead_code)]

use skyform_core::error::{Error, Result};
use skyform_core::traits::{PollOutcome, StateRefresh};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted observation
#[derive(Debug, Clone)]
pub enum Step {
    /// Resource present in this state
    State(&'static str),
    /// No value, reported with this label
    Absent(&'static str),
    /// Refresh fails with a 404
    NotFound,
    /// Refresh fails with a remote rejection
    Remote(u16),
    /// Refresh fails with a transport error
    Transport,
    /// Refresh takes this long, then reports the state
    Slow(Duration, &'static str),
}

/// A refresher that replays steps; the last step repeats forever
pub struct ScriptedRefresher {
    steps: VecDeque<Step>,
    last: Step,
    calls: Arc<AtomicUsize>,
    started: Instant,
    call_times: Vec<Duration>,
}

impl ScriptedRefresher {
    pub fn new(steps: Vec<Step>) -> Self {
        let last = steps.last().cloned().unwrap_or(Step::NotFound);
        Self {
            steps: steps.into(),
            last,
            calls: Arc::new(AtomicUsize::new(0)),
            started: Instant::now(),
            call_times: Vec::new(),
        }
    }

    /// Get the number of times refresh() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared handle on the call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Offsets from construction at which refresh() was called
    pub fn call_times(&self) -> &[Duration] {
        &self.call_times
    }
}

#[async_trait::async_trait]
impl StateRefresh for ScriptedRefresher {
    type Value = String;

    async fn refresh(&mut self) -> Result<PollOutcome<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.push(self.started.elapsed());

        let step = self.steps.pop_front().unwrap_or_else(|| self.last.clone());
        match step {
            Step::State(state) => Ok(PollOutcome::new(format!("value-{state}"), state)),
            Step::Absent(state) => Ok(PollOutcome::absent(state)),
            Step::NotFound => Err(Error::not_found("resource-1")),
            Step::Remote(status) => Err(Error::remote(status, "rejected")),
            Step::Transport => Err(Error::transport("connection reset")),
            Step::Slow(delay, state) => {
                tokio::time::sleep(delay).await;
                Ok(PollOutcome::new(format!("value-{state}"), state))
            }
        }
    }
}

/// Poll interval used throughout the contract tests
pub const INTERVAL: Duration = Duration::from_secs(3);
