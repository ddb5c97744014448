//! Contract Test: Convergence, Timeouts and Unexpected States
//!
//! Constraints verified:
//! - A target state on the first refresh succeeds without further sleeping
//! - Pending states are polled at the configured interval until target
//! - Always-pending resources time out no later than deadline + one interval
//! - Labels outside pending and target are fatal immediately
//!
//! All tests run on a paused tokio clock, so elapsed times are exact.

mod common;

use common::*;
use skyform_core::{Error, StateChangeConf};
use std::time::Duration;
use tokio::time::Instant;

fn create_conf(timeout: Duration) -> StateChangeConf {
    StateChangeConf::new(&["ACTIVE"], timeout)
        .with_pending(&["BUILD"])
        .with_poll_interval(INTERVAL)
}

#[tokio::test(start_paused = true)]
async fn immediate_target_returns_after_initial_delay_only() {
    let delay = Duration::from_secs(5);
    let conf = create_conf(Duration::from_secs(600)).with_delay(delay);
    let mut refresher = ScriptedRefresher::new(vec![Step::State("ACTIVE")]);

    let start = Instant::now();
    let settled = conf.wait_for_state(&mut refresher).await.unwrap();

    assert_eq!(settled.state, "ACTIVE");
    assert_eq!(settled.value.as_deref(), Some("value-ACTIVE"));
    assert_eq!(refresher.call_count(), 1);
    assert_eq!(start.elapsed(), delay, "no sleep past the initial delay");
}

#[tokio::test(start_paused = true)]
async fn build_build_active_completes_between_two_and_three_intervals() {
    let conf = create_conf(Duration::from_secs(600));
    let mut refresher = ScriptedRefresher::new(vec![
        Step::State("BUILD"),
        Step::State("BUILD"),
        Step::State("ACTIVE"),
    ]);

    let start = Instant::now();
    let settled = conf.wait_for_state(&mut refresher).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(settled.state, "ACTIVE");
    assert_eq!(settled.refreshes, 3);
    assert_eq!(settled.value.as_deref(), Some("value-ACTIVE"));
    assert!(elapsed >= INTERVAL * 2, "elapsed {:?} < 2T", elapsed);
    assert!(elapsed < INTERVAL * 3, "elapsed {:?} >= 3T", elapsed);
    assert_eq!(
        refresher.call_times(),
        &[Duration::ZERO, INTERVAL, INTERVAL * 2]
    );
}

#[tokio::test(start_paused = true)]
async fn always_pending_times_out_within_one_interval_of_deadline() {
    let timeout = Duration::from_secs(20);
    let conf = create_conf(timeout);
    let mut refresher = ScriptedRefresher::new(vec![Step::State("BUILD")]);

    let start = Instant::now();
    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();
    let elapsed = start.elapsed();

    match err {
        Error::Timeout {
            last_state,
            target,
            timeout: reported,
        } => {
            assert_eq!(last_state, "BUILD");
            assert_eq!(target, vec!["ACTIVE".to_string()]);
            assert_eq!(reported, timeout);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(elapsed <= timeout + INTERVAL, "elapsed {:?}", elapsed);
    // 0, 3, 6, ..., 18
    assert_eq!(refresher.call_count(), 7);
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_is_bounded_by_the_deadline() {
    let timeout = Duration::from_secs(10);
    let conf = create_conf(timeout);
    let mut refresher =
        ScriptedRefresher::new(vec![Step::Slow(Duration::from_secs(3600), "ACTIVE")]);

    let start = Instant::now();
    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), timeout);
}

#[tokio::test(start_paused = true)]
async fn unexpected_state_is_fatal_immediately() {
    let conf = create_conf(Duration::from_secs(600));
    let mut refresher = ScriptedRefresher::new(vec![
        Step::State("BUILD"),
        Step::State("ERROR"),
        Step::State("ACTIVE"),
    ]);

    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();

    match err {
        Error::UnexpectedState { state, expected } => {
            assert_eq!(state, "ERROR");
            assert_eq!(expected, vec!["BUILD".to_string(), "ACTIVE".to_string()]);
        }
        other => panic!("expected an unexpected-state error, got {other:?}"),
    }
    assert_eq!(refresher.call_count(), 2, "no refresh after the unexpected state");
}

#[tokio::test(start_paused = true)]
async fn remote_errors_are_not_retried() {
    let conf = create_conf(Duration::from_secs(600));

    let mut refresher = ScriptedRefresher::new(vec![Step::State("BUILD"), Step::Remote(500)]);
    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: 500, .. }));
    assert_eq!(refresher.call_count(), 2);

    let mut refresher = ScriptedRefresher::new(vec![Step::Transport]);
    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(refresher.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn not_found_is_fatal_outside_deletion() {
    let conf = create_conf(Duration::from_secs(600));
    let mut refresher = ScriptedRefresher::new(vec![Step::State("BUILD"), Step::NotFound]);

    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(refresher.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn invalid_configuration_is_rejected_before_polling() {
    let conf = StateChangeConf::new(&["ACTIVE"], Duration::from_secs(600))
        .with_pending(&["ACTIVE"]);
    let mut refresher = ScriptedRefresher::new(vec![Step::State("ACTIVE")]);

    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(refresher.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn continuous_target_occurrence_requires_repeated_hits() {
    let conf = create_conf(Duration::from_secs(600)).with_continuous_target_occurrence(2);
    let mut refresher = ScriptedRefresher::new(vec![
        Step::State("ACTIVE"),
        Step::State("BUILD"),
        Step::State("ACTIVE"),
        Step::State("ACTIVE"),
    ]);

    let settled = conf.wait_for_state(&mut refresher).await.unwrap();

    assert_eq!(settled.state, "ACTIVE");
    assert_eq!(settled.refreshes, 4);
}

#[tokio::test(start_paused = true)]
async fn absent_values_exhaust_not_found_checks() {
    let conf = create_conf(Duration::from_secs(600)).with_not_found_checks(2);
    let mut refresher = ScriptedRefresher::new(vec![Step::Absent("BUILD")]);

    let err = conf.wait_for_state(&mut refresher).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(refresher.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn closures_can_drive_the_poller() {
    let conf = create_conf(Duration::from_secs(600));
    let mut polls = 0;
    let mut refresher = skyform_core::refresh_fn(move || {
        polls += 1;
        let state = if polls < 3 { "BUILD" } else { "ACTIVE" };
        async move { Ok::<_, Error>(skyform_core::PollOutcome::new(polls, state)) }
    });

    let settled = conf.wait_for_state(&mut refresher).await.unwrap();

    assert_eq!(settled.value, Some(3));
}
