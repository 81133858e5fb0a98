use super::{throwing_operation, TestOperation};
use crate::mock::deferred;
use crate::{AsyncStatus, InitialState, OperationConfig, RunConfig, RunError, Settled};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_initial_state_is_idle() {
    let operation = TestOperation::default();
    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Idle);
    assert_eq!(state.data, None);
    assert_eq!(state.error, None);
    assert!(!operation.is_retired());
    assert!(!operation.config().throw_on_error);
}

#[tokio::test]
async fn test_initial_state_seeds_data() {
    let operation = TestOperation::new(InitialState::new().data(9), OperationConfig::default());
    assert_eq!(operation.status(), AsyncStatus::Idle);
    assert_eq!(operation.state().data, Some(9));
}

#[tokio::test]
async fn test_run_switches_to_loading_immediately() {
    let operation = TestOperation::default();
    operation.set_data(1);

    let (resolver, future) = deferred::<u32, String>();
    let running = operation.run(future);

    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Loading);
    // previous terminal values stay visible while loading
    assert_eq!(state.data, Some(1));

    resolver.resolve(2);
    running.await.unwrap();
}

#[tokio::test]
async fn test_run_success() {
    let operation = TestOperation::default();
    let (resolver, future) = deferred::<u32, String>();
    let running = operation.run(future);

    resolver.resolve(5);
    assert_eq!(running.await, Ok(Settled::Resolved(5)));

    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Success);
    assert_eq!(state.data, Some(5));
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_run_error_is_absorbed() {
    let operation = TestOperation::default();
    operation.set_data(3);
    let (resolver, future) = deferred::<u32, String>();
    let running = operation.run(future);

    resolver.reject("boom".to_string());
    assert_eq!(running.await, Ok(Settled::Absorbed("boom".to_string())));

    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Error);
    assert_eq!(state.data, None);
    assert_eq!(state.error, Some("boom".to_string()));
}

#[tokio::test]
async fn test_run_plain_value() {
    let operation = TestOperation::default();
    let outcome = operation.run(async { 4u32 }).await;
    assert_eq!(outcome, Ok(Settled::Resolved(4)));
    assert_eq!(operation.state().data, Some(4));
}

#[tokio::test]
async fn test_last_run_wins() {
    let operation = TestOperation::default();
    let (first_resolver, first) = deferred::<u32, String>();
    let (second_resolver, second) = deferred::<u32, String>();

    let first_run = operation.run(first);
    let second_run = operation.run(second);

    second_resolver.resolve(2);
    assert_eq!(second_run.await, Ok(Settled::Resolved(2)));
    assert_eq!(operation.state().data, Some(2));

    // the stale run still reports its own value to its caller
    first_resolver.resolve(1);
    assert_eq!(first_run.await, Ok(Settled::Resolved(1)));

    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Success);
    assert_eq!(state.data, Some(2));
}

#[tokio::test]
async fn test_stale_rejection_is_ignored() {
    let operation = TestOperation::default();
    let (first_resolver, first) = deferred::<u32, String>();
    let (second_resolver, second) = deferred::<u32, String>();

    let first_run = operation.run(first);
    let second_run = operation.run(second);

    first_resolver.reject("late".to_string());
    first_run.await.unwrap();
    assert_eq!(operation.status(), AsyncStatus::Loading);

    second_resolver.resolve(8);
    second_run.await.unwrap();
    assert_eq!(operation.state().data, Some(8));
    assert_eq!(operation.state().error, None);
}

#[tokio::test]
async fn test_set_data_supersedes_pending_run() {
    let operation = TestOperation::default();
    let (resolver, future) = deferred::<u32, String>();
    let running = operation.run(future);

    operation.set_data(3);
    resolver.resolve(9);
    running.await.unwrap();

    assert_eq!(operation.state().data, Some(3));
}

#[tokio::test]
async fn test_retire_suppresses_settlement() {
    let operation = TestOperation::default();
    operation.set_data(1);
    let (resolver, future) = deferred::<u32, String>();
    let running = operation.run(future);

    operation.retire();
    let retired_state = operation.state();
    assert!(operation.is_retired());

    resolver.resolve(2);
    assert_eq!(running.await, Ok(Settled::Resolved(2)));
    assert_eq!(operation.state(), retired_state);
    assert_eq!(operation.status(), AsyncStatus::Loading);
}

#[tokio::test]
async fn test_retired_operation_ignores_everything() {
    let operation = TestOperation::default();
    operation.retire();
    operation.retire();

    operation.set_data(1);
    operation.set_error("nope".to_string());
    let outcome = operation.run(async { Ok::<u32, String>(2) }).await;

    assert_eq!(outcome, Ok(Settled::Resolved(2)));
    assert_eq!(operation.status(), AsyncStatus::Idle);
    assert_eq!(operation.state().data, None);
    operation.retired().await;
}

#[tokio::test]
async fn test_throw_on_error() {
    let operation = throwing_operation();
    let (resolver, future) = deferred::<u32, String>();
    let running = operation.run(future);

    resolver.reject("E".to_string());
    assert_eq!(running.await, Err(RunError::Rejected("E".to_string())));

    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Error);
    assert_eq!(state.error, Some("E".to_string()));
}

#[tokio::test]
async fn test_throw_on_error_success_unaffected() {
    let operation = throwing_operation();
    let outcome = operation.run(async { Ok::<u32, String>(6) }).await;
    assert_eq!(outcome, Ok(Settled::Resolved(6)));
    assert!(operation.state().is_success());
}

#[tokio::test]
async fn test_retry_replays_operation() {
    let operation = TestOperation::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let retry_attempts = attempts.clone();
    let config = RunConfig::new().retry(move || {
        let attempts = retry_attempts.clone();
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, String>(10)
        }
    });
    let outcome = operation
        .run_with(async { Err::<u32, String>("offline".to_string()) }, config)
        .await;
    assert_eq!(outcome, Ok(Settled::Absorbed("offline".to_string())));
    assert!(operation.state().is_error());
    assert!(operation.can_retry());

    let running = operation.retry().expect("retry callback captured");
    assert_eq!(operation.status(), AsyncStatus::Loading);
    assert_eq!(running.await, Ok(Settled::Resolved(10)));

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(operation.state().data, Some(10));
    assert!(operation.can_retry());

    operation.retry().expect("still captured").await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_on_retired_operation_runs_without_touching_state() {
    let operation = TestOperation::default();
    let attempts = Arc::new(AtomicU32::new(0));
    let retry_attempts = attempts.clone();
    let config = RunConfig::new().retry(move || {
        let attempts = retry_attempts.clone();
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, String>(5)
        }
    });
    operation
        .run_with(async { Err::<u32, String>("offline".to_string()) }, config)
        .await
        .unwrap();

    operation.retire();
    let retired_state = operation.state();
    let outcome = operation.retry().expect("retry callback captured").await;

    assert_eq!(outcome, Ok(Settled::Resolved(5)));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(operation.state(), retired_state);
}

#[tokio::test]
async fn test_retry_without_callback_is_noop() {
    let operation = TestOperation::default();
    operation.set_error("x".to_string());
    assert!(operation.retry().is_none());
    assert_eq!(operation.state().error, Some("x".to_string()));

    operation.run(async { 1u32 }).await.unwrap();
    assert!(operation.retry().is_none());
}

#[tokio::test]
async fn test_run_without_retry_keeps_captured_callback() {
    let operation = TestOperation::default();
    let config = RunConfig::new().retry(|| async { Ok::<u32, String>(7) });
    assert!(config.has_retry());
    operation.run_with(async { 1u32 }, config).await.unwrap();
    operation.run(async { 2u32 }).await.unwrap();

    let outcome = operation.retry().expect("retry captured").await;
    assert_eq!(outcome, Ok(Settled::Resolved(7)));
}

#[tokio::test]
async fn test_set_data_forgets_retry() {
    let operation = TestOperation::default();
    let config = RunConfig::new().retry(|| async { Ok::<u32, String>(7) });
    operation
        .run_with(async { Err::<u32, String>("x".to_string()) }, config)
        .await
        .unwrap();

    operation.set_data(1);
    assert!(!operation.can_retry());
    assert!(operation.retry().is_none());
}

#[tokio::test]
async fn test_set_data_and_set_error_are_synchronous() {
    let operation = TestOperation::default();

    operation.set_data(4);
    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Success);
    assert_eq!(state.data, Some(4));
    assert_eq!(state.error, None);

    operation.set_error("bad".to_string());
    let state = operation.state();
    assert_eq!(state.status, AsyncStatus::Error);
    assert_eq!(state.data, None);
    assert_eq!(state.error, Some("bad".to_string()));
}

#[tokio::test]
async fn test_clones_share_state() {
    let operation = TestOperation::default();
    let clone = operation.clone();
    clone.set_data(12);
    assert_eq!(operation.state().data, Some(12));
    operation.retire();
    assert!(clone.is_retired());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_run_wins_across_threads() {
    let operation = TestOperation::default();
    let mut runs = Vec::new();
    for i in 0..20u32 {
        runs.push(operation.run(async move {
            tokio::time::sleep(Duration::from_millis(u64::from(20 - i))).await;
            Ok::<u32, String>(i)
        }));
    }
    for running in runs {
        running.await.unwrap();
    }
    assert_eq!(operation.state().data, Some(19));
}

#[tokio::test]
#[should_panic(expected = "tracked future blew up")]
async fn test_panic_is_resumed_in_caller() {
    let operation = TestOperation::default();
    let running = operation.run(async {
        if true {
            panic!("tracked future blew up");
        }
        0u32
    });
    let _ = running.await;
}
