mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use actors::{DelayedDraw, EngineArgs};
use relay_core::{ProcessingStatus, WorkEvent, reasons};
use tokio::sync::broadcast;

use common::{FAST, RejectMinors, engine_running, engine_with, engine_with_delay, input, settle};

#[tokio::test]
async fn test_submit_runs_to_done() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(FAST).await?;

    let submitter = engine.clone();
    let pending = tokio::spawn(async move { submitter.submit(input("a1")).await });
    settle().await;

    let running = engine.get_state("a1").await?;
    assert_eq!(running.status, ProcessingStatus::Processing);
    assert!(running.result.is_none());

    let result = pending.await??;
    assert_eq!(result.id, "a1");
    assert!(!result.is_error());
    let value = result.value.ok_or("missing value")?;
    assert!((0..=DelayedDraw::MAX_VALUE).contains(&value));

    let done = engine.get_state("a1").await?;
    assert_eq!(done.status, ProcessingStatus::Done);
    assert_eq!(done.result, Some(result));

    let stats = engine.stats().await?;
    assert_eq!(stats.tracked, 1);
    assert_eq!(stats.done, 1);
    assert_eq!(stats.awaiting, 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_id_is_not_tracked() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(FAST).await?;

    let state = engine.get_state("ghost").await?;
    assert_eq!(state.id, "ghost");
    assert_eq!(state.status, ProcessingStatus::Error);
    assert_eq!(state.reason.as_deref(), Some(reasons::NOT_FOUND));

    assert_eq!(engine.stats().await?.tracked, 0);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_while_processing_fails_the_item() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(FAST).await?;

    let submitter = engine.clone();
    let first_submit = tokio::spawn(async move { submitter.submit(input("dup")).await });
    settle().await;

    let duplicate = engine.submit(input("dup")).await?;
    assert_eq!(duplicate.error.as_deref(), Some(reasons::DUPLICATE_ID));

    let state = engine.get_state("dup").await?;
    assert_eq!(state.status, ProcessingStatus::Error);
    assert_eq!(state.reason.as_deref(), Some(reasons::DUPLICATE_ID));

    // The first caller is answered with the recorded terminal result.
    let first = first_submit.await??;
    assert_eq!(first.error.as_deref(), Some(reasons::DUPLICATE_ID));

    let state = engine.get_state("dup").await?;
    assert_eq!(state.status, ProcessingStatus::Error);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_after_done_keeps_state() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(Duration::from_millis(10)).await?;

    let first = engine.submit(input("once")).await?;
    assert!(!first.is_error());

    let second = engine.submit(input("once")).await?;
    assert_eq!(second.error.as_deref(), Some(reasons::DUPLICATE_ID));

    let state = engine.get_state("once").await?;
    assert_eq!(state.status, ProcessingStatus::Done);
    assert_eq!(state.result, Some(first));
    Ok(())
}

#[tokio::test]
async fn test_clear_removes_only_finished_items() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(FAST).await?;

    let finished = engine.clone();
    tokio::spawn(async move { finished.submit(input("early")).await });
    tokio::time::sleep(FAST + Duration::from_millis(50)).await;

    let running = engine.clone();
    let late = tokio::spawn(async move { running.submit(input("late")).await });
    settle().await;

    engine.clear()?;
    settle().await;

    let early = engine.get_state("early").await?;
    assert_eq!(early.reason.as_deref(), Some(reasons::NOT_FOUND));
    let still_running = engine.get_state("late").await?;
    assert_eq!(still_running.status, ProcessingStatus::Processing);

    let result = late.await??;
    assert!(!result.is_error());
    assert_eq!(engine.stats().await?.tracked, 1);
    Ok(())
}

#[tokio::test]
async fn test_terminate_releases_waiters_and_discards_results() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(FAST).await?;

    let submitter = engine.clone();
    let pending = tokio::spawn(async move { submitter.submit(input("t1")).await });
    settle().await;

    engine.terminate()?;

    let result = pending.await??;
    assert_eq!(result.error.as_deref(), Some(reasons::TERMINATED));

    let state = engine.get_state("t1").await?;
    assert_eq!(state.reason.as_deref(), Some(reasons::NOT_FOUND));

    // The abandoned computation completes without resurrecting the item.
    tokio::time::sleep(FAST + Duration::from_millis(50)).await;
    let stats = engine.stats().await?;
    assert_eq!(stats.tracked, 0);
    assert_eq!(stats.awaiting, 0);
    Ok(())
}

#[tokio::test]
async fn test_resubmit_after_terminate_ignores_stale_run() -> Result<(), Box<dyn Error>> {
    let engine = engine_with_delay(FAST).await?;

    let submitter = engine.clone();
    let stale = tokio::spawn(async move { submitter.submit(input("again")).await });
    settle().await;
    engine.terminate()?;
    assert_eq!(stale.await??.error.as_deref(), Some(reasons::TERMINATED));
    tokio::time::sleep(Duration::from_millis(70)).await;

    let submitter = engine.clone();
    let fresh = tokio::spawn(async move { submitter.submit(input("again")).await });

    // The first run finishes here; the new item must stay in Processing.
    tokio::time::sleep(Duration::from_millis(70)).await;
    let state = engine.get_state("again").await?;
    assert_eq!(state.status, ProcessingStatus::Processing);

    assert!(!fresh.await??.is_error());
    Ok(())
}

#[tokio::test]
async fn test_deadline_overrun_fails_the_item() -> Result<(), Box<dyn Error>> {
    let args = EngineArgs::new(Arc::new(DelayedDraw::new(Duration::from_secs(5))))
        .with_max_duration(Duration::from_millis(50));
    let engine = engine_with(args).await?;

    let result = engine.submit(input("slow")).await?;
    assert_eq!(result.error.as_deref(), Some(reasons::DEADLINE_EXCEEDED));

    let state = engine.get_state("slow").await?;
    assert_eq!(state.status, ProcessingStatus::Error);
    Ok(())
}

#[tokio::test]
async fn test_failing_computation_reports_error() -> Result<(), Box<dyn Error>> {
    let engine = engine_running(RejectMinors).await?;

    let mut minor = input("m1");
    minor.age = 12;
    let rejected = engine.submit(minor).await?;
    assert_eq!(rejected.error.as_deref(), Some("Ada is too young"));

    let accepted = engine.submit(input("m2")).await?;
    assert_eq!(accepted.value, Some(36));
    Ok(())
}

#[tokio::test]
async fn test_lifecycle_events_are_broadcast() -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = broadcast::channel(16);
    let args = EngineArgs::new(Arc::new(DelayedDraw::new(Duration::from_millis(10))))
        .with_event_tx(tx);
    let engine = engine_with(args).await?;

    engine.submit(input("e1")).await?;
    engine.clear()?;
    settle().await;

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.id(), "e1");
        seen.push(event);
    }
    assert!(matches!(seen[0], WorkEvent::Created { .. }));
    assert!(matches!(seen[1], WorkEvent::Started { .. }));
    assert!(matches!(seen[2], WorkEvent::Completed { .. }));
    assert!(matches!(
        seen[3],
        WorkEvent::Evicted {
            status: ProcessingStatus::Done,
            ..
        }
    ));
    assert_eq!(seen.len(), 4);
    Ok(())
}
