use std::future::Future;

use approvals_model::{ActivityState, Page, Process, ProcessState};

use super::{seed, TestResult};
use crate::{NotificationLog, ProcessStore, StorageError};

const STATUS: &str = "Travel Request'- DOC-1': TERMINATED by: d3m001";

pub(super) async fn run_terminate_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "terminate",
        "terminate_sets_state_and_status",
        terminate_sets_state_and_status(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_clears_pending_activities",
        terminate_clears_pending_activities(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_visible_via_get_by_ids",
        terminate_visible_via_get_by_ids(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_enqueues_notification_when_requested",
        terminate_enqueues_notification_when_requested(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_without_statusing_enqueues_nothing",
        terminate_without_statusing_enqueues_nothing(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_unknown_process_is_not_found",
        terminate_unknown_process_is_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_empty_user_changes_nothing",
        terminate_empty_user_changes_nothing(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_closed_process_is_refused",
        terminate_closed_process_is_refused(factory).await,
    ));
    results.push(TestResult::from_result(
        "terminate",
        "terminate_empty_status_is_invalid_argument",
        terminate_empty_status_is_invalid_argument(factory).await,
    ));

    results
}

async fn load<S: ProcessStore>(s: &S, process_id: i64) -> Result<Process, String> {
    s.get_by_ids(&[process_id], Page::new(0, 1))
        .await
        .map_err(|e| e.to_string())?
        .into_first()
        .ok_or_else(|| format!("process {process_id} not returned"))
}

// ── Test implementations ──────────────────────────────────────────────────────

/// The returned process is TERMINATED and carries the status text.
async fn terminate_sets_state_and_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let process = s
        .terminate(1, "d3m001", STATUS, true)
        .await
        .map_err(|e| e.to_string())?;
    if process.process_state != ProcessState::Terminated {
        return Err(format!(
            "expected TERMINATED, got {}",
            process.process_state
        ));
    }
    if process.process_status.as_deref() != Some(STATUS) {
        return Err(format!("unexpected status {:?}", process.process_status));
    }
    Ok(())
}

/// Pending activities return to NULL; completed ones keep their state.
async fn terminate_clears_pending_activities<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let process = s
        .terminate(1, "d3m001", STATUS, false)
        .await
        .map_err(|e| e.to_string())?;
    let states: Vec<_> = process
        .activities
        .values()
        .map(|a| a.activity_state)
        .collect();
    let expected = vec![
        ActivityState::Complete,
        ActivityState::NotYetPending,
        ActivityState::NotYetPending,
    ];
    if states != expected {
        return Err(format!("expected {expected:?}, got {states:?}"));
    }
    Ok(())
}

/// A later read observes the whole termination.
async fn terminate_visible_via_get_by_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    s.terminate(1, "d3m001", STATUS, true)
        .await
        .map_err(|e| e.to_string())?;
    let process = load(&s, 1).await?;
    if process.process_state != ProcessState::Terminated {
        return Err(format!(
            "expected TERMINATED on read, got {}",
            process.process_state
        ));
    }
    if process.activities.values().any(|a| a.activity_state.is_pending()) {
        return Err("pending activity survived termination".to_string());
    }
    let queued = s.notifications_for(1).await.map_err(|e| e.to_string())?;
    if queued.len() != 1 {
        return Err(format!("expected 1 notification, got {}", queued.len()));
    }
    Ok(())
}

async fn terminate_enqueues_notification_when_requested<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    s.terminate(1, "d3m001", STATUS, true)
        .await
        .map_err(|e| e.to_string())?;
    let queued = s.notifications_for(1).await.map_err(|e| e.to_string())?;
    match queued.as_slice() {
        [n] if n.acting_user_id == "d3m001" && n.status == STATUS => Ok(()),
        other => Err(format!("unexpected notifications {other:?}")),
    }
}

async fn terminate_without_statusing_enqueues_nothing<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    s.terminate(1, "d3m001", STATUS, false)
        .await
        .map_err(|e| e.to_string())?;
    let queued = s.notifications_for(1).await.map_err(|e| e.to_string())?;
    if !queued.is_empty() {
        return Err(format!("expected no notifications, got {}", queued.len()));
    }
    Ok(())
}

async fn terminate_unknown_process_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    match s.terminate(99, "d3m001", STATUS, true).await {
        Err(StorageError::ProcessNotFound { process_id: 99 }) => Ok(()),
        other => Err(format!("expected ProcessNotFound(99), got {other:?}")),
    }
}

/// Argument validation fails before any part of the termination applies.
async fn terminate_empty_user_changes_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    match s.terminate(1, "", STATUS, true).await {
        Err(StorageError::InvalidArgument(_)) => {}
        other => return Err(format!("expected InvalidArgument, got {other:?}")),
    }
    let process = load(&s, 1).await?;
    if process.process_state != ProcessState::Pending {
        return Err(format!(
            "rejected terminate changed state to {}",
            process.process_state
        ));
    }
    let queued = s.notifications_for(1).await.map_err(|e| e.to_string())?;
    if !queued.is_empty() {
        return Err("rejected terminate queued a notification".to_string());
    }
    Ok(())
}

/// Approved and terminated processes are refused with their current state
/// and keep their status.
async fn terminate_closed_process_is_refused<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    for (process_id, expected) in [(2, ProcessState::Approved), (3, ProcessState::Terminated)] {
        match s.terminate(process_id, "d3m001", STATUS, true).await {
            Err(StorageError::ProcessClosed { state, .. }) if state == expected => {}
            other => {
                return Err(format!(
                    "process {process_id}: expected ProcessClosed({expected}), got {other:?}"
                ))
            }
        }
        let process = load(&s, process_id).await?;
        if process.process_status.as_deref() == Some(STATUS) {
            return Err(format!("process {process_id}: refused terminate wrote its status"));
        }
        let queued = s
            .notifications_for(process_id)
            .await
            .map_err(|e| e.to_string())?;
        if !queued.is_empty() {
            return Err(format!("process {process_id}: refused terminate queued a notification"));
        }
    }
    Ok(())
}

async fn terminate_empty_status_is_invalid_argument<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    match s.terminate(1, "d3m001", " ", true).await {
        Err(StorageError::InvalidArgument(_)) => Ok(()),
        other => Err(format!("expected InvalidArgument, got {other:?}")),
    }
}
