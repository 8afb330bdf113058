use std::future::Future;
use std::sync::Arc;

use approvals_model::{Process, ProcessState};

use super::{seed, TestResult};
use crate::{NotificationLog, ProcessStore, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_terminates_notify_once",
        concurrent_terminates_notify_once(factory).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_terminates_of_different_processes_all_succeed",
        concurrent_terminates_of_different_processes_all_succeed(factory).await,
    ));

    results
}

// ── Racing terminates of one process ─────────────────────────────────────────

/// N tasks terminate the same process with notifications. Exactly one wins;
/// the rest see the process already closed, and one notification is queued.
async fn concurrent_terminates_notify_once<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory(seed()).await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let user = format!("user-{i}");
            s.terminate(1, &user, &format!("TERMINATED by: {user}"), true)
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.map_err(|e| format!("task panic: {e}"))? {
            Ok(process) if process.process_state == ProcessState::Terminated => winners += 1,
            Ok(process) => {
                return Err(format!(
                    "terminate returned state {}",
                    process.process_state
                ))
            }
            Err(StorageError::ProcessClosed {
                state: ProcessState::Terminated,
                ..
            }) => {}
            Err(e) => return Err(format!("storage error: {e}")),
        }
    }
    if winners != 1 {
        return Err(format!("expected exactly 1 winning terminate, got {winners}"));
    }

    let queued = storage
        .notifications_for(1)
        .await
        .map_err(|e| e.to_string())?;
    if queued.len() != 1 {
        return Err(format!(
            "expected exactly 1 notification, got {}",
            queued.len()
        ));
    }
    Ok(())
}

// ── Terminates of different processes ───────────────────────────────────────

/// Terminating different processes concurrently never interferes.
async fn concurrent_terminates_of_different_processes_all_succeed<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory(seed()).await);

    let mut handles = Vec::new();
    for process_id in [1, 4] {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.terminate(process_id, "d3m001", "TERMINATED by: d3m001", true)
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
    }

    for process_id in [1, 4] {
        let queued = storage
            .notifications_for(process_id)
            .await
            .map_err(|e| e.to_string())?;
        if queued.len() != 1 {
            return Err(format!(
                "process {process_id}: expected 1 notification, got {}",
                queued.len()
            ));
        }
    }
    Ok(())
}
