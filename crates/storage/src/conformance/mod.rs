//! Conformance test suite for `ProcessStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `ProcessStore` implementation can run to verify correctness. The suite
//! covers:
//!
//! - **Paging**: argument validation and page slicing
//! - **Terminate**: state, activity clearing and notification enqueue
//!   applied together; argument validation
//! - **Search**: actor, originator/beneficiary and document-type scoping
//! - **Concurrency**: racing terminates of one process queue one notification
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that builds
//! a fresh storage instance holding the given seed processes:
//!
//! ```ignore
//! use approvals_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn sql_conformance() {
//!     let report = run_conformance_suite(|seed| async move {
//!         create_test_sql_storage(seed).await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod concurrent;
mod paging;
mod search;
mod terminate;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use approvals_model::{Activity, ActivityState, Actor, Process, ProcessState};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::{NotificationLog, ProcessStore};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "paging", "terminate", "search").
    pub category: String,
    /// Test name (e.g. "terminate_clears_pending_activities").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` is called once per test with the processes the test needs,
/// and must return a fresh storage instance holding exactly those.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(paging::run_paging_tests(&factory).await);
    results.extend(terminate::run_terminate_tests(&factory).await);
    results.extend(search::run_search_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: seed processes ──────────────────────────────────────────────────

const TRAVEL: &str = "Travel Request";
const PURCHASE: &str = "Purchase Request";

/// Actor on the second activity of every seeded process.
const REVIEWER: &str = "2000002";

const CREATED: OffsetDateTime = datetime!(2025-01-01 08:00 UTC);

fn make_actor(actor_id: i64, activity_id: i64, hanford_id: &str) -> Actor {
    Actor {
        actor_id,
        activity_id,
        actor_criteria_id: 0,
        actor_hanford_id: hanford_id.to_string(),
        actor_type: "PRIMARY".to_string(),
        delegator_hanford_id: None,
    }
}

fn make_activity(process_id: i64, n: i64, state: ActivityState, actor: &str) -> Activity {
    let activity_id = process_id * 10 + n;
    let actor_id = activity_id * 10 + 1;
    Activity {
        activity_id,
        process_id,
        activity_name: format!("Step {n}"),
        pending_date_time: state.is_pending().then_some(CREATED),
        last_change_date_time: None,
        activity_state: state,
        activity_status: (state == ActivityState::Complete).then(|| "ACCEPTED".to_string()),
        comment: None,
        acted_user_id: None,
        acted_hanford_id: None,
        acted_actor_id: None,
        is_ghost: false,
        is_adhoc: false,
        actors: BTreeMap::from([(actor_id, make_actor(actor_id, activity_id, actor))]),
    }
}

/// A three-step process whose activity states follow the process state.
///
/// Created `process_id` days after [`CREATED`].
fn make_process(
    process_id: i64,
    state: ProcessState,
    document_type: &str,
    originator: &str,
    beneficiary: &str,
) -> Process {
    let steps = match state {
        ProcessState::Pending => [
            ActivityState::Complete,
            ActivityState::Pending,
            ActivityState::NotYetPending,
        ],
        ProcessState::Approved => [ActivityState::Complete; 3],
        ProcessState::Terminated | ProcessState::NotYetPending => [ActivityState::NotYetPending; 3],
    };
    let actors = ["2000001", REVIEWER, "2000003"];
    let activities = steps
        .iter()
        .zip(actors)
        .enumerate()
        .map(|(i, (state, actor))| {
            let activity = make_activity(process_id, i as i64 + 1, *state, actor);
            (activity.activity_id, activity)
        })
        .collect();
    let created = CREATED + Duration::days(process_id);
    Process {
        process_id,
        process_definition_id: if document_type == TRAVEL { 12 } else { 13 },
        document_type_name: document_type.to_string(),
        document_id: format!("DOC-{process_id}"),
        document_title: format!("Document {process_id}"),
        originator_hanford_id: originator.to_string(),
        beneficiary_hanford_id: beneficiary.to_string(),
        process_state: state,
        process_status: None,
        create_date_time: created,
        last_change_date_time: created,
        last_change_hanford_id: None,
        activities,
    }
}

/// Four processes covering every process state and two document types.
fn seed() -> Vec<Process> {
    vec![
        make_process(1, ProcessState::Pending, TRAVEL, "1000001", "1000002"),
        make_process(2, ProcessState::Approved, TRAVEL, "1000003", "1000001"),
        make_process(3, ProcessState::Terminated, PURCHASE, "1000001", "1000004"),
        make_process(4, ProcessState::NotYetPending, PURCHASE, "1000005", "1000005"),
    ]
}

fn ids(processes: &[Process]) -> Vec<i64> {
    processes.iter().map(|p| p.process_id).collect()
}
