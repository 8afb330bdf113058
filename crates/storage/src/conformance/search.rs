use std::future::Future;

use approvals_model::{ActivityState, DateRange, Page, Process, ProcessFilter, ProcessState};
use time::Duration;

use super::{ids, seed, TestResult, CREATED, PURCHASE, REVIEWER};
use crate::{NotificationLog, ProcessStore, StorageError};

pub(super) async fn run_search_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "search",
        "search_by_actor_joins_on_entitlement",
        search_by_actor_joins_on_entitlement(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_by_actor_without_actor_is_invalid_argument",
        search_by_actor_without_actor_is_invalid_argument(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_by_originator_scopes_by_originator",
        search_by_originator_scopes_by_originator(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_by_originator_honours_beneficiary_ids",
        search_by_originator_honours_beneficiary_ids(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_by_user_requires_document_scope",
        search_by_user_requires_document_scope(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_by_user_empty_scope_matches_nothing",
        search_by_user_empty_scope_matches_nothing(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_by_user_limits_document_types",
        search_by_user_limits_document_types(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_respects_process_states",
        search_respects_process_states(factory).await,
    ));
    results.push(TestResult::from_result(
        "search",
        "search_respects_create_date_range",
        search_respects_create_date_range(factory).await,
    ));

    results
}

const PAGE: Page = Page {
    offset: 0,
    limit: 50,
};

fn expect_ids(found: Vec<i64>, expected: &[i64]) -> Result<(), String> {
    if found != expected {
        return Err(format!("expected {expected:?}, got {found:?}"));
    }
    Ok(())
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Only processes with an activity in the requested states carrying the
/// actor are returned.
async fn search_by_actor_joins_on_entitlement<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let pending = ProcessFilter {
        actor_ids: vec![REVIEWER.to_string()],
        activity_states: vec![ActivityState::Pending, ActivityState::Escalated],
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_actor(&pending, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[1])?;

    let complete = ProcessFilter {
        activity_states: vec![ActivityState::Complete],
        ..pending
    };
    let found = s
        .search_by_actor(&complete, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[2])
}

async fn search_by_actor_without_actor_is_invalid_argument<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    match s.search_by_actor(&ProcessFilter::default(), PAGE).await {
        Err(StorageError::InvalidArgument(_)) => Ok(()),
        other => Err(format!("expected InvalidArgument, got {other:?}")),
    }
}

async fn search_by_originator_scopes_by_originator<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let filter = ProcessFilter {
        originator_ids: vec!["1000001".to_string()],
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_originator(&filter, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[1, 3])
}

/// The beneficiary strategy reuses the originator call with beneficiary ids.
async fn search_by_originator_honours_beneficiary_ids<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let filter = ProcessFilter {
        beneficiary_ids: vec!["1000001".to_string()],
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_originator(&filter, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[2])
}

async fn search_by_user_requires_document_scope<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    match s.search_by_user(&ProcessFilter::default(), PAGE).await {
        Err(StorageError::InvalidArgument(_)) => Ok(()),
        other => Err(format!("expected InvalidArgument, got {other:?}")),
    }
}

/// A caller who may read no document type sees nothing.
async fn search_by_user_empty_scope_matches_nothing<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let filter = ProcessFilter {
        document_types: Some(Vec::new()),
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_user(&filter, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    if found.total != 0 {
        return Err(format!("expected no results, got {}", found.total));
    }
    Ok(())
}

async fn search_by_user_limits_document_types<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let filter = ProcessFilter {
        document_types: Some(vec![PURCHASE.to_string()]),
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_user(&filter, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[3, 4])
}

async fn search_respects_process_states<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let filter = ProcessFilter {
        originator_ids: vec!["1000001".to_string()],
        process_states: vec![ProcessState::Pending],
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_originator(&filter, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[1])
}

/// Process `n` is created `n` days after the seed epoch.
async fn search_respects_create_date_range<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let range = DateRange::new(CREATED + Duration::days(2), CREATED + Duration::days(3))
        .map_err(|e| e.to_string())?;
    let filter = ProcessFilter {
        document_types: Some(vec!["Travel Request".to_string(), PURCHASE.to_string()]),
        create_date: Some(range),
        ..ProcessFilter::default()
    };
    let found = s
        .search_by_user(&filter, PAGE)
        .await
        .map_err(|e| e.to_string())?;
    expect_ids(ids(&found.items), &[2, 3])
}
