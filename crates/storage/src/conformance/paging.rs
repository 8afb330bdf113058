use std::future::Future;

use approvals_model::{Page, Process, ProcessFilter};

use super::{ids, seed, TestResult};
use crate::{NotificationLog, ProcessStore, StorageError};

pub(super) async fn run_paging_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "paging",
        "get_by_ids_limit_over_max_is_invalid_argument",
        get_by_ids_limit_over_max_is_invalid_argument(factory).await,
    ));
    results.push(TestResult::from_result(
        "paging",
        "get_by_ids_zero_limit_is_invalid_argument",
        get_by_ids_zero_limit_is_invalid_argument(factory).await,
    ));
    results.push(TestResult::from_result(
        "paging",
        "get_by_ids_without_ids_is_invalid_argument",
        get_by_ids_without_ids_is_invalid_argument(factory).await,
    ));
    results.push(TestResult::from_result(
        "paging",
        "get_by_ids_slices_page_and_counts_total",
        get_by_ids_slices_page_and_counts_total(factory).await,
    ));
    results.push(TestResult::from_result(
        "paging",
        "get_by_ids_skips_unknown_ids",
        get_by_ids_skips_unknown_ids(factory).await,
    ));
    results.push(TestResult::from_result(
        "paging",
        "search_limit_over_max_is_invalid_argument",
        search_limit_over_max_is_invalid_argument(factory).await,
    ));

    results
}

fn expect_invalid_argument<T: std::fmt::Debug>(
    result: Result<T, StorageError>,
) -> Result<(), String> {
    match result {
        Err(StorageError::InvalidArgument(_)) => Ok(()),
        other => Err(format!("expected InvalidArgument, got {other:?}")),
    }
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A page larger than the maximum is refused.
async fn get_by_ids_limit_over_max_is_invalid_argument<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    expect_invalid_argument(s.get_by_ids(&[1], Page::new(0, 101)).await)
}

async fn get_by_ids_zero_limit_is_invalid_argument<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    expect_invalid_argument(s.get_by_ids(&[1], Page::new(0, 0)).await)
}

async fn get_by_ids_without_ids_is_invalid_argument<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    expect_invalid_argument(s.get_by_ids(&[], Page::new(0, 50)).await)
}

/// Offset/limit select a window; `total` counts every match.
async fn get_by_ids_slices_page_and_counts_total<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let page = s
        .get_by_ids(&[1, 2, 3, 4], Page::new(1, 2))
        .await
        .map_err(|e| e.to_string())?;
    if page.total != 4 {
        return Err(format!("expected total 4, got {}", page.total));
    }
    if ids(&page.items) != vec![2, 3] {
        return Err(format!("expected [2, 3], got {:?}", ids(&page.items)));
    }
    if page.offset != 1 || page.limit != 2 {
        return Err(format!(
            "expected offset 1 limit 2, got offset {} limit {}",
            page.offset, page.limit
        ));
    }
    Ok(())
}

/// Ids with no process are left out rather than failing the lookup.
async fn get_by_ids_skips_unknown_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProcessStore + NotificationLog,
    F: Fn(Vec<Process>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed()).await;
    let page = s
        .get_by_ids(&[1, 99], Page::new(0, 50))
        .await
        .map_err(|e| e.to_string())?;
    if ids(&page.items) != vec![1] || page.total != 1 {
        return Err(format!(
            "expected only process 1, got {:?} (total {})",
            ids(&page.items),
            page.total
        ));
    }
    Ok(())
}

async fn search_limit_over_max_is_invalid_argument<S, F, Fut>(factory: &F) -> Result<(), String>
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
    expect_invalid_argument(s.search_by_originator(&filter, Page::new(0, 500)).await)
}
