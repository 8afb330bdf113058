mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use approvals_model::{ActivityState, ProcessState};
use approvals_policy::{
    ApprovalsError, SecurityPolicy, TtlCache, ACTIVITY_MANAGER_ACCOUNT,
    ACTIVITY_MANAGER_DOCUMENT_TYPES, ACTIVITY_MANAGER_TEST_ACCOUNT,
};
use common::{activity, count, process_in, FakeBackend, DEFINITION_ID};

fn policy(backend: Arc<FakeBackend>, ttl: Duration) -> SecurityPolicy {
    SecurityPolicy::new(backend, Arc::new(TtlCache::new(ttl)))
}

fn with_change_accounts() -> Arc<FakeBackend> {
    Arc::new(FakeBackend {
        change_accounts: BTreeMap::from([(DEFINITION_ID, vec!["svc-router".to_string()])]),
        ..FakeBackend::default()
    })
}

#[tokio::test]
async fn change_accounts_are_fetched_once_per_definition() {
    let backend = with_change_accounts();
    let security = policy(backend.clone(), Duration::from_secs(60));

    assert!(security
        .is_authorized_change_account(DEFINITION_ID, "svc-router")
        .await
        .unwrap());
    assert!(!security
        .is_authorized_change_account(DEFINITION_ID, "d3m001")
        .await
        .unwrap());
    assert!(!security
        .is_authorized_change_account(99, "svc-router")
        .await
        .unwrap());

    assert_eq!(count(&backend.calls.change_accounts), 2);
}

#[tokio::test]
async fn change_account_match_is_case_sensitive() {
    let backend = with_change_accounts();
    let security = policy(backend.clone(), Duration::from_secs(60));

    for variant in ["SVC-ROUTER", "Svc-Router", "svc-router "] {
        assert!(
            !security
                .is_authorized_change_account(DEFINITION_ID, variant)
                .await
                .unwrap(),
            "{variant} must not match svc-router"
        );
    }
    assert!(security
        .is_authorized_change_account(DEFINITION_ID, "svc-router")
        .await
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn change_accounts_are_refetched_after_expiry() {
    let backend = with_change_accounts();
    let security = policy(backend.clone(), Duration::from_secs(60));

    security
        .is_authorized_change_account(DEFINITION_ID, "svc-router")
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    security
        .is_authorized_change_account(DEFINITION_ID, "svc-router")
        .await
        .unwrap();
    assert_eq!(count(&backend.calls.change_accounts), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    security
        .is_authorized_change_account(DEFINITION_ID, "svc-router")
        .await
        .unwrap();
    assert_eq!(count(&backend.calls.change_accounts), 2);
}

#[tokio::test]
async fn empty_user_ids_fail_the_access_check() {
    let backend = with_change_accounts();
    let security = policy(backend.clone(), Duration::from_secs(60));

    assert!(matches!(
        security.is_super_user(1, "").await,
        Err(ApprovalsError::AccessCheck(_))
    ));
    assert!(matches!(
        security.is_approvals_admin("  ").await,
        Err(ApprovalsError::AccessCheck(_))
    ));
    assert!(matches!(
        security.is_authorized_change_account(DEFINITION_ID, "").await,
        Err(ApprovalsError::AccessCheck(_))
    ));
    assert_eq!(count(&backend.calls.is_super_user), 0);
    assert_eq!(count(&backend.calls.change_accounts), 0);
}

#[tokio::test]
async fn activity_manager_processes_name_their_service_accounts() {
    let security = policy(Arc::new(FakeBackend::default()), Duration::from_secs(60));

    let mut process = process_in(
        1,
        ProcessState::Pending,
        activity(ActivityState::Pending, &["2000002"]),
    );
    assert!(security.authorized_accounts(&process).is_empty());

    process.document_type_name = ACTIVITY_MANAGER_DOCUMENT_TYPES[1].to_string();
    assert_eq!(
        security.authorized_accounts(&process),
        vec![
            ACTIVITY_MANAGER_ACCOUNT.to_string(),
            ACTIVITY_MANAGER_TEST_ACCOUNT.to_string()
        ]
    );
}
