use std::collections::BTreeSet;

use approvals_model::{
    Activity, ActivityId, ActorAction, Page, PagedResult, PersonIdentification, Process,
    ProcessFilter, ProcessId, ProcessNodeResult, RoutingItem, TerminateProcessResponse, MAX_LIMIT,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Read and terminate access to persisted processes.
///
/// ## Search variants
///
/// The three search methods receive a filter that the caller has already
/// narrowed for its scoping strategy:
///
/// - `search_by_actor`: `actor_ids` names the caller; results are joined on
///   actor entitlement and restricted to `activity_states`.
/// - `search_by_originator`: scoped by originator (and, for the beneficiary
///   strategy, by beneficiary) ids.
/// - `search_by_user`: `document_types` MUST be `Some`; results are limited
///   to those types. An empty set yields no results.
///
/// ## Terminate atomicity
///
/// `terminate` MUST apply the state change, the clearing of pending
/// activities and the optional notification enqueue as one unit: either all
/// are visible afterwards or none are.
#[async_trait]
pub trait ProcessStore: Send + Sync + 'static {
    async fn get_by_ids(
        &self,
        ids: &[ProcessId],
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError>;

    async fn search_by_actor(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError>;

    async fn search_by_originator(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError>;

    async fn search_by_user(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError>;

    /// Move a process to `TERMINATED` and return it.
    ///
    /// Returns `Err(StorageError::ProcessNotFound)` for an unknown id and
    /// `Err(StorageError::InvalidArgument)` for an empty user or status.
    async fn terminate(
        &self,
        process_id: ProcessId,
        acting_user_id: &str,
        status: &str,
        send_notifications: bool,
    ) -> Result<Process, StorageError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync + 'static {
    async fn get_by_ids(
        &self,
        ids: &[ActivityId],
        page: Page,
    ) -> Result<PagedResult<Activity>, StorageError>;
}

/// Document metadata extracted at routing time.
///
/// Results are grouped per process and paged by process, not by node.
/// An empty id list is `Err(StorageError::InvalidArgument)`.
#[async_trait]
pub trait ProcessNodeStore: Send + Sync + 'static {
    async fn get_by_process_ids(
        &self,
        process_ids: &[ProcessId],
        page: Page,
    ) -> Result<PagedResult<ProcessNodeResult>, StorageError>;
}

/// The legacy routing service that owns process instantiation and actor
/// action application.
#[async_trait]
pub trait LegacyRoutingService: Send + Sync + 'static {
    /// Instantiate a routing and return the new process id.
    async fn create_routing(&self, item: &RoutingItem) -> Result<ProcessId, StorageError>;

    /// Apply an actor's decision and return the id of the acted activity.
    async fn apply_actor_action(&self, action: &ActorAction) -> Result<ActivityId, StorageError>;

    async fn terminate_process(
        &self,
        process_id: ProcessId,
        user: &str,
    ) -> Result<TerminateProcessResponse, StorageError>;

    /// Terminate without sending status notifications.
    async fn terminate_no_statusing(
        &self,
        process_id: ProcessId,
        user: &str,
    ) -> Result<TerminateProcessResponse, StorageError>;
}

/// Person lookups across the Hanford, employee and network namespaces.
///
/// Unknown ids are `Ok(None)`, not errors.
#[async_trait]
pub trait PersonIdentificationStore: Send + Sync + 'static {
    async fn get_by_hanford_id(
        &self,
        hanford_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError>;

    async fn get_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError>;

    async fn get_by_network_id(
        &self,
        domain: &str,
        network_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError>;

    /// Match `id` against every namespace.
    async fn get_by_id(&self, id: &str) -> Result<Option<PersonIdentification>, StorageError>;
}

/// Per-definition roles that grant read access to a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefinitionRole {
    SuperUser,
    ReadOnly,
    Developer,
}

impl DefinitionRole {
    pub const ALL: [DefinitionRole; 3] = [
        DefinitionRole::SuperUser,
        DefinitionRole::ReadOnly,
        DefinitionRole::Developer,
    ];
}

/// Primitive security predicates backing the approvals security policy.
#[async_trait]
pub trait SecuritySource: Send + Sync + 'static {
    /// Whether `user_id` holds the super-user role on the process's definition.
    async fn is_super_user(&self, process_id: ProcessId, user_id: &str)
        -> Result<bool, StorageError>;

    async fn is_approvals_admin(&self, user_id: &str) -> Result<bool, StorageError>;

    /// Blanket read access to every enabled document type.
    async fn is_site_readonly(&self, user_id: &str) -> Result<bool, StorageError>;

    /// Network ids explicitly allowed to change processes of a definition.
    async fn authorized_change_accounts(
        &self,
        process_definition_id: i64,
    ) -> Result<Vec<String>, StorageError>;

    async fn enabled_document_types(&self) -> Result<BTreeSet<String>, StorageError>;

    /// Document types whose definition grants `role` to `user_id`.
    async fn role_document_types(
        &self,
        user_id: &str,
        role: DefinitionRole,
    ) -> Result<BTreeSet<String>, StorageError>;
}

/// A status notification queued by a terminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationNotification {
    pub process_id: ProcessId,
    pub acting_user_id: String,
    pub status: String,
}

/// Read access to the notification outbox.
#[async_trait]
pub trait NotificationLog: Send + Sync + 'static {
    async fn notifications_for(
        &self,
        process_id: ProcessId,
    ) -> Result<Vec<TerminationNotification>, StorageError>;
}

/// Reject pages a backend cannot serve.
pub fn check_page(page: Page) -> Result<(), StorageError> {
    if page.limit == 0 || page.limit > MAX_LIMIT {
        return Err(StorageError::InvalidArgument(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {}",
            page.limit
        )));
    }
    Ok(())
}
