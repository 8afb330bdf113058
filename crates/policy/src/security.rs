//! Security policy evaluator.
//!
//! Answers the four questions the state machine and the search dispatcher
//! ask: is this user a super-user on a process, a global admin, an
//! authorized change account for a definition, and which document types may
//! they read.

use std::collections::BTreeSet;
use std::sync::Arc;

use approvals_model::{Person, Process, ProcessId};
use approvals_storage::{DefinitionRole, SecuritySource};

use crate::cache::LookupCache;
use crate::error::ApprovalsError;

/// Activity Manager service account.
pub const ACTIVITY_MANAGER_ACCOUNT: &str = "msaActMan$";

/// Test account allowed alongside the Activity Manager service account.
pub const ACTIVITY_MANAGER_TEST_ACCOUNT: &str = "D3X213";

/// Document types routed by Activity Manager.
pub const ACTIVITY_MANAGER_DOCUMENT_TYPES: [&str; 3] = [
    "Activity Manager CSM Approval",
    "Activity Manager Worker Approval",
    "Activity Manager Activity Approval",
];

pub struct SecurityPolicy {
    source: Arc<dyn SecuritySource>,
    change_accounts: Arc<dyn LookupCache<i64, Vec<String>>>,
}

impl SecurityPolicy {
    pub fn new(
        source: Arc<dyn SecuritySource>,
        change_accounts: Arc<dyn LookupCache<i64, Vec<String>>>,
    ) -> Self {
        Self {
            source,
            change_accounts,
        }
    }

    pub async fn is_super_user(
        &self,
        process_id: ProcessId,
        user_id: &str,
    ) -> Result<bool, ApprovalsError> {
        require_user("super-user check", user_id)?;
        self.source
            .is_super_user(process_id, user_id)
            .await
            .map_err(|e| {
                tracing::error!(process_id, user_id, error = %e, "super-user check failed");
                e.into()
            })
    }

    pub async fn is_approvals_admin(&self, user_id: &str) -> Result<bool, ApprovalsError> {
        require_user("admin check", user_id)?;
        self.source.is_approvals_admin(user_id).await.map_err(|e| {
            tracing::error!(user_id, error = %e, "admin check failed");
            e.into()
        })
    }

    /// Whether `network_id` may change processes of the definition.
    ///
    /// The account list is resolved once per definition id and served from
    /// the cache until it expires.
    pub async fn is_authorized_change_account(
        &self,
        process_definition_id: i64,
        network_id: &str,
    ) -> Result<bool, ApprovalsError> {
        require_user("change-account check", network_id)?;
        let accounts = self.authorized_change_accounts(process_definition_id).await?;
        Ok(accounts.iter().any(|account| account == network_id))
    }

    pub async fn authorized_change_accounts(
        &self,
        process_definition_id: i64,
    ) -> Result<Vec<String>, ApprovalsError> {
        if let Some(accounts) = self.change_accounts.get(&process_definition_id).await {
            return Ok(accounts);
        }
        let accounts = self
            .source
            .authorized_change_accounts(process_definition_id)
            .await
            .map_err(|e| {
                tracing::error!(process_definition_id, error = %e, "change-account lookup failed");
                ApprovalsError::from(e)
            })?;
        self.change_accounts
            .insert(process_definition_id, accounts.clone())
            .await;
        Ok(accounts)
    }

    /// Network accounts hard-wired to Activity Manager processes.
    ///
    /// Stop gap until process definitions carry the service-account role.
    pub fn authorized_accounts(&self, process: &Process) -> Vec<String> {
        if ACTIVITY_MANAGER_DOCUMENT_TYPES.contains(&process.document_type_name.as_str()) {
            vec![
                ACTIVITY_MANAGER_ACCOUNT.to_string(),
                ACTIVITY_MANAGER_TEST_ACCOUNT.to_string(),
            ]
        } else {
            Vec::new()
        }
    }

    /// Every document type `user` may read.
    pub async fn read_document_types(
        &self,
        user: &Person,
    ) -> Result<BTreeSet<String>, ApprovalsError> {
        if user.network_id() == Some(ACTIVITY_MANAGER_ACCOUNT) {
            return Ok(ACTIVITY_MANAGER_DOCUMENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect());
        }
        let Some(user_id) = user.canonical_id() else {
            tracing::debug!(
                network_id = ?user.network_id(),
                "no canonical id, no readable document types"
            );
            return Ok(BTreeSet::new());
        };

        if self.source.is_approvals_admin(user_id).await?
            || self.source.is_site_readonly(user_id).await?
        {
            return Ok(self.source.enabled_document_types().await?);
        }

        let mut types = BTreeSet::new();
        for role in DefinitionRole::ALL {
            types.extend(self.source.role_document_types(user_id, role).await?);
        }
        Ok(types)
    }
}

fn require_user(check: &str, user_id: &str) -> Result<(), ApprovalsError> {
    if user_id.trim().is_empty() {
        return Err(ApprovalsError::AccessCheck(format!(
            "{check} requires a user id"
        )));
    }
    Ok(())
}
