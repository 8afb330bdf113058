use std::sync::Arc;

use approvals_model::{
    PageRequest, PagedResult, Person, Process, ProcessFilter, ProcessId, ProcessState, RoutingItem,
    TerminateProcessResponse, ValidationError,
};
use approvals_storage::{LegacyRoutingService, ProcessStore, StorageError};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::activity::load_process;
use crate::error::{ensure_active, ApprovalsError};
use crate::query::{generate_filter, FilterQuery};
use crate::search::SearchDispatcher;
use crate::security::SecurityPolicy;

/// Reads, creates, terminates and searches processes.
pub struct ProcessFacade {
    processes: Arc<dyn ProcessStore>,
    routing: Arc<dyn LegacyRoutingService>,
    security: Arc<SecurityPolicy>,
    dispatcher: SearchDispatcher,
}

impl ProcessFacade {
    pub fn new(
        processes: Arc<dyn ProcessStore>,
        routing: Arc<dyn LegacyRoutingService>,
        security: Arc<SecurityPolicy>,
    ) -> Self {
        let dispatcher = SearchDispatcher::new(processes.clone(), security.clone());
        Self {
            processes,
            routing,
            security,
            dispatcher,
        }
    }

    pub async fn get(
        &self,
        ids: &[ProcessId],
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Process>, ApprovalsError> {
        ensure_active(cancel)?;
        let page = page.resolve()?;
        Ok(self.processes.get_by_ids(ids, page).await?)
    }

    /// Route a new document for approval and return the created process.
    pub async fn create_routing(
        &self,
        item: &RoutingItem,
        cancel: &CancellationToken,
    ) -> Result<Process, ApprovalsError> {
        ensure_active(cancel)?;
        item.validate()?;

        ensure_active(cancel)?;
        let process_id = self.routing.create_routing(item).await.map_err(|e| {
            tracing::error!(
                document_type = %item.document_type_name,
                document_id = %item.document_id,
                error = %e,
                "routing service rejected new routing"
            );
            ApprovalsError::from(e)
        })?;
        tracing::info!(process_id, document_type = %item.document_type_name, "routing created");

        load_process(self.processes.as_ref(), process_id, cancel).await
    }

    /// Terminate a process that is neither APPROVED nor TERMINATED.
    ///
    /// The caller must be an authorized change account (by network
    /// username), a super-user on the process, or an approvals admin (both
    /// by canonical id). The first that holds wins.
    pub async fn terminate(
        &self,
        process_id: ProcessId,
        terminate_without_statusing: bool,
        user: &Person,
        cancel: &CancellationToken,
    ) -> Result<TerminateProcessResponse, ApprovalsError> {
        ensure_active(cancel)?;
        let process = load_process(self.processes.as_ref(), process_id, cancel).await?;
        if process.process_state.is_final() {
            return Err(ApprovalsError::InvalidProcessState {
                process_id,
                state: process.process_state,
                operation: "terminate",
            });
        }

        let Some(user_id) = self.authorize_terminate(&process, user, cancel).await? else {
            tracing::info!(
                process_id,
                user = ?user.canonical_id(),
                network = ?user.network_username(),
                "termination refused"
            );
            return Err(ApprovalsError::AccessDenied(format!(
                "user is not authorized to terminate process {process_id}"
            )));
        };

        let status = format!(
            "{}'- {}': TERMINATED by: {}",
            process.document_type_name, process.document_id, user_id
        );
        ensure_active(cancel)?;
        let terminated = self
            .processes
            .terminate(process_id, &user_id, &status, !terminate_without_statusing)
            .await
            .map_err(|e| match e {
                // Lost a race with another terminate or the final approval.
                StorageError::ProcessClosed { process_id, state } => {
                    tracing::info!(
                        process_id,
                        user = %user_id,
                        %state,
                        "process closed before terminate"
                    );
                    ApprovalsError::InvalidProcessState {
                        process_id,
                        state,
                        operation: "terminate",
                    }
                }
                e => {
                    tracing::error!(process_id, user = %user_id, error = %e, "terminate failed");
                    ApprovalsError::from(e)
                }
            })?;

        if terminated.process_state != ProcessState::Terminated {
            return Err(ApprovalsError::TerminateFailed {
                process_id,
                state: terminated.process_state,
            });
        }
        tracing::info!(process_id, user = %user_id, "process terminated");

        Ok(TerminateProcessResponse {
            process_id: terminated.process_id,
            state: terminated.process_state,
            status: terminated.process_status,
        })
    }

    /// Walk the termination ladder. Returns the id the termination is
    /// recorded under, or `None` when every rung refuses.
    async fn authorize_terminate(
        &self,
        process: &Process,
        user: &Person,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ApprovalsError> {
        if let Some(username) = user.network_username() {
            ensure_active(cancel)?;
            if self
                .security
                .is_authorized_change_account(process.process_definition_id, username)
                .await?
            {
                return Ok(Some(username.to_string()));
            }
        }

        let user_id = user.canonical_id().unwrap_or_default();
        ensure_active(cancel)?;
        if self
            .security
            .is_super_user(process.process_id, user_id)
            .await?
        {
            return Ok(Some(user_id.to_string()));
        }
        ensure_active(cancel)?;
        if self.security.is_approvals_admin(user_id).await? {
            return Ok(Some(user_id.to_string()));
        }
        Ok(None)
    }

    /// Build a search filter from raw parameters, with day ranges ending today.
    pub fn generate_filter(&self, query: &FilterQuery) -> Result<ProcessFilter, ValidationError> {
        generate_filter(query, OffsetDateTime::now_utc().date())
    }

    pub async fn search(
        &self,
        filter: ProcessFilter,
        caller: &Person,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Process>, ApprovalsError> {
        let page = page.resolve()?;
        self.dispatcher.search(filter, caller, page, cancel).await
    }
}
