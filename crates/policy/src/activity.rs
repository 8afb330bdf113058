use std::sync::Arc;

use approvals_model::{
    Activity, ActivityId, ActorAction, Page, PageRequest, PagedResult, Person, Process, ProcessId,
};
use approvals_storage::{ActivityStore, LegacyRoutingService, ProcessStore};
use tokio_util::sync::CancellationToken;

use crate::actor::is_valid_actor;
use crate::error::{ensure_active, ApprovalsError};
use crate::security::SecurityPolicy;

/// Reads activities and applies actor actions to them.
pub struct ActivityFacade {
    activities: Arc<dyn ActivityStore>,
    processes: Arc<dyn ProcessStore>,
    routing: Arc<dyn LegacyRoutingService>,
    security: Arc<SecurityPolicy>,
}

impl ActivityFacade {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        processes: Arc<dyn ProcessStore>,
        routing: Arc<dyn LegacyRoutingService>,
        security: Arc<SecurityPolicy>,
    ) -> Self {
        Self {
            activities,
            processes,
            routing,
            security,
        }
    }

    pub async fn get(
        &self,
        ids: &[ActivityId],
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Activity>, ApprovalsError> {
        ensure_active(cancel)?;
        let page = page.resolve()?;
        Ok(self.activities.get_by_ids(ids, page).await?)
    }

    /// Apply an actor's decision to a pending activity and return the
    /// refreshed process.
    ///
    /// Nothing reaches the routing service unless the process is PENDING,
    /// the activity accepts actions, the caller has change rights and the
    /// named actor is entitled to the activity.
    pub async fn apply_actor_action(
        &self,
        action: &ActorAction,
        acting_user: &Person,
        cancel: &CancellationToken,
    ) -> Result<Process, ApprovalsError> {
        ensure_active(cancel)?;
        action.validate()?;

        let process = load_process(self.processes.as_ref(), action.process_id, cancel).await?;
        if !process.process_state.accepts_actor_actions() {
            return Err(ApprovalsError::InvalidProcessState {
                process_id: process.process_id,
                state: process.process_state,
                operation: "apply an actor action to",
            });
        }

        let activity =
            process
                .activity(action.activity_id)
                .ok_or(ApprovalsError::ActivityNotFound {
                    process_id: process.process_id,
                    activity_id: action.activity_id,
                })?;
        if !activity.activity_state.accepts_actor_actions() {
            return Err(ApprovalsError::InvalidActivityState {
                activity_id: activity.activity_id,
                state: activity.activity_state,
            });
        }

        if !self
            .has_change_rights(&process, activity, action, acting_user, cancel)
            .await?
        {
            tracing::info!(
                process_id = process.process_id,
                activity_id = activity.activity_id,
                actor = %action.actor_hanford_id,
                user = ?acting_user.canonical_id(),
                "actor action refused: no change rights"
            );
            return Err(ApprovalsError::PermissionDenied(format!(
                "user may not act for {} on activity {}",
                action.actor_hanford_id, activity.activity_id
            )));
        }

        if !is_valid_actor(&action.actor_hanford_id, activity) {
            tracing::info!(
                process_id = process.process_id,
                activity_id = activity.activity_id,
                actor = %action.actor_hanford_id,
                "actor action refused: not an actor on the activity"
            );
            return Err(ApprovalsError::PermissionDenied(format!(
                "{} is not a valid actor on activity {}",
                action.actor_hanford_id, activity.activity_id
            )));
        }

        ensure_active(cancel)?;
        self.routing
            .apply_actor_action(action)
            .await
            .map_err(|e| {
                tracing::error!(
                    process_id = action.process_id,
                    activity_id = action.activity_id,
                    error = %e,
                    "routing service rejected actor action"
                );
                ApprovalsError::from(e)
            })?;

        load_process(self.processes.as_ref(), action.process_id, cancel).await
    }

    /// Acting for yourself requires being an actor; acting for someone else
    /// requires an authorized change account.
    async fn has_change_rights(
        &self,
        process: &Process,
        activity: &Activity,
        action: &ActorAction,
        acting_user: &Person,
        cancel: &CancellationToken,
    ) -> Result<bool, ApprovalsError> {
        if acting_user.is(&action.actor_hanford_id) {
            return Ok(is_valid_actor(&action.actor_hanford_id, activity));
        }
        match acting_user.network_username() {
            Some(username) => {
                ensure_active(cancel)?;
                self.security
                    .is_authorized_change_account(process.process_definition_id, username)
                    .await
            }
            None => Ok(false),
        }
    }
}

/// Load one process or fail with `ProcessNotFound`.
pub(crate) async fn load_process(
    processes: &dyn ProcessStore,
    process_id: ProcessId,
    cancel: &CancellationToken,
) -> Result<Process, ApprovalsError> {
    ensure_active(cancel)?;
    processes
        .get_by_ids(&[process_id], Page::new(0, 1))
        .await?
        .into_first()
        .ok_or(ApprovalsError::ProcessNotFound { process_id })
}
