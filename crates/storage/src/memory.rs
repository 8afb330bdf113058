//! In-memory backend implementing every approvals collaborator.
//!
//! Seeded from a JSON [`Fixture`] and used by `approvals serve` and the test
//! suites. All mutations happen under one lock, so `terminate` is atomic and
//! terminates of the same process are serialized.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use approvals_model::{
    group_nodes, Activity, ActivityId, ActivityState, Actor, ActorAction, ActorActionTaken, Page,
    PagedResult, PersonIdentification, Process, ProcessFilter, ProcessId, ProcessNode,
    ProcessNodeResult, ProcessState, RoutingItem, TerminateProcessResponse,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::traits::{
    check_page, ActivityStore, DefinitionRole, LegacyRoutingService, NotificationLog,
    PersonIdentificationStore, ProcessNodeStore, ProcessStore, SecuritySource,
    TerminationNotification,
};

/// Seed data for [`InMemoryBackend`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub definitions: Vec<DefinitionFixture>,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub people: Vec<PersonIdentification>,
    /// Document metadata rows, one per extracted value.
    #[serde(default)]
    pub nodes: Vec<ProcessNode>,
    /// Canonical ids of global approvals administrators.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Canonical ids with blanket read access.
    #[serde(default)]
    pub site_readonly: Vec<String>,
}

/// A process definition: its routing template and its security roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionFixture {
    pub process_definition_id: i64,
    pub document_type_name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub activities: Vec<ActivityTemplate>,
    #[serde(default)]
    pub super_users: Vec<String>,
    #[serde(default)]
    pub read_only_users: Vec<String>,
    #[serde(default)]
    pub developers: Vec<String>,
    /// Network ids allowed to change processes of this definition.
    #[serde(default)]
    pub change_accounts: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl DefinitionFixture {
    fn role_members(&self, role: DefinitionRole) -> &[String] {
        match role {
            DefinitionRole::SuperUser => &self.super_users,
            DefinitionRole::ReadOnly => &self.read_only_users,
            DefinitionRole::Developer => &self.developers,
        }
    }
}

/// One step of a routing template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTemplate {
    pub activity_name: String,
    #[serde(default)]
    pub actor_hanford_ids: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    processes: BTreeMap<ProcessId, Process>,
    notifications: Vec<TerminationNotification>,
    actions: Vec<ActorAction>,
    next_process_id: ProcessId,
    next_activity_id: ActivityId,
    next_actor_id: i64,
}

impl State {
    fn process(&self, process_id: ProcessId) -> Result<&Process, StorageError> {
        self.processes
            .get(&process_id)
            .ok_or(StorageError::ProcessNotFound { process_id })
    }

    fn process_mut(&mut self, process_id: ProcessId) -> Result<&mut Process, StorageError> {
        self.processes
            .get_mut(&process_id)
            .ok_or(StorageError::ProcessNotFound { process_id })
    }

    /// Terminate under the lock. A process that is already approved or
    /// terminated is refused and queues nothing.
    fn terminate(
        &mut self,
        process_id: ProcessId,
        acting_user_id: &str,
        status: &str,
        send_notifications: bool,
    ) -> Result<Process, StorageError> {
        let now = OffsetDateTime::now_utc();
        let process = self.process_mut(process_id)?;
        if process.process_state.is_final() {
            return Err(StorageError::ProcessClosed {
                process_id,
                state: process.process_state,
            });
        }

        process.process_state = ProcessState::Terminated;
        process.process_status = Some(status.to_string());
        process.last_change_hanford_id = Some(acting_user_id.to_string());
        process.last_change_date_time = now;
        clear_pending(process, now);
        let terminated = process.clone();

        if send_notifications {
            self.notifications.push(TerminationNotification {
                process_id,
                acting_user_id: acting_user_id.to_string(),
                status: status.to_string(),
            });
        }
        Ok(terminated)
    }
}

fn clear_pending(process: &mut Process, now: OffsetDateTime) {
    for activity in process.activities.values_mut() {
        if activity.activity_state.is_pending() {
            activity.activity_state = ActivityState::NotYetPending;
            activity.pending_date_time = None;
            activity.last_change_date_time = Some(now);
        }
    }
}

/// Every approvals collaborator backed by process memory.
pub struct InMemoryBackend {
    definitions: Vec<DefinitionFixture>,
    people: Vec<PersonIdentification>,
    nodes: Vec<ProcessNode>,
    admins: BTreeSet<String>,
    site_readonly: BTreeSet<String>,
    state: Mutex<State>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::from_fixture(Fixture::default())
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut state = State::default();
        for mut process in fixture.processes {
            normalize(&mut process);
            state.next_activity_id = state
                .next_activity_id
                .max(process.activities.keys().copied().max().unwrap_or(0));
            for activity in process.activities.values() {
                state.next_actor_id = state
                    .next_actor_id
                    .max(activity.actors.keys().copied().max().unwrap_or(0));
            }
            state.next_process_id = state.next_process_id.max(process.process_id);
            state.processes.insert(process.process_id, process);
        }

        Self {
            definitions: fixture.definitions,
            people: fixture.people,
            nodes: fixture.nodes,
            admins: fixture.admins.into_iter().collect(),
            site_readonly: fixture.site_readonly.into_iter().collect(),
            state: Mutex::new(state),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// A backend holding only `processes`.
    pub fn with_processes(processes: Vec<Process>) -> Self {
        Self::from_fixture(Fixture {
            processes,
            ..Fixture::default()
        })
    }

    /// Actor actions forwarded to the routing service, oldest first.
    pub async fn forwarded_actions(&self) -> Vec<ActorAction> {
        self.state.lock().await.actions.clone()
    }

    pub async fn process_count(&self) -> usize {
        self.state.lock().await.processes.len()
    }

    fn definition_for(&self, document_type_name: &str) -> Option<&DefinitionFixture> {
        self.definitions
            .iter()
            .find(|d| d.document_type_name == document_type_name)
    }

    fn definition(&self, process_definition_id: i64) -> Option<&DefinitionFixture> {
        self.definitions
            .iter()
            .find(|d| d.process_definition_id == process_definition_id)
    }

    async fn search(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        check_page(page)?;
        let state = self.state.lock().await;
        let matches = state
            .processes
            .values()
            .filter(|p| filter.matches_process(p) && matches_activities(filter, p))
            .cloned()
            .collect();
        Ok(PagedResult::from_all(matches, page))
    }

    async fn legacy_terminate(
        &self,
        process_id: ProcessId,
        user: &str,
        send_notifications: bool,
    ) -> Result<TerminateProcessResponse, StorageError> {
        require("user", user)?;
        let status = format!("Terminated by: {user}");
        let process = self
            .state
            .lock()
            .await
            .terminate(process_id, user, &status, send_notifications)?;
        Ok(TerminateProcessResponse {
            process_id,
            state: process.process_state,
            status: process.process_status,
        })
    }
}

/// Back-fill parent ids the fixture format lets authors omit.
fn normalize(process: &mut Process) {
    for (activity_id, activity) in process.activities.iter_mut() {
        activity.activity_id = *activity_id;
        activity.process_id = process.process_id;
        for (actor_id, actor) in activity.actors.iter_mut() {
            actor.actor_id = *actor_id;
            actor.activity_id = *activity_id;
        }
    }
}

/// Activity-level criteria: some activity in one of the requested states
/// carrying one of the requested actors.
fn matches_activities(filter: &ProcessFilter, process: &Process) -> bool {
    if filter.actor_ids.is_empty() && filter.activity_states.is_empty() {
        return true;
    }
    process.activities.values().any(|activity| {
        (filter.activity_states.is_empty()
            || filter.activity_states.contains(&activity.activity_state))
            && (filter.actor_ids.is_empty()
                || filter.actor_ids.iter().any(|id| activity.has_actor(id)))
    })
}

fn require(name: &str, value: &str) -> Result<(), StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidArgument(format!("{name} is required")));
    }
    Ok(())
}

#[async_trait]
impl ProcessStore for InMemoryBackend {
    async fn get_by_ids(
        &self,
        ids: &[ProcessId],
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        check_page(page)?;
        if ids.is_empty() {
            return Err(StorageError::InvalidArgument(
                "at least one process id is required".to_string(),
            ));
        }
        let state = self.state.lock().await;
        let mut seen = BTreeSet::new();
        let found = ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| state.processes.get(id).cloned())
            .collect();
        Ok(PagedResult::from_all(found, page))
    }

    async fn search_by_actor(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        if filter.actor_ids.is_empty() {
            return Err(StorageError::InvalidArgument(
                "actor search requires an actor id".to_string(),
            ));
        }
        self.search(filter, page).await
    }

    async fn search_by_originator(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        self.search(filter, page).await
    }

    async fn search_by_user(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        if filter.document_types.is_none() {
            return Err(StorageError::InvalidArgument(
                "user search requires a document type scope".to_string(),
            ));
        }
        self.search(filter, page).await
    }

    async fn terminate(
        &self,
        process_id: ProcessId,
        acting_user_id: &str,
        status: &str,
        send_notifications: bool,
    ) -> Result<Process, StorageError> {
        require("acting user id", acting_user_id)?;
        require("status", status)?;
        let process = self.state.lock().await.terminate(
            process_id,
            acting_user_id,
            status,
            send_notifications,
        )?;
        tracing::debug!(process_id, acting_user_id, send_notifications, "process terminated");
        Ok(process)
    }
}

#[async_trait]
impl ActivityStore for InMemoryBackend {
    async fn get_by_ids(
        &self,
        ids: &[ActivityId],
        page: Page,
    ) -> Result<PagedResult<Activity>, StorageError> {
        check_page(page)?;
        if ids.is_empty() {
            return Err(StorageError::InvalidArgument(
                "at least one activity id is required".to_string(),
            ));
        }
        let state = self.state.lock().await;
        let mut found: Vec<Activity> = state
            .processes
            .values()
            .flat_map(|p| p.activities.values())
            .filter(|a| ids.contains(&a.activity_id))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.activity_id);
        Ok(PagedResult::from_all(found, page))
    }
}

#[async_trait]
impl LegacyRoutingService for InMemoryBackend {
    async fn create_routing(&self, item: &RoutingItem) -> Result<ProcessId, StorageError> {
        item.validate()
            .map_err(|e| StorageError::InvalidArgument(e.to_string()))?;
        let definition = self
            .definition_for(&item.document_type_name)
            .filter(|d| d.enabled)
            .ok_or_else(|| {
                StorageError::Routing(format!(
                    "no enabled process definition for document type '{}'",
                    item.document_type_name
                ))
            })?;
        if definition.activities.is_empty() {
            return Err(StorageError::Routing(format!(
                "process definition {} has no activities",
                definition.process_definition_id
            )));
        }

        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        state.next_process_id += 1;
        let process_id = state.next_process_id;

        let mut activities = BTreeMap::new();
        for (index, template) in definition.activities.iter().enumerate() {
            state.next_activity_id += 1;
            let activity_id = state.next_activity_id;
            let mut actors = BTreeMap::new();
            for hanford_id in &template.actor_hanford_ids {
                state.next_actor_id += 1;
                let actor_id = state.next_actor_id;
                actors.insert(
                    actor_id,
                    Actor {
                        actor_id,
                        activity_id,
                        actor_criteria_id: 0,
                        actor_hanford_id: hanford_id.clone(),
                        actor_type: "PRIMARY".to_string(),
                        delegator_hanford_id: None,
                    },
                );
            }
            let first = index == 0;
            activities.insert(
                activity_id,
                Activity {
                    activity_id,
                    process_id,
                    activity_name: template.activity_name.clone(),
                    pending_date_time: first.then_some(now),
                    last_change_date_time: None,
                    activity_state: if first {
                        ActivityState::Pending
                    } else {
                        ActivityState::NotYetPending
                    },
                    activity_status: None,
                    comment: None,
                    acted_user_id: None,
                    acted_hanford_id: None,
                    acted_actor_id: None,
                    is_ghost: false,
                    is_adhoc: false,
                    actors,
                },
            );
        }

        state.processes.insert(
            process_id,
            Process {
                process_id,
                process_definition_id: definition.process_definition_id,
                document_type_name: item.document_type_name.clone(),
                document_id: item.document_id.clone(),
                document_title: item.document_title.clone(),
                originator_hanford_id: item.originator_hanford_id.clone(),
                beneficiary_hanford_id: item.beneficiary_hanford_id.clone(),
                process_state: ProcessState::Pending,
                process_status: None,
                create_date_time: item.create_date_time.unwrap_or(now),
                last_change_date_time: item.last_change_date_time.unwrap_or(now),
                last_change_hanford_id: Some(item.submit_user_hanford_id.clone()),
                activities,
            },
        );
        tracing::debug!(process_id, document_type = %item.document_type_name, "routing created");
        Ok(process_id)
    }

    async fn apply_actor_action(&self, action: &ActorAction) -> Result<ActivityId, StorageError> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        let process = state.process_mut(action.process_id)?;
        let activity = process
            .activities
            .get_mut(&action.activity_id)
            .ok_or(StorageError::ActivityNotFound {
                activity_id: action.activity_id,
            })?;
        if !activity.activity_state.accepts_actor_actions() {
            return Err(StorageError::Routing(format!(
                "activity {} is {}, not pending",
                action.activity_id, activity.activity_state
            )));
        }

        activity.activity_state = ActivityState::Complete;
        activity.activity_status = Some(action.action_taken.resulting_status().to_string());
        activity.comment = action.comment.clone();
        activity.acted_hanford_id = Some(action.actor_hanford_id.clone());
        activity.acted_user_id = Some(action.actor_hanford_id.clone());
        activity.acted_actor_id = activity
            .actors
            .values()
            .find(|a| a.actor_hanford_id == action.actor_hanford_id)
            .map(|a| a.actor_id);
        activity.last_change_date_time = Some(now);

        if let Some(title) = &action.document_title {
            process.document_title = title.clone();
        }
        process.last_change_hanford_id = Some(action.actor_hanford_id.clone());
        process.last_change_date_time = now;

        if action.action_taken == ActorActionTaken::Reject {
            process.process_state = ProcessState::Terminated;
            process.process_status = Some(format!("REJECTED by: {}", action.actor_hanford_id));
            clear_pending(process, now);
        } else {
            let next = process
                .activities
                .range_mut((Bound::Excluded(action.activity_id), Bound::Unbounded))
                .map(|(_, a)| a)
                .find(|a| a.activity_state == ActivityState::NotYetPending && !a.is_ghost);
            match next {
                Some(next) => {
                    next.activity_state = ActivityState::Pending;
                    next.pending_date_time = Some(now);
                }
                None => {
                    let still_pending = process
                        .activities
                        .values()
                        .any(|a| a.activity_state.is_pending());
                    if !still_pending {
                        process.process_state = ProcessState::Approved;
                        process.process_status = Some(ProcessState::Approved.to_string());
                    }
                }
            }
        }

        state.actions.push(action.clone());
        Ok(action.activity_id)
    }

    async fn terminate_process(
        &self,
        process_id: ProcessId,
        user: &str,
    ) -> Result<TerminateProcessResponse, StorageError> {
        self.legacy_terminate(process_id, user, true).await
    }

    async fn terminate_no_statusing(
        &self,
        process_id: ProcessId,
        user: &str,
    ) -> Result<TerminateProcessResponse, StorageError> {
        self.legacy_terminate(process_id, user, false).await
    }
}

#[async_trait]
impl PersonIdentificationStore for InMemoryBackend {
    async fn get_by_hanford_id(
        &self,
        hanford_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(self
            .people
            .iter()
            .find(|p| p.hanford_id == hanford_id)
            .cloned())
    }

    async fn get_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(self
            .people
            .iter()
            .find(|p| p.employee_id == employee_id)
            .cloned())
    }

    async fn get_by_network_id(
        &self,
        domain: &str,
        network_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(self
            .people
            .iter()
            .find(|p| {
                p.domain.eq_ignore_ascii_case(domain)
                    && p.network_id.eq_ignore_ascii_case(network_id)
            })
            .cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(self.people.iter().find(|p| p.matches_any(id)).cloned())
    }
}

#[async_trait]
impl SecuritySource for InMemoryBackend {
    async fn is_super_user(
        &self,
        process_id: ProcessId,
        user_id: &str,
    ) -> Result<bool, StorageError> {
        let definition_id = self
            .state
            .lock()
            .await
            .process(process_id)?
            .process_definition_id;
        Ok(self
            .definition(definition_id)
            .is_some_and(|d| d.super_users.iter().any(|u| u == user_id)))
    }

    async fn is_approvals_admin(&self, user_id: &str) -> Result<bool, StorageError> {
        Ok(self.admins.contains(user_id))
    }

    async fn is_site_readonly(&self, user_id: &str) -> Result<bool, StorageError> {
        Ok(self.site_readonly.contains(user_id))
    }

    async fn authorized_change_accounts(
        &self,
        process_definition_id: i64,
    ) -> Result<Vec<String>, StorageError> {
        Ok(self
            .definition(process_definition_id)
            .map(|d| d.change_accounts.clone())
            .unwrap_or_default())
    }

    async fn enabled_document_types(&self) -> Result<BTreeSet<String>, StorageError> {
        Ok(self
            .definitions
            .iter()
            .filter(|d| d.enabled)
            .map(|d| d.document_type_name.clone())
            .collect())
    }

    async fn role_document_types(
        &self,
        user_id: &str,
        role: DefinitionRole,
    ) -> Result<BTreeSet<String>, StorageError> {
        Ok(self
            .definitions
            .iter()
            .filter(|d| d.enabled && d.role_members(role).iter().any(|u| u == user_id))
            .map(|d| d.document_type_name.clone())
            .collect())
    }
}

#[async_trait]
impl NotificationLog for InMemoryBackend {
    async fn notifications_for(
        &self,
        process_id: ProcessId,
    ) -> Result<Vec<TerminationNotification>, StorageError> {
        Ok(self
            .state
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| n.process_id == process_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProcessNodeStore for InMemoryBackend {
    async fn get_by_process_ids(
        &self,
        process_ids: &[ProcessId],
        page: Page,
    ) -> Result<PagedResult<ProcessNodeResult>, StorageError> {
        check_page(page)?;
        if process_ids.is_empty() {
            return Err(StorageError::InvalidArgument(
                "at least one process id is required".to_string(),
            ));
        }
        let rows = self
            .nodes
            .iter()
            .filter(|node| process_ids.contains(&node.process_id))
            .cloned();
        Ok(PagedResult::from_all(group_nodes(rows), page))
    }
}
