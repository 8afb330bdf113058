#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use approvals_model::{
    Activity, ActivityId, ActivityState, Actor, ActorAction, ActorActionTaken, NetworkIdentity,
    Page, PagedResult, Person, PersonIdentification, Process, ProcessFilter, ProcessId,
    ProcessNode, ProcessNodeResult, ProcessState, RoutingItem, TerminateProcessResponse,
};
use approvals_policy::Approvals;
use approvals_storage::{
    ActivityStore, DefinitionRole, LegacyRoutingService, PersonIdentificationStore,
    ProcessNodeStore, ProcessStore, SecuritySource, StorageError,
};
use async_trait::async_trait;
use time::macros::datetime;

pub const DEFINITION_ID: i64 = 12;
pub const ACTIVITY_ID: ActivityId = 10;

/// Call counters for every collaborator method the core uses.
#[derive(Debug, Default)]
pub struct Calls {
    pub get_by_ids: AtomicUsize,
    pub search_by_actor: AtomicUsize,
    pub search_by_originator: AtomicUsize,
    pub search_by_user: AtomicUsize,
    pub terminate: AtomicUsize,
    pub create_routing: AtomicUsize,
    pub apply_actor_action: AtomicUsize,
    pub is_super_user: AtomicUsize,
    pub is_approvals_admin: AtomicUsize,
    pub change_accounts: AtomicUsize,
    pub get_nodes: AtomicUsize,
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// A hand-written double for every collaborator, recording calls.
#[derive(Default)]
pub struct FakeBackend {
    pub processes: Mutex<BTreeMap<ProcessId, Process>>,
    pub super_users: Vec<String>,
    pub admins: Vec<String>,
    pub site_readonly: Vec<String>,
    pub change_accounts: BTreeMap<i64, Vec<String>>,
    pub enabled_types: BTreeSet<String>,
    pub role_types: HashMap<(String, DefinitionRole), BTreeSet<String>>,
    /// State `terminate` leaves the process in. Defaults to TERMINATED.
    pub terminate_leaves: Option<ProcessState>,
    pub nodes: Vec<ProcessNode>,
    /// When set, the admin lookup fails with a backend error.
    pub security_down: bool,
    /// When set, storage reports the process as already closed in this state.
    pub closed_before_terminate: Option<ProcessState>,
    pub calls: Calls,
    pub last_filter: Mutex<Option<ProcessFilter>>,
    pub last_terminate: Mutex<Option<(ProcessId, String, String, bool)>>,
    pub forwarded: Mutex<Vec<ActorAction>>,
}

impl FakeBackend {
    pub fn with_processes(processes: Vec<Process>) -> Self {
        Self {
            processes: Mutex::new(processes.into_iter().map(|p| (p.process_id, p)).collect()),
            ..Self::default()
        }
    }

    pub fn last_filter(&self) -> ProcessFilter {
        self.last_filter
            .lock()
            .unwrap()
            .clone()
            .expect("no search reached storage")
    }

    fn record_search(&self, filter: &ProcessFilter, page: Page) -> PagedResult<Process> {
        *self.last_filter.lock().unwrap() = Some(filter.clone());
        let all = self.processes.lock().unwrap().values().cloned().collect();
        PagedResult::from_all(all, page)
    }
}

pub fn approvals(backend: Arc<FakeBackend>) -> Approvals {
    Approvals::new(backend, Duration::from_secs(60))
}

#[async_trait]
impl ProcessStore for FakeBackend {
    async fn get_by_ids(
        &self,
        ids: &[ProcessId],
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        bump(&self.calls.get_by_ids);
        let processes = self.processes.lock().unwrap();
        let found = ids
            .iter()
            .filter_map(|id| processes.get(id).cloned())
            .collect();
        Ok(PagedResult::from_all(found, page))
    }

    async fn search_by_actor(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        bump(&self.calls.search_by_actor);
        Ok(self.record_search(filter, page))
    }

    async fn search_by_originator(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        bump(&self.calls.search_by_originator);
        Ok(self.record_search(filter, page))
    }

    async fn search_by_user(
        &self,
        filter: &ProcessFilter,
        page: Page,
    ) -> Result<PagedResult<Process>, StorageError> {
        bump(&self.calls.search_by_user);
        Ok(self.record_search(filter, page))
    }

    async fn terminate(
        &self,
        process_id: ProcessId,
        acting_user_id: &str,
        status: &str,
        send_notifications: bool,
    ) -> Result<Process, StorageError> {
        bump(&self.calls.terminate);
        *self.last_terminate.lock().unwrap() = Some((
            process_id,
            acting_user_id.to_string(),
            status.to_string(),
            send_notifications,
        ));
        if let Some(state) = self.closed_before_terminate {
            return Err(StorageError::ProcessClosed { process_id, state });
        }
        let mut processes = self.processes.lock().unwrap();
        let process = processes
            .get_mut(&process_id)
            .ok_or(StorageError::ProcessNotFound { process_id })?;
        process.process_state = self.terminate_leaves.unwrap_or(ProcessState::Terminated);
        process.process_status = Some(status.to_string());
        Ok(process.clone())
    }
}

#[async_trait]
impl ProcessNodeStore for FakeBackend {
    async fn get_by_process_ids(
        &self,
        process_ids: &[ProcessId],
        page: Page,
    ) -> Result<PagedResult<ProcessNodeResult>, StorageError> {
        bump(&self.calls.get_nodes);
        let rows = self
            .nodes
            .iter()
            .filter(|n| process_ids.contains(&n.process_id))
            .cloned();
        Ok(PagedResult::from_all(approvals_model::group_nodes(rows), page))
    }
}

#[async_trait]
impl ActivityStore for FakeBackend {
    async fn get_by_ids(
        &self,
        ids: &[ActivityId],
        page: Page,
    ) -> Result<PagedResult<Activity>, StorageError> {
        let processes = self.processes.lock().unwrap();
        let found = processes
            .values()
            .flat_map(|p| p.activities.values())
            .filter(|a| ids.contains(&a.activity_id))
            .cloned()
            .collect();
        Ok(PagedResult::from_all(found, page))
    }
}

#[async_trait]
impl LegacyRoutingService for FakeBackend {
    async fn create_routing(&self, item: &RoutingItem) -> Result<ProcessId, StorageError> {
        bump(&self.calls.create_routing);
        let mut processes = self.processes.lock().unwrap();
        let process_id = processes.keys().max().copied().unwrap_or(0) + 1;
        let mut process = pending_process(process_id, &[&item.originator_hanford_id]);
        process.document_type_name = item.document_type_name.clone();
        process.document_id = item.document_id.clone();
        processes.insert(process_id, process);
        Ok(process_id)
    }

    async fn apply_actor_action(&self, action: &ActorAction) -> Result<ActivityId, StorageError> {
        bump(&self.calls.apply_actor_action);
        self.forwarded.lock().unwrap().push(action.clone());
        let mut processes = self.processes.lock().unwrap();
        if let Some(activity) = processes
            .get_mut(&action.process_id)
            .and_then(|p| p.activities.get_mut(&action.activity_id))
        {
            activity.activity_state = ActivityState::Complete;
            activity.activity_status = Some(action.action_taken.resulting_status().to_string());
        }
        Ok(action.activity_id)
    }

    async fn terminate_process(
        &self,
        process_id: ProcessId,
        _user: &str,
    ) -> Result<TerminateProcessResponse, StorageError> {
        Err(StorageError::Routing(format!(
            "legacy terminate of {process_id} is not used by the core"
        )))
    }

    async fn terminate_no_statusing(
        &self,
        process_id: ProcessId,
        _user: &str,
    ) -> Result<TerminateProcessResponse, StorageError> {
        Err(StorageError::Routing(format!(
            "legacy terminate of {process_id} is not used by the core"
        )))
    }
}

#[async_trait]
impl PersonIdentificationStore for FakeBackend {
    async fn get_by_hanford_id(
        &self,
        _hanford_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(None)
    }

    async fn get_by_employee_id(
        &self,
        _employee_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(None)
    }

    async fn get_by_network_id(
        &self,
        _domain: &str,
        _network_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(None)
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<PersonIdentification>, StorageError> {
        Ok(None)
    }
}

#[async_trait]
impl SecuritySource for FakeBackend {
    async fn is_super_user(
        &self,
        _process_id: ProcessId,
        user_id: &str,
    ) -> Result<bool, StorageError> {
        bump(&self.calls.is_super_user);
        Ok(self.super_users.iter().any(|u| u == user_id))
    }

    async fn is_approvals_admin(&self, user_id: &str) -> Result<bool, StorageError> {
        bump(&self.calls.is_approvals_admin);
        if self.security_down {
            return Err(StorageError::Backend("security store unavailable".to_string()));
        }
        Ok(self.admins.iter().any(|u| u == user_id))
    }

    async fn is_site_readonly(&self, user_id: &str) -> Result<bool, StorageError> {
        Ok(self.site_readonly.iter().any(|u| u == user_id))
    }

    async fn authorized_change_accounts(
        &self,
        process_definition_id: i64,
    ) -> Result<Vec<String>, StorageError> {
        bump(&self.calls.change_accounts);
        Ok(self
            .change_accounts
            .get(&process_definition_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn enabled_document_types(&self) -> Result<BTreeSet<String>, StorageError> {
        Ok(self.enabled_types.clone())
    }

    async fn role_document_types(
        &self,
        user_id: &str,
        role: DefinitionRole,
    ) -> Result<BTreeSet<String>, StorageError> {
        Ok(self
            .role_types
            .get(&(user_id.to_string(), role))
            .cloned()
            .unwrap_or_default())
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

pub fn activity(state: ActivityState, actors: &[&str]) -> Activity {
    Activity {
        activity_id: ACTIVITY_ID,
        process_id: 0,
        activity_name: "Manager Approval".to_string(),
        pending_date_time: None,
        last_change_date_time: None,
        activity_state: state,
        activity_status: None,
        comment: None,
        acted_user_id: None,
        acted_hanford_id: None,
        acted_actor_id: None,
        is_ghost: actors.is_empty(),
        is_adhoc: false,
        actors: actors
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let actor_id = i as i64 + 1;
                (
                    actor_id,
                    Actor {
                        actor_id,
                        activity_id: ACTIVITY_ID,
                        actor_criteria_id: 0,
                        actor_hanford_id: id.to_string(),
                        actor_type: "PRIMARY".to_string(),
                        delegator_hanford_id: None,
                    },
                )
            })
            .collect(),
    }
}

pub fn process_in(process_id: ProcessId, state: ProcessState, activity: Activity) -> Process {
    Process {
        process_id,
        process_definition_id: DEFINITION_ID,
        document_type_name: "Travel Request".to_string(),
        document_id: format!("TR-{process_id}"),
        document_title: "Conference travel".to_string(),
        originator_hanford_id: "1000001".to_string(),
        beneficiary_hanford_id: "1000002".to_string(),
        process_state: state,
        process_status: None,
        create_date_time: datetime!(2024-03-01 08:00 UTC),
        last_change_date_time: datetime!(2024-03-01 08:00 UTC),
        last_change_hanford_id: None,
        activities: BTreeMap::from([(ACTIVITY_ID, activity)]),
    }
}

pub fn pending_process(process_id: ProcessId, actors: &[&str]) -> Process {
    process_in(
        process_id,
        ProcessState::Pending,
        activity(ActivityState::Pending, actors),
    )
}

pub fn person(id: &str, network_username: Option<&str>) -> Person {
    Person {
        id: Some(id.to_string()),
        employee_id: Some(format!("E{id}")),
        network: network_username.map(|u| NetworkIdentity::new("PNL", u)),
    }
}

pub fn action(process_id: ProcessId, actor: &str) -> ActorAction {
    ActorAction {
        process_id,
        activity_id: ACTIVITY_ID,
        comment: Some("approved".to_string()),
        document_title: None,
        actor_hanford_id: actor.to_string(),
        action_taken: ActorActionTaken::Accept,
        document: None,
    }
}
