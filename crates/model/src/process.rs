use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ValidationError;
use crate::routing::RoutingDocument;
use crate::state::{ActivityState, ActorActionTaken, ProcessState};

pub type ProcessId = i64;
pub type ActivityId = i64;

/// An instantiated approval process.
///
/// Loaded transiently per request; the approvals core never caches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub process_id: ProcessId,
    pub process_definition_id: i64,
    pub document_type_name: String,
    pub document_id: String,
    #[serde(default)]
    pub document_title: String,
    pub originator_hanford_id: String,
    pub beneficiary_hanford_id: String,
    pub process_state: ProcessState,
    #[serde(default)]
    pub process_status: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub create_date_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_change_date_time: OffsetDateTime,
    #[serde(default)]
    pub last_change_hanford_id: Option<String>,
    /// Activities keyed by activity id.
    #[serde(default)]
    pub activities: BTreeMap<ActivityId, Activity>,
}

impl Process {
    pub fn activity(&self, activity_id: ActivityId) -> Option<&Activity> {
        self.activities.get(&activity_id)
    }
}

/// One step of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity_id: ActivityId,
    #[serde(default)]
    pub process_id: ProcessId,
    pub activity_name: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub pending_date_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_change_date_time: Option<OffsetDateTime>,
    pub activity_state: ActivityState,
    /// `NULL | ACCEPTED | ACKNOWLEDGED | REJECTED` once acted upon.
    #[serde(default)]
    pub activity_status: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub acted_user_id: Option<String>,
    #[serde(default)]
    pub acted_hanford_id: Option<String>,
    #[serde(default)]
    pub acted_actor_id: Option<i64>,
    #[serde(default)]
    pub is_ghost: bool,
    #[serde(default)]
    pub is_adhoc: bool,
    /// Actor entitlements keyed by actor id. Ghosted activities have none.
    #[serde(default)]
    pub actors: BTreeMap<i64, Actor>,
}

impl Activity {
    /// True iff some actor record on this activity belongs to `hanford_id`.
    pub fn has_actor(&self, hanford_id: &str) -> bool {
        self.actors
            .values()
            .any(|actor| actor.actor_hanford_id == hanford_id)
    }
}

/// An entitlement tying one person to one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_id: i64,
    pub activity_id: ActivityId,
    #[serde(default)]
    pub actor_criteria_id: i64,
    pub actor_hanford_id: String,
    #[serde(default)]
    pub actor_type: String,
    /// The original actor when this entitlement is a delegation.
    #[serde(default)]
    pub delegator_hanford_id: Option<String>,
}

/// A request to apply an actor's decision to a pending activity.
///
/// Constructed per request, validated, forwarded to the legacy routing
/// service and then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorAction {
    pub process_id: ProcessId,
    pub activity_id: ActivityId,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub document_title: Option<String>,
    pub actor_hanford_id: String,
    pub action_taken: ActorActionTaken,
    #[serde(default)]
    pub document: Option<RoutingDocument>,
}

impl ActorAction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        if self.process_id < 1 {
            errors.push(ValidationError::Required { field: "ProcessId" });
        }
        if self.activity_id < 1 {
            errors.push(ValidationError::Required {
                field: "ActivityId",
            });
        }
        if self.actor_hanford_id.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: "ActorHanfordId",
            });
        }
        ValidationError::collect(errors)
    }
}

/// Outcome of a successful termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateProcessResponse {
    pub process_id: ProcessId,
    pub state: ProcessState,
    pub status: Option<String>,
}
