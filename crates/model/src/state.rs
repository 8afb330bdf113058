//! Lifecycle vocabularies for processes, activities and actor actions.
//!
//! Each variant carries the display name used on the wire and in storage.
//! Parsing is case-insensitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ──────────────────────────────────────────────
// ProcessState
// ──────────────────────────────────────────────

/// State of an instantiated approval process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessState {
    /// Routed but not yet pending on any activity (stored as `NULL`).
    #[serde(rename = "NULL", alias = "NOT_YET_PENDING")]
    NotYetPending,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "TERMINATED")]
    Terminated,
}

impl ProcessState {
    pub const ALL: [ProcessState; 4] = [
        ProcessState::Approved,
        ProcessState::NotYetPending,
        ProcessState::Pending,
        ProcessState::Terminated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProcessState::NotYetPending => "NULL",
            ProcessState::Approved => "APPROVED",
            ProcessState::Pending => "PENDING",
            ProcessState::Terminated => "TERMINATED",
        }
    }

    /// Whether a terminate request must be refused in this state.
    pub fn is_final(self) -> bool {
        matches!(self, ProcessState::Approved | ProcessState::Terminated)
    }

    /// Only pending processes accept actor actions.
    pub fn accepts_actor_actions(self) -> bool {
        self == ProcessState::Pending
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProcessState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NULL" | "NOT_YET_PENDING" => Ok(ProcessState::NotYetPending),
            "APPROVED" => Ok(ProcessState::Approved),
            "PENDING" => Ok(ProcessState::Pending),
            "TERMINATED" => Ok(ProcessState::Terminated),
            _ => Err(ValidationError::UnknownState {
                kind: "process",
                name: s.to_string(),
            }),
        }
    }
}

// ──────────────────────────────────────────────
// ActivityState
// ──────────────────────────────────────────────

/// State of one activity (step) within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActivityState {
    /// Not reached yet, ghosted, or cleared by a termination (stored as `NULL`).
    #[serde(rename = "NULL")]
    NotYetPending,
    #[serde(rename = "COMPLETE")]
    Complete,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "PENDING ESCALATED")]
    Escalated,
}

impl ActivityState {
    /// States that carry actor rows. Actor-scoped searches default to these.
    pub const WITH_ACTORS: [ActivityState; 3] = [
        ActivityState::Complete,
        ActivityState::Escalated,
        ActivityState::Pending,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActivityState::NotYetPending => "NULL",
            ActivityState::Complete => "COMPLETE",
            ActivityState::Pending => "PENDING",
            ActivityState::Escalated => "PENDING ESCALATED",
        }
    }

    /// An actor action may only be applied while the activity is pending
    /// (plain or escalated).
    pub fn accepts_actor_actions(self) -> bool {
        !matches!(self, ActivityState::Complete | ActivityState::NotYetPending)
    }

    /// Whether a process termination clears this state back to `NULL`.
    pub fn is_pending(self) -> bool {
        matches!(self, ActivityState::Pending | ActivityState::Escalated)
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivityState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NULL" => Ok(ActivityState::NotYetPending),
            "COMPLETE" => Ok(ActivityState::Complete),
            "PENDING" => Ok(ActivityState::Pending),
            "PENDING ESCALATED" | "ESCALATED" => Ok(ActivityState::Escalated),
            _ => Err(ValidationError::UnknownState {
                kind: "activity",
                name: s.to_string(),
            }),
        }
    }
}

// ──────────────────────────────────────────────
// ActorActionTaken
// ──────────────────────────────────────────────

/// The decision an actor applies to a pending activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorActionTaken {
    Accept,
    Acknowledge,
    Reject,
}

impl ActorActionTaken {
    /// The activity status recorded once the action is applied.
    pub fn resulting_status(self) -> &'static str {
        match self {
            ActorActionTaken::Accept => "ACCEPTED",
            ActorActionTaken::Acknowledge => "ACKNOWLEDGED",
            ActorActionTaken::Reject => "REJECTED",
        }
    }
}

impl fmt::Display for ActorActionTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorActionTaken::Accept => "ACCEPT",
            ActorActionTaken::Acknowledge => "ACKNOWLEDGE",
            ActorActionTaken::Reject => "REJECT",
        };
        f.write_str(name)
    }
}
