//! Approvals domain model.
//!
//! Processes (instantiated approval chains), their activities (steps) and
//! the actors entitled to act on each step, plus the inputs the approvals
//! core accepts: actor actions, routing items, search filters and the
//! resolved caller identity. Process metadata nodes carry values extracted
//! from routed documents.
//!
//! This crate performs no I/O. Storage and routing collaborators live in
//! `approvals-storage`; the authorization and state-transition rules live in
//! `approvals-policy`.

mod error;
mod filter;
mod node;
mod paging;
mod person;
mod process;
mod routing;
mod state;

pub use error::ValidationError;
pub use filter::{DateRange, ProcessFilter};
pub use node::{group_nodes, Node, ProcessNode, ProcessNodeResult};
pub use paging::{Page, PageRequest, PagedResult, DEFAULT_LIMIT, MAX_LIMIT};
pub use person::{NetworkIdentity, Person, PersonIdentification};
pub use process::{
    Activity, ActivityId, Actor, ActorAction, Process, ProcessId, TerminateProcessResponse,
};
pub use routing::{RoutingDocument, RoutingItem, HANFORD_ID_LEN};
pub use state::{ActivityState, ActorActionTaken, ProcessState};
