//! Collaborator contracts for the approvals core.
//!
//! The approvals core never talks to a database or to the legacy routing
//! endpoint directly; it goes through the traits defined here. An in-memory
//! backend implements all of them, and [`conformance`] checks any
//! `ProcessStore` against the behaviour the core relies on.

pub mod conformance;
mod error;
mod memory;
mod traits;

pub use error::StorageError;
pub use memory::{ActivityTemplate, DefinitionFixture, Fixture, InMemoryBackend};
pub use traits::{
    check_page, ActivityStore, DefinitionRole, LegacyRoutingService, NotificationLog,
    PersonIdentificationStore, ProcessNodeStore, ProcessStore, SecuritySource,
    TerminationNotification,
};
