//! Authorization and state-transition core of the approvals workflow API.
//!
//! Decides who may act on a pending activity, who may terminate a process
//! and which processes a caller may see, then delegates the actual reads
//! and writes to the collaborators in `approvals-storage`. Every operation
//! takes a [`CancellationToken`] checked at entry and before each
//! downstream call.

mod activity;
mod actor;
pub mod cache;
mod error;
mod metadata;
mod person;
mod process;
mod query;
mod search;
mod security;

use std::sync::Arc;
use std::time::Duration;

use approvals_storage::{
    ActivityStore, LegacyRoutingService, PersonIdentificationStore, ProcessNodeStore,
    ProcessStore, SecuritySource,
};
pub use tokio_util::sync::CancellationToken;

pub use activity::ActivityFacade;
pub use actor::is_valid_actor;
pub use cache::{LookupCache, TtlCache, DEFAULT_TTL};
pub use error::ApprovalsError;
pub use metadata::ProcessNodeFacade;
pub use person::{CachedPersonIdentificationStore, PersonKey};
pub use process::ProcessFacade;
pub use query::{generate_filter, FilterQuery};
pub use search::{select_strategy, SearchDispatcher, SearchStrategy};
pub use security::{
    SecurityPolicy, ACTIVITY_MANAGER_ACCOUNT, ACTIVITY_MANAGER_DOCUMENT_TYPES,
    ACTIVITY_MANAGER_TEST_ACCOUNT,
};

/// The facades wired to one set of collaborators.
pub struct Approvals {
    pub processes: ProcessFacade,
    pub activities: ActivityFacade,
    pub metadata: ProcessNodeFacade,
    pub security: Arc<SecurityPolicy>,
    pub people: Arc<CachedPersonIdentificationStore>,
}

impl Approvals {
    /// Wire every facade to `backend`, caching lookups for `ttl`.
    pub fn new<B>(backend: Arc<B>, ttl: Duration) -> Self
    where
        B: ProcessStore
            + ActivityStore
            + LegacyRoutingService
            + PersonIdentificationStore
            + ProcessNodeStore
            + SecuritySource,
    {
        let security = Arc::new(SecurityPolicy::new(
            backend.clone(),
            Arc::new(TtlCache::new(ttl)),
        ));
        let people = Arc::new(CachedPersonIdentificationStore::new(
            backend.clone(),
            Arc::new(TtlCache::new(ttl)),
        ));
        Self {
            processes: ProcessFacade::new(backend.clone(), backend.clone(), security.clone()),
            metadata: ProcessNodeFacade::new(backend.clone()),
            activities: ActivityFacade::new(
                backend.clone(),
                backend.clone(),
                backend,
                security.clone(),
            ),
            security,
            people,
        }
    }
}
