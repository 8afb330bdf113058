//! Search strategy dispatcher.
//!
//! A caller searching for their own work is served by a narrower storage
//! query than a caller browsing. The first matching strategy wins:
//!
//! 1. **Actor**: the filter names exactly one actor, the caller.
//! 2. **Originator**: the filter names exactly one originator, the caller.
//! 3. **Beneficiary**: the filter names exactly one beneficiary, the caller.
//! 4. **User**: anything else, limited to the document types the caller
//!    may read.

use std::fmt;
use std::sync::Arc;

use approvals_model::{
    ActivityState, Page, PagedResult, Person, Process, ProcessFilter, ProcessState,
};
use approvals_storage::ProcessStore;
use tokio_util::sync::CancellationToken;

use crate::error::{ensure_active, ApprovalsError};
use crate::security::SecurityPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    Actor,
    Originator,
    Beneficiary,
    User,
}

impl SearchStrategy {
    pub fn name(self) -> &'static str {
        match self {
            SearchStrategy::Actor => "actor",
            SearchStrategy::Originator => "originator",
            SearchStrategy::Beneficiary => "beneficiary",
            SearchStrategy::User => "user",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the scoping strategy for `filter` as seen by `caller`.
pub fn select_strategy(filter: &ProcessFilter, caller: &Person) -> SearchStrategy {
    let is_caller = |id: Option<&str>| id.is_some_and(|id| caller.is(id));
    if is_caller(filter.single_actor()) {
        SearchStrategy::Actor
    } else if is_caller(filter.single_originator()) {
        SearchStrategy::Originator
    } else if is_caller(filter.single_beneficiary()) {
        SearchStrategy::Beneficiary
    } else {
        SearchStrategy::User
    }
}

pub struct SearchDispatcher {
    processes: Arc<dyn ProcessStore>,
    security: Arc<SecurityPolicy>,
}

impl SearchDispatcher {
    pub fn new(processes: Arc<dyn ProcessStore>, security: Arc<SecurityPolicy>) -> Self {
        Self {
            processes,
            security,
        }
    }

    /// Narrow `filter` for the caller's strategy and run the matching
    /// storage search.
    pub async fn search(
        &self,
        filter: ProcessFilter,
        caller: &Person,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Process>, ApprovalsError> {
        ensure_active(cancel)?;
        let strategy = select_strategy(&filter, caller);
        tracing::info!(
            user = ?caller.canonical_id(),
            network = ?caller.network_username(),
            strategy = %strategy,
            "process search"
        );

        let filter = self.narrow(filter, strategy, caller, cancel).await?;
        tracing::debug!(strategy = %strategy, filter = %filter, "search filter narrowed");

        ensure_active(cancel)?;
        let result = match strategy {
            SearchStrategy::Actor => self.processes.search_by_actor(&filter, page).await,
            // Beneficiary searches share the originator query.
            SearchStrategy::Originator | SearchStrategy::Beneficiary => {
                self.processes.search_by_originator(&filter, page).await
            }
            SearchStrategy::User => self.processes.search_by_user(&filter, page).await,
        };
        result.map_err(|e| {
            tracing::error!(strategy = %strategy, error = %e, "process search failed");
            e.into()
        })
    }

    async fn narrow(
        &self,
        mut filter: ProcessFilter,
        strategy: SearchStrategy,
        caller: &Person,
        cancel: &CancellationToken,
    ) -> Result<ProcessFilter, ApprovalsError> {
        if filter.process_states.is_empty() {
            filter.process_states = ProcessState::ALL.to_vec();
        }
        match strategy {
            SearchStrategy::Actor => {
                if filter.activity_states.is_empty() {
                    filter.activity_states = ActivityState::WITH_ACTORS.to_vec();
                }
            }
            SearchStrategy::Originator | SearchStrategy::Beneficiary => {}
            SearchStrategy::User => {
                ensure_active(cancel)?;
                let readable = self.security.read_document_types(caller).await?;
                let scoped = match filter.document_types.take() {
                    Some(requested) => requested
                        .into_iter()
                        .filter(|t| readable.contains(t))
                        .collect(),
                    None => readable.into_iter().collect(),
                };
                filter.document_types = Some(scoped);
            }
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> Person {
        Person {
            id: Some("1000001".to_string()),
            employee_id: Some("E1".to_string()),
            network: None,
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn single_actor_equal_to_caller_selects_actor() {
        let filter = ProcessFilter {
            actor_ids: ids(&["1000001"]),
            originator_ids: ids(&["1000001"]),
            ..ProcessFilter::default()
        };
        assert_eq!(select_strategy(&filter, &caller()), SearchStrategy::Actor);
    }

    #[test]
    fn actor_list_naming_someone_else_falls_through() {
        let filter = ProcessFilter {
            actor_ids: ids(&["1000009"]),
            originator_ids: ids(&["1000001"]),
            ..ProcessFilter::default()
        };
        assert_eq!(
            select_strategy(&filter, &caller()),
            SearchStrategy::Originator
        );
    }

    #[test]
    fn single_beneficiary_selects_beneficiary() {
        let filter = ProcessFilter {
            beneficiary_ids: ids(&["1000001"]),
            ..ProcessFilter::default()
        };
        assert_eq!(
            select_strategy(&filter, &caller()),
            SearchStrategy::Beneficiary
        );
    }

    #[test]
    fn multiple_ids_fall_back_to_user() {
        let filter = ProcessFilter {
            actor_ids: ids(&["1000001", "1000002"]),
            ..ProcessFilter::default()
        };
        assert_eq!(select_strategy(&filter, &caller()), SearchStrategy::User);
    }

    #[test]
    fn caller_without_id_always_gets_user_strategy() {
        let filter = ProcessFilter {
            actor_ids: ids(&[""]),
            ..ProcessFilter::default()
        };
        let service = Person::network_only("PNL", "msaActMan$");
        assert_eq!(select_strategy(&filter, &service), SearchStrategy::User);
    }

    #[test]
    fn selection_is_deterministic() {
        let filter = ProcessFilter {
            originator_ids: ids(&["1000001"]),
            beneficiary_ids: ids(&["1000001"]),
            ..ProcessFilter::default()
        };
        let first = select_strategy(&filter, &caller());
        for _ in 0..10 {
            assert_eq!(select_strategy(&filter, &caller()), first);
        }
    }
}
