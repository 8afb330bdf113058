use std::sync::Arc;

use approvals_model::{PageRequest, PagedResult, ProcessId, ProcessNodeResult, ValidationError};
use approvals_storage::ProcessNodeStore;
use tokio_util::sync::CancellationToken;

use crate::error::{ensure_active, ApprovalsError};

/// Reads the document metadata captured for processes.
pub struct ProcessNodeFacade {
    nodes: Arc<dyn ProcessNodeStore>,
}

impl ProcessNodeFacade {
    pub fn new(nodes: Arc<dyn ProcessNodeStore>) -> Self {
        Self { nodes }
    }

    /// Metadata for `process_ids`, one result per process that has any.
    pub async fn get(
        &self,
        process_ids: &[ProcessId],
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<ProcessNodeResult>, ApprovalsError> {
        ensure_active(cancel)?;
        let page = page.resolve()?;
        if process_ids.is_empty() {
            return Err(ValidationError::Required {
                field: "processIds",
            }
            .into());
        }
        ensure_active(cancel)?;
        self.nodes
            .get_by_process_ids(process_ids, page)
            .await
            .map_err(|e| {
                tracing::error!(?process_ids, error = %e, "process metadata lookup failed");
                e.into()
            })
    }
}
