//! Shared application state.

use approvals_policy::Approvals;

pub(crate) struct AppState {
    /// Facades wired to the in-memory backend.
    pub(crate) approvals: Approvals,
    /// Domain for `X-Remote-User` values without a `DOMAIN\` prefix.
    pub(crate) default_domain: String,
}
