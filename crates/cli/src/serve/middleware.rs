//! Caller identity middleware.
//!
//! Authentication happens in the fronting proxy, which forwards the account
//! as `X-Remote-User: DOMAIN\username`. The account is resolved through the
//! person identification store and attached to the request as a [`Person`].

use std::sync::Arc;

use approvals_model::Person;
use approvals_storage::PersonIdentificationStore;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::state::AppState;

pub(crate) const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Prefix of service-account usernames that need no directory entry.
const SERVICE_ACCOUNT_PREFIX: &str = "msa";

/// Split `DOMAIN\username`, falling back to `default_domain`.
pub(crate) fn split_remote_user<'a>(
    remote_user: &'a str,
    default_domain: &'a str,
) -> (&'a str, &'a str) {
    match remote_user.split_once('\\') {
        Some((domain, username)) => (domain.trim(), username.trim()),
        None => (default_domain, remote_user.trim()),
    }
}

fn is_service_account(username: &str) -> bool {
    username
        .get(..SERVICE_ACCOUNT_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SERVICE_ACCOUNT_PREFIX))
}

pub(crate) async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // /health is exempt for load balancer checks
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let Some(remote_user) = request
        .headers()
        .get(REMOTE_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    else {
        return ApiError::new(StatusCode::UNAUTHORIZED, "authentication required")
            .into_response();
    };
    let (domain, username) = split_remote_user(remote_user, &state.default_domain);
    if username.is_empty() {
        return ApiError::new(StatusCode::UNAUTHORIZED, "authentication required")
            .into_response();
    }

    let person = match state
        .approvals
        .people
        .get_by_network_id(domain, username)
        .await
    {
        Ok(Some(found)) => Person::from(found),
        Ok(None) if is_service_account(username) => Person::network_only(domain, username),
        Ok(None) => {
            tracing::info!(domain, username, "unknown remote user");
            return ApiError::new(StatusCode::UNAUTHORIZED, "unknown user").into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    request.extensions_mut().insert(person);
    next.run(request).await
}
