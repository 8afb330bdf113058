//! `approvals serve` -- HTTP JSON API over the approvals facades.
//!
//! The backend is the in-memory store seeded from a JSON fixture. Callers
//! are identified by the `X-Remote-User` header set by the fronting proxy.
//!
//! Endpoints:
//! - GET  /health                              - Server status (no identity needed)
//! - GET  /process?ids=..                      - Processes by id
//! - POST /process                             - Route a new document
//! - POST /process/{id}/terminate              - Terminate a process
//! - GET  /process/filter?..                   - Search processes
//! - GET  /process/metadata?processIds=..      - Document metadata by process
//! - GET  /activity?ids=..                     - Activities by id
//! - POST /activity                            - Apply an actor action
//! - GET  /personidentification/{kind}?id=..   - Person lookups
//! - GET  /people/self                         - The resolved caller
//!
//! All responses use Content-Type: application/json.

mod error;
mod handlers;
mod middleware;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use approvals_policy::Approvals;
use approvals_storage::InMemoryBackend;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{
    handle_actor_action, handle_create_routing, handle_get_activities, handle_get_processes,
    handle_health, handle_not_found, handle_person_by_employee_id, handle_person_by_hanford_id,
    handle_person_by_id, handle_person_by_network_id, handle_process_metadata, handle_search,
    handle_self, handle_terminate,
};
use self::middleware::identity_middleware;
use self::state::AppState;

/// Maximum request body size: 10 MB. Routing items may carry documents.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

pub(crate) struct ServeConfig {
    pub port: u16,
    pub fixture: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub default_domain: String,
}

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

fn router(state: Arc<AppState>) -> Router {
    // CORS: permissive; the fronting proxy decides who reaches us
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/process", get(handle_get_processes).post(handle_create_routing))
        .route("/process/filter", get(handle_search))
        .route("/process/metadata", get(handle_process_metadata))
        .route("/process/{id}/terminate", post(handle_terminate))
        .route(
            "/activity",
            get(handle_get_activities).post(handle_actor_action),
        )
        .route(
            "/personidentification/hanfordid",
            get(handle_person_by_hanford_id),
        )
        .route(
            "/personidentification/employeeid",
            get(handle_person_by_employee_id),
        )
        .route("/personidentification/id", get(handle_person_by_id))
        .route(
            "/personidentification/networkid",
            get(handle_person_by_network_id),
        )
        .route("/people/self", get(handle_self))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Load the fixture, wire the facades and serve until Ctrl+C.
pub(crate) async fn start_server(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend = match &config.fixture {
        Some(path) => {
            let fixture = crate::fixture::load(path)?;
            for problem in crate::fixture::check(&fixture) {
                tracing::warn!(fixture = %path.display(), %problem, "fixture problem");
            }
            tracing::info!(
                fixture = %path.display(),
                definitions = fixture.definitions.len(),
                processes = fixture.processes.len(),
                people = fixture.people.len(),
                nodes = fixture.nodes.len(),
                "fixture loaded"
            );
            InMemoryBackend::from_fixture(fixture)
        }
        None => {
            tracing::warn!("no fixture given, starting with an empty backend");
            InMemoryBackend::new()
        }
    };

    let state = Arc::new(AppState {
        approvals: Approvals::new(Arc::new(backend), config.cache_ttl),
        default_domain: config.default_domain,
    });
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "approvals API listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
