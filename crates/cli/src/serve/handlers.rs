//! HTTP route handlers over the process, activity and person facades.

use std::sync::Arc;

use approvals_model::{
    Activity, ActorAction, PageRequest, PagedResult, Person, PersonIdentification, Process,
    ProcessNodeResult, RoutingItem, TerminateProcessResponse,
};
use approvals_policy::{CancellationToken, FilterQuery};
use approvals_storage::PersonIdentificationStore;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::error::ApiError;
use super::json_error;
use super::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

// ── Query parameters ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IdsQuery {
    ids: Option<String>,
    offset: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetadataQuery {
    process_ids: Option<String>,
    offset: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TerminateQuery {
    #[serde(default)]
    terminate_no_statusing: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterParams {
    actor_ids: Option<String>,
    originator_ids: Option<String>,
    beneficiary_ids: Option<String>,
    activity_states: Option<String>,
    process_states: Option<String>,
    doc_types: Option<String>,
    create_start: Option<String>,
    create_end: Option<String>,
    create_days: Option<i64>,
    last_start: Option<String>,
    last_end: Option<String>,
    last_days: Option<i64>,
    offset: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonQuery {
    id: Option<String>,
    domain: Option<String>,
}

/// Split a comma-separated parameter, dropping blanks.
pub(crate) fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_ids(value: Option<&str>) -> Result<Vec<i64>, ApiError> {
    split_list(value)
        .iter()
        .map(|id| {
            id.parse::<i64>()
                .map_err(|_| ApiError::bad_request(format!("'{id}' is not a valid id")))
        })
        .collect()
}

fn parse_time(name: &str, value: Option<&str>) -> Result<Option<OffsetDateTime>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            OffsetDateTime::parse(v.trim(), &Rfc3339).map_err(|e| {
                ApiError::bad_request(format!("{name} is not an RFC 3339 timestamp: {e}"))
            })
        })
        .transpose()
}

impl FilterParams {
    pub(crate) fn to_query(&self) -> Result<FilterQuery, ApiError> {
        Ok(FilterQuery {
            actor_ids: split_list(self.actor_ids.as_deref()),
            originator_ids: split_list(self.originator_ids.as_deref()),
            beneficiary_ids: split_list(self.beneficiary_ids.as_deref()),
            activity_states: split_list(self.activity_states.as_deref()),
            process_states: split_list(self.process_states.as_deref()),
            document_types: split_list(self.doc_types.as_deref()),
            create_start: parse_time("createStart", self.create_start.as_deref())?,
            create_end: parse_time("createEnd", self.create_end.as_deref())?,
            create_days: self.create_days,
            last_start: parse_time("lastStart", self.last_start.as_deref())?,
            last_end: parse_time("lastEnd", self.last_end.as_deref())?,
            last_days: self.last_days,
        })
    }
}

fn required_id(query: &PersonQuery) -> Result<&str, ApiError> {
    query
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("id is required"))
}

fn found(
    person: Option<PersonIdentification>,
    id: &str,
) -> Result<Json<PersonIdentification>, ApiError> {
    person
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("person '{id}' not found")))
}

// ── Processes ────────────────────────────────────────────────────────────────

/// GET /process?ids=1,2&offset=&limit=
pub(crate) async fn handle_get_processes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdsQuery>,
) -> ApiResult<PagedResult<Process>> {
    let ids = parse_ids(query.ids.as_deref())?;
    let page = PageRequest::new(query.offset, query.limit);
    let cancel = CancellationToken::new();
    let result = state.approvals.processes.get(&ids, page, &cancel).await?;
    Ok(Json(result))
}

/// POST /process
pub(crate) async fn handle_create_routing(
    State(state): State<Arc<AppState>>,
    Json(item): Json<RoutingItem>,
) -> ApiResult<Process> {
    let cancel = CancellationToken::new();
    let process = state
        .approvals
        .processes
        .create_routing(&item, &cancel)
        .await?;
    Ok(Json(process))
}

/// POST /process/{id}/terminate?terminateNoStatusing=false
pub(crate) async fn handle_terminate(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Person>,
    Path(process_id): Path<i64>,
    Query(query): Query<TerminateQuery>,
) -> ApiResult<TerminateProcessResponse> {
    let cancel = CancellationToken::new();
    let response = state
        .approvals
        .processes
        .terminate(process_id, query.terminate_no_statusing, &caller, &cancel)
        .await?;
    Ok(Json(response))
}

/// GET /process/metadata?processIds=1,2&offset=&limit=
pub(crate) async fn handle_process_metadata(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetadataQuery>,
) -> ApiResult<PagedResult<ProcessNodeResult>> {
    let ids = parse_ids(query.process_ids.as_deref())?;
    let page = PageRequest::new(query.offset, query.limit);
    let cancel = CancellationToken::new();
    let result = state.approvals.metadata.get(&ids, page, &cancel).await?;
    Ok(Json(result))
}

/// GET /process/filter?actorIds=..&processStates=..&lastDays=..
pub(crate) async fn handle_search(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Person>,
    Query(params): Query<FilterParams>,
) -> ApiResult<PagedResult<Process>> {
    let filter = state
        .approvals
        .processes
        .generate_filter(&params.to_query()?)?;
    let page = PageRequest::new(params.offset, params.limit);
    let cancel = CancellationToken::new();
    let result = state
        .approvals
        .processes
        .search(filter, &caller, page, &cancel)
        .await?;
    Ok(Json(result))
}

// ── Activities ───────────────────────────────────────────────────────────────

/// GET /activity?ids=..
pub(crate) async fn handle_get_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdsQuery>,
) -> ApiResult<PagedResult<Activity>> {
    let ids = parse_ids(query.ids.as_deref())?;
    let page = PageRequest::new(query.offset, query.limit);
    let cancel = CancellationToken::new();
    let result = state.approvals.activities.get(&ids, page, &cancel).await?;
    Ok(Json(result))
}

/// POST /activity
pub(crate) async fn handle_actor_action(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Person>,
    Json(action): Json<ActorAction>,
) -> ApiResult<Process> {
    let cancel = CancellationToken::new();
    let process = state
        .approvals
        .activities
        .apply_actor_action(&action, &caller, &cancel)
        .await?;
    Ok(Json(process))
}

// ── People ───────────────────────────────────────────────────────────────────

/// GET /personidentification/hanfordid?id=..
pub(crate) async fn handle_person_by_hanford_id(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonQuery>,
) -> ApiResult<PersonIdentification> {
    let id = required_id(&query)?;
    found(state.approvals.people.get_by_hanford_id(id).await?, id)
}

/// GET /personidentification/employeeid?id=..
pub(crate) async fn handle_person_by_employee_id(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonQuery>,
) -> ApiResult<PersonIdentification> {
    let id = required_id(&query)?;
    found(state.approvals.people.get_by_employee_id(id).await?, id)
}

/// GET /personidentification/id?id=..
pub(crate) async fn handle_person_by_id(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonQuery>,
) -> ApiResult<PersonIdentification> {
    let id = required_id(&query)?;
    found(state.approvals.people.get_by_id(id).await?, id)
}

/// GET /personidentification/networkid?domain=..&id=..
pub(crate) async fn handle_person_by_network_id(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonQuery>,
) -> ApiResult<PersonIdentification> {
    let id = required_id(&query)?;
    let domain = query.domain.as_deref().unwrap_or(state.default_domain.as_str());
    found(
        state.approvals.people.get_by_network_id(domain, id).await?,
        id,
    )
}

/// GET /people/self
pub(crate) async fn handle_self(Extension(caller): Extension<Person>) -> Json<Person> {
    Json(caller)
}
