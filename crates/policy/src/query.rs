use approvals_model::{ActivityState, DateRange, ProcessFilter, ProcessState, ValidationError};
use time::{Date, OffsetDateTime};

/// Raw search parameters as they arrive from a caller.
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    pub actor_ids: Vec<String>,
    pub originator_ids: Vec<String>,
    pub beneficiary_ids: Vec<String>,
    pub activity_states: Vec<String>,
    pub process_states: Vec<String>,
    pub document_types: Vec<String>,
    pub create_start: Option<OffsetDateTime>,
    pub create_end: Option<OffsetDateTime>,
    pub create_days: Option<i64>,
    pub last_start: Option<OffsetDateTime>,
    pub last_end: Option<OffsetDateTime>,
    pub last_days: Option<i64>,
}

/// Build a [`ProcessFilter`] from raw parameters.
///
/// Empty lists stay unspecified. State names are matched without regard to
/// case; unknown names and `NULL` activity states are skipped. A date range
/// comes from an explicit start and end, otherwise from a day count ending
/// `today`.
pub fn generate_filter(query: &FilterQuery, today: Date) -> Result<ProcessFilter, ValidationError> {
    let activity_states = query
        .activity_states
        .iter()
        .filter_map(|name| name.parse::<ActivityState>().ok())
        .filter(|state| ActivityState::WITH_ACTORS.contains(state))
        .collect();
    let process_states = query
        .process_states
        .iter()
        .filter_map(|name| name.parse::<ProcessState>().ok())
        .collect();

    Ok(ProcessFilter {
        actor_ids: cleaned(&query.actor_ids),
        originator_ids: cleaned(&query.originator_ids),
        beneficiary_ids: cleaned(&query.beneficiary_ids),
        activity_states,
        process_states,
        document_types: Some(cleaned(&query.document_types)).filter(|types| !types.is_empty()),
        create_date: range(query.create_start, query.create_end, query.create_days, today)?,
        last_change_date: range(query.last_start, query.last_end, query.last_days, today)?,
    })
}

fn cleaned(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn range(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    days: Option<i64>,
    today: Date,
) -> Result<Option<DateRange>, ValidationError> {
    match (start, end, days) {
        (Some(start), Some(end), _) => DateRange::new(start, end).map(Some),
        (_, _, Some(days)) => DateRange::last_days(days, today).map(Some),
        _ => Ok(None),
    }
}
