use std::fmt;

use serde::{Deserialize, Serialize};
use time::macros::time;
use time::{Date, Duration, OffsetDateTime, Time};

use crate::error::ValidationError;
use crate::state::{ActivityState, ProcessState};

const END_OF_DAY: Time = time!(23:59:59.999);
const SECONDS_PER_DAY: i64 = 86_400;

/// An inclusive date-time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl DateRange {
    /// Build a range from explicit bounds.
    ///
    /// An end at exactly midnight is read as a whole day and extended to the
    /// last millisecond of that day.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, ValidationError> {
        let end = if end.time() == Time::MIDNIGHT {
            end.replace_time(END_OF_DAY)
        } else {
            end
        };
        if end < start {
            return Err(ValidationError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `days` whole days ending with `today`, in UTC.
    pub fn last_days(days: i64, today: Date) -> Result<Self, ValidationError> {
        if days < 1 {
            return Err(ValidationError::EmptyDayRange { days });
        }
        let first = (days - 1)
            .checked_mul(SECONDS_PER_DAY)
            .map(Duration::seconds)
            .and_then(|span| today.checked_sub(span))
            .ok_or(ValidationError::DayRangeTooLong { days })?;
        Ok(Self {
            start: first.midnight().assume_utc(),
            end: today.with_time(END_OF_DAY).assume_utc(),
        })
    }

    /// Number of calendar days touched by the range.
    pub fn days(&self) -> i64 {
        (self.end.date() - self.start.date()).whole_days() + 1
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A process search query.
///
/// Empty id and state lists mean "unspecified". `document_types` is
/// different: `None` is unspecified while `Some(vec![])` matches nothing,
/// which is what an empty readable-type intersection must produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFilter {
    #[serde(default)]
    pub actor_ids: Vec<String>,
    #[serde(default)]
    pub originator_ids: Vec<String>,
    #[serde(default)]
    pub beneficiary_ids: Vec<String>,
    #[serde(default)]
    pub activity_states: Vec<ActivityState>,
    #[serde(default)]
    pub process_states: Vec<ProcessState>,
    #[serde(default)]
    pub document_types: Option<Vec<String>>,
    #[serde(default)]
    pub create_date: Option<DateRange>,
    #[serde(default)]
    pub last_change_date: Option<DateRange>,
}

impl ProcessFilter {
    pub fn single_actor(&self) -> Option<&str> {
        single(&self.actor_ids)
    }

    pub fn single_originator(&self) -> Option<&str> {
        single(&self.originator_ids)
    }

    pub fn single_beneficiary(&self) -> Option<&str> {
        single(&self.beneficiary_ids)
    }

    /// Process states to search, defaulting to every state.
    pub fn effective_process_states(&self) -> Vec<ProcessState> {
        if self.process_states.is_empty() {
            ProcessState::ALL.to_vec()
        } else {
            self.process_states.clone()
        }
    }

    /// Whether a process passes every process-level criterion.
    ///
    /// Actor and activity-state criteria depend on the search strategy and
    /// are left to the store.
    pub fn matches_process(&self, process: &crate::Process) -> bool {
        let ids_match = |ids: &[String], id: &str| ids.is_empty() || ids.iter().any(|i| i == id);
        ids_match(&self.originator_ids, &process.originator_hanford_id)
            && ids_match(&self.beneficiary_ids, &process.beneficiary_hanford_id)
            && self
                .effective_process_states()
                .contains(&process.process_state)
            && self
                .document_types
                .as_ref()
                .map_or(true, |types| types.contains(&process.document_type_name))
            && self
                .create_date
                .map_or(true, |r| r.contains(process.create_date_time))
            && self
                .last_change_date
                .map_or(true, |r| r.contains(process.last_change_date_time))
    }
}

fn single(ids: &[String]) -> Option<&str> {
    match ids {
        [only] => Some(only.as_str()),
        _ => None,
    }
}

impl fmt::Display for ProcessFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}
