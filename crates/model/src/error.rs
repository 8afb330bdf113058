/// Field-level validation failures on approvals inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required!")]
    Required { field: &'static str },

    /// A Hanford id field does not have the fixed site length.
    #[error("{field}: a Hanford Id must be {expected} characters")]
    HanfordIdLength {
        field: &'static str,
        expected: usize,
    },

    /// The requested page size exceeds the maximum.
    #[error("limit must be less than or equal to {max}, got {limit}")]
    LimitTooLarge { limit: u32, max: u32 },

    /// A date range whose end precedes its start.
    #[error("end date {end} must be greater than or equal to start date {start}")]
    InvertedDateRange { start: String, end: String },

    /// A day-count range must cover at least one day.
    #[error("a day range must cover at least one day, got {days}")]
    EmptyDayRange { days: i64 },

    /// A day-count range reaching past the earliest representable date.
    #[error("a day range of {days} days reaches too far back")]
    DayRangeTooLong { days: i64 },

    /// A lifecycle state name that is not part of the vocabulary.
    #[error("unknown {kind} state '{name}'")]
    UnknownState { kind: &'static str, name: String },

    /// Several field-level failures reported together.
    #[error("{}", join_messages(.0))]
    Multiple(Vec<ValidationError>),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Collapse a list of failures into a single error, or `Ok` if empty.
    pub fn collect(mut errors: Vec<ValidationError>) -> Result<(), ValidationError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}
