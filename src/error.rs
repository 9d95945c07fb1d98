use thiserror::Error;

/// Malformed input to the schedule calculator.
///
/// Every variant belongs to the invalid-argument class: the caller supplied
/// a value that cannot describe a schedule. Nothing here is transient, so
/// nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Interval of {0}h is not allowed (expected 4, 6, 8 or 12)")]
    InvalidInterval(u32),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid weekday index: {0} (expected 0..=6, Sunday = 0)")]
    InvalidWeekday(u8),
}

impl ScheduleError {
    /// API handlers map this class to a 4xx response.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidTime(_)
            | Self::InvalidDate(_)
            | Self::InvalidInterval(_)
            | Self::InvalidEnum { .. }
            | Self::InvalidWeekday(_) => true,
        }
    }
}

/// Failures of the command-line front end.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
}
