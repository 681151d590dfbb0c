//! Error types for recurrence-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Configuration errors detected before any instance is emitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecurrenceError {
    #[error("Invalid frequency: {0} (must be a positive integer)")]
    InvalidFrequency(u32),

    #[error("Template ends before it starts: start {start}, end {end}")]
    NegativeDuration {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unknown recurrence pattern: {0} (expected daily, weekly or monthly)")]
    UnknownPattern(String),

    #[error("Unknown weekday: {0}")]
    UnknownWeekday(String),

    #[error("Unknown DST policy: {0} (expected skip, shift-forward or wall-clock)")]
    UnknownDstPolicy(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
