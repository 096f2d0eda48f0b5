//! Builds the `"HH:MM - HH:MM"` label for a task's time field.

use chrono::{NaiveTime, TimeDelta};

/// Longest slot accepted, in minutes.
pub const MAX_SLOT_MINUTES: u32 = 24 * 60;

/// Why a slot could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// No start time given.
    #[error("missing start time")]
    MissingStart,
    /// No duration given.
    #[error("missing duration")]
    MissingDuration,
    /// Start time is not `HH:MM`.
    #[error("invalid start time: {0:?}")]
    InvalidStart(String),
    /// Duration is not a whole number of minutes between 1 and a day.
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
}

impl SlotError {
    /// Text shown to the user.
    #[must_use]
    pub const fn notice(&self) -> &'static str {
        "Select start time & duration"
    }
}

/// Format a slot starting at `start` (`HH:MM`) lasting `minutes`.
///
/// The end wraps past midnight: `23:30` plus 60 gives `23:30 - 00:30`.
///
/// # Errors
///
/// Returns [`SlotError`] when either input is blank or malformed.
pub fn format_slot(start: &str, minutes: &str) -> Result<String, SlotError> {
    let start = start.trim();
    let minutes = minutes.trim();
    if start.is_empty() {
        return Err(SlotError::MissingStart);
    }
    if minutes.is_empty() {
        return Err(SlotError::MissingDuration);
    }
    let begin = NaiveTime::parse_from_str(start, "%H:%M")
        .map_err(|_| SlotError::InvalidStart(start.to_string()))?;
    let length = minutes
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=MAX_SLOT_MINUTES).contains(m))
        .ok_or_else(|| SlotError::InvalidDuration(minutes.to_string()))?;
    let end = begin + TimeDelta::minutes(i64::from(length));
    Ok(format!("{} - {}", begin.format("%H:%M"), end.format("%H:%M")))
}
