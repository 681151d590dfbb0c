//! DST transition policies for recurring appointments.
//!
//! Occurrences are stepped in local wall time, so a cursor can land on a local
//! time that occurs twice (fall back) or not at all (spring forward). The policy
//! decides which UTC instant, if any, such a cursor becomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// Longest DST gap we search across when shifting forward.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Policy for handling occurrences that fall during DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DstPolicy {
    /// Skip instances that fall in the DST gap (e.g., 2:30 AM during spring forward)
    Skip,
    /// Shift to the first valid local time after the gap
    ShiftForward,
    /// Keep the wall-clock time, read with the UTC offset in force before the gap
    #[default]
    WallClock,
}

impl DstPolicy {
    /// Resolve a local wall time in `tz` to a UTC instant.
    ///
    /// Ambiguous times always resolve to the earlier instant. `None` only
    /// happens for [`DstPolicy::Skip`] on a nonexistent local time.
    pub fn resolve(self, tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        if let Some(dt) = tz.from_local_datetime(&local).earliest() {
            return Some(dt.with_timezone(&Utc));
        }
        match self {
            Self::Skip => None,
            Self::ShiftForward => (1..=MAX_GAP_MINUTES)
                .filter_map(|m| local.checked_add_signed(Duration::minutes(m)))
                .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
                .map(|dt| dt.with_timezone(&Utc)),
            Self::WallClock => {
                // A day back is safely before the transition.
                let before = local.checked_sub_signed(Duration::days(1))?;
                let offset = tz.offset_from_utc_datetime(&before).fix();
                let utc = local.checked_sub_signed(Duration::seconds(
                    offset.local_minus_utc() as i64,
                ))?;
                Some(Utc.from_utc_datetime(&utc))
            }
        }
    }
}

impl fmt::Display for DstPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::ShiftForward => "shift-forward",
            Self::WallClock => "wall-clock",
        })
    }
}

impl FromStr for DstPolicy {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "shift-forward" | "shift_forward" => Ok(Self::ShiftForward),
            "wall-clock" | "wall_clock" => Ok(Self::WallClock),
            _ => Err(RecurrenceError::UnknownDstPolicy(s.to_string())),
        }
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| RecurrenceError::InvalidTimezone(name.to_string()))
}
