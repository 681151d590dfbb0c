//! Recurrence rules and the calendar policy used to step through them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RecurrenceError, Result};

/// How far apart occurrences are, in units of `frequency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Pattern {
    Daily,
    Weekly,
    Monthly,
}

impl Pattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(RecurrenceError::UnknownPattern(s.to_string())),
        }
    }
}

impl TryFrom<String> for Pattern {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

/// What to do when adding months lands past the end of the target month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthEndPolicy {
    /// Jan 31 + 1 month = Feb 28 (or 29). Never spills into the following month.
    ClampToLastDay,
}

/// Month arithmetic used by the `monthly` pattern.
pub const MONTH_END_POLICY: MonthEndPolicy = MonthEndPolicy::ClampToLastDay;

impl MonthEndPolicy {
    /// Add `months` calendar months to `anchor`, keeping its time of day.
    /// Returns `None` when the result is outside chrono's representable range.
    pub fn add_months(self, anchor: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
        match self {
            // chrono clamps the day-of-month to the last valid day.
            Self::ClampToLastDay => anchor.checked_add_months(Months::new(months)),
        }
    }
}

fn default_frequency() -> u32 {
    1
}

/// Pattern, frequency, optional inclusive end date, and (weekly only) the
/// weekdays an occurrence may fall on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub pattern: Pattern,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    /// Last calendar date (in the expansion timezone) an occurrence may start on.
    #[serde(default, deserialize_with = "deserialize_end_date")]
    pub end_date: Option<NaiveDate>,
    /// Weekday names such as `"Monday"`, `"mon"` or `"MO"`. Empty means the
    /// template's own weekday, every `frequency` weeks.
    #[serde(default)]
    pub days_of_week: Vec<String>,
}

impl RecurrenceRule {
    pub fn new(pattern: Pattern, frequency: u32) -> Self {
        Self {
            pattern,
            frequency,
            end_date: None,
            days_of_week: Vec::new(),
        }
    }

    pub fn daily(frequency: u32) -> Self {
        Self::new(Pattern::Daily, frequency)
    }

    pub fn weekly(frequency: u32) -> Self {
        Self::new(Pattern::Weekly, frequency)
    }

    pub fn monthly(frequency: u32) -> Self {
        Self::new(Pattern::Monthly, frequency)
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn on_days<S: AsRef<str>>(mut self, days: &[S]) -> Self {
        self.days_of_week = days.iter().map(|d| d.as_ref().to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.frequency == 0 {
            return Err(RecurrenceError::InvalidFrequency(self.frequency));
        }
        self.selected_weekdays().map(|_| ())
    }

    /// Parsed weekday selection, deduplicated, in the order first given.
    /// Always empty for patterns other than `weekly`.
    pub fn selected_weekdays(&self) -> Result<Vec<Weekday>> {
        if self.pattern != Pattern::Weekly {
            return Ok(Vec::new());
        }
        let mut days = Vec::with_capacity(self.days_of_week.len());
        for name in &self.days_of_week {
            let day = parse_weekday(name)?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        Ok(days)
    }
}

/// Parse an English weekday name, case-insensitively. Accepts full names,
/// three-letter abbreviations and RFC 5545 two-letter codes.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" | "mo" => Ok(Weekday::Mon),
        "tuesday" | "tue" | "tues" | "tu" => Ok(Weekday::Tue),
        "wednesday" | "wed" | "we" => Ok(Weekday::Wed),
        "thursday" | "thu" | "thurs" | "th" => Ok(Weekday::Thu),
        "friday" | "fri" | "fr" => Ok(Weekday::Fri),
        "saturday" | "sat" | "sa" => Ok(Weekday::Sat),
        "sunday" | "sun" | "su" => Ok(Weekday::Sun),
        _ => Err(RecurrenceError::UnknownWeekday(name.to_string())),
    }
}

/// Parse an end date given as `YYYY-MM-DD` or as a full timestamp, in which
/// case only its calendar date is kept.
pub fn parse_end_date(s: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .map_err(|_| RecurrenceError::InvalidDateTime(s.to_string()))
}

fn deserialize_end_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_end_date(&s).map_err(serde::de::Error::custom))
        .transpose()
}
