//! Appointment shapes consumed and produced by the expander and conflict checker.
//!
//! Field names serialize in camelCase so payloads from the scheduling UI
//! deserialize without a mapping layer.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RecurrenceError, Result};

/// Parse an ISO 8601 timestamp into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (with offset, e.g. "2025-01-06T09:00:00+01:00") and naive
/// local time (e.g. "2025-01-06T09:00:00"), which is interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .map_err(|_| RecurrenceError::InvalidDateTime(s.to_string()))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Where an appointment takes place. Every field is optional because jobs are
/// often booked before the site has been geocoded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// The shape of one occurrence before expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentTemplate {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "assignee_id", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl AppointmentTemplate {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
            description: None,
            assignee_id: None,
            location: None,
        }
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// `end - start`, carried unchanged onto every generated instance.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(RecurrenceError::NegativeDuration {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub(crate) fn instantiate(
        &self,
        occurrence: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppointmentInstance {
        AppointmentInstance {
            occurrence,
            start,
            end,
            title: self.title.clone(),
            description: self.description.clone(),
            assignee_id: self.assignee_id.clone(),
            location: self.location.clone(),
        }
    }
}

/// One materialized occurrence of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInstance {
    /// 0-based position of this instance within its expanded series.
    #[serde(default)]
    pub occurrence: usize,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "assignee_id", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Anything that occupies an assignee's time.
///
/// The conflict checker only needs these three accessors, so callers can pass
/// their own appointment records without converting them first.
pub trait Booking {
    fn assignee_id(&self) -> Option<&str>;
    fn start(&self) -> DateTime<Utc>;
    fn end(&self) -> DateTime<Utc>;
}

impl Booking for AppointmentInstance {
    fn assignee_id(&self) -> Option<&str> {
        self.assignee_id.as_deref()
    }

    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A pre-existing appointment as loaded from the bookings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAppointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "assignee_id", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ExistingAppointment {
    pub fn new(assignee_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: None,
            assignee_id: Some(assignee_id.into()),
            start,
            end,
            title: None,
        }
    }
}

impl Booking for ExistingAppointment {
    fn assignee_id(&self) -> Option<&str> {
        self.assignee_id.as_deref()
    }

    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
