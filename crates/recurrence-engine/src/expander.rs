//! Recurrence expansion -- turns an appointment template and a recurrence rule
//! into a bounded list of concrete appointment instances.
//!
//! Stepping happens in the local wall time of the expansion timezone, so an
//! appointment booked for 09:00 stays at 09:00 across DST changes. Each local
//! cursor is then resolved to UTC through the configured [`DstPolicy`], and the
//! template's duration is added in absolute time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dst::{parse_timezone, DstPolicy};
use crate::error::Result;
use crate::model::{AppointmentInstance, AppointmentTemplate};
use crate::rule::{Pattern, RecurrenceRule, MONTH_END_POLICY};

/// Instances produced when the caller does not choose a cap: one year of weeklies.
pub const DEFAULT_CAP: usize = 52;

/// Knobs for a single expansion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpandOptions {
    /// Maximum number of instances to produce.
    pub cap: usize,
    /// Timezone whose calendar drives day/week/month stepping and end-date checks.
    pub timezone: Tz,
    pub dst_policy: DstPolicy,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            timezone: chrono_tz::UTC,
            dst_policy: DstPolicy::default(),
        }
    }
}

impl ExpandOptions {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    /// Use the named IANA timezone for calendar arithmetic.
    pub fn in_timezone(mut self, timezone: &str) -> Result<Self> {
        self.timezone = parse_timezone(timezone)?;
        Ok(self)
    }

    pub fn with_dst_policy(mut self, dst_policy: DstPolicy) -> Self {
        self.dst_policy = dst_policy;
        self
    }
}

/// Expand `template` according to `rule`, producing at most `cap` instances.
///
/// Calendar arithmetic is done in UTC. Use [`expand_with_options`] to step in
/// another timezone.
///
/// # Errors
/// Returns `RecurrenceError::InvalidFrequency` if `rule.frequency` is 0.
/// Returns `RecurrenceError::NegativeDuration` if the template ends before it starts.
/// Returns `RecurrenceError::UnknownWeekday` if a weekly selection names no weekday.
pub fn expand(
    template: &AppointmentTemplate,
    rule: &RecurrenceRule,
    cap: usize,
) -> Result<Vec<AppointmentInstance>> {
    expand_with_options(template, rule, &ExpandOptions::with_cap(cap))
}

/// Expand `template` according to `rule` with explicit timezone, DST policy and cap.
///
/// A cap of 0 returns an empty list without looking at the template or rule.
pub fn expand_with_options(
    template: &AppointmentTemplate,
    rule: &RecurrenceRule,
    options: &ExpandOptions,
) -> Result<Vec<AppointmentInstance>> {
    // Short-circuit: caller explicitly wants zero instances.
    if options.cap == 0 {
        return Ok(Vec::new());
    }

    let instances: Vec<AppointmentInstance> =
        occurrences(template, rule, options.timezone, options.dst_policy)?
            .take(options.cap)
            .collect();

    debug!(
        pattern = %rule.pattern,
        frequency = rule.frequency,
        count = instances.len(),
        cap = options.cap,
        capped = instances.len() == options.cap,
        "expanded recurrence"
    );

    Ok(instances)
}

/// Lazily walk the occurrences of `template` under `rule`.
///
/// The iterator ends on its own only when the rule has an end date; otherwise
/// it must be bounded by the caller (e.g. with `.take(cap)`).
pub fn occurrences<'a>(
    template: &'a AppointmentTemplate,
    rule: &RecurrenceRule,
    timezone: Tz,
    dst_policy: DstPolicy,
) -> Result<Occurrences<'a>> {
    template.validate()?;
    rule.validate()?;

    let anchor = template.start.with_timezone(&timezone).naive_local();
    let schedule = Schedule {
        pattern: rule.pattern,
        frequency: rule.frequency,
        end_date: rule.end_date,
        weekdays: rule.selected_weekdays()?,
        anchor,
    };

    Ok(Occurrences {
        template,
        duration: template.duration(),
        schedule,
        timezone,
        dst_policy,
        cursor: Some(Cursor::start(anchor)),
        emitted: 0,
    })
}

/// Position of the expansion in local wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    local: NaiveDateTime,
    /// Calendar months between the anchor and `local` (monthly pattern only).
    months: u32,
}

impl Cursor {
    fn start(anchor: NaiveDateTime) -> Self {
        Self {
            local: anchor,
            months: 0,
        }
    }

    fn at(self, local: NaiveDateTime) -> Self {
        Self { local, ..self }
    }
}

/// A validated rule pinned to the template's local start.
#[derive(Debug, Clone)]
struct Schedule {
    pattern: Pattern,
    frequency: u32,
    end_date: Option<NaiveDate>,
    weekdays: Vec<Weekday>,
    anchor: NaiveDateTime,
}

impl Schedule {
    fn is_past_end(&self, cursor: &Cursor) -> bool {
        self.end_date
            .is_some_and(|end_date| cursor.local.date() > end_date)
    }

    /// False only for weekly rules with a weekday selection that excludes the cursor's day.
    fn accepts(&self, cursor: &Cursor) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&cursor.local.weekday())
    }

    fn skip_day(&self, cursor: Cursor) -> Option<Cursor> {
        add_days(cursor.local, 1).map(|local| cursor.at(local))
    }

    /// `frequency` whole weeks after `cursor`.
    fn weeks_after(&self, cursor: Cursor) -> Option<Cursor> {
        add_days(cursor.local, 7 * i64::from(self.frequency)).map(|local| cursor.at(local))
    }

    /// The candidate after an emitted occurrence. `None` once the calendar
    /// runs out of representable dates.
    fn next(&self, cursor: Cursor) -> Option<Cursor> {
        let frequency = i64::from(self.frequency);
        match self.pattern {
            Pattern::Daily => add_days(cursor.local, frequency).map(|local| cursor.at(local)),
            Pattern::Weekly if self.weekdays.is_empty() => self.weeks_after(cursor),
            Pattern::Weekly => {
                // The scan only comes up empty at the end of the calendar: the
                // cursor's own weekday comes round again at +7.
                let scanned = (1..=7)
                    .filter_map(|d| add_days(cursor.local, d))
                    .find(|candidate| self.weekdays.contains(&candidate.weekday()));
                match scanned {
                    Some(local) => Some(cursor.at(local)),
                    None => self.weeks_after(cursor),
                }
            }
            Pattern::Monthly => {
                let months = cursor.months.checked_add(self.frequency)?;
                // Anchored on the template's day-of-month so a clamp to Feb 28
                // does not pull March back to the 28th.
                let local = MONTH_END_POLICY.add_months(self.anchor, months)?;
                Some(Cursor { local, months })
            }
        }
    }
}

fn add_days(local: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    local.checked_add_signed(Duration::days(days))
}

/// Iterator over the instances of one recurring appointment.
///
/// Created by [`occurrences`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    template: &'a AppointmentTemplate,
    duration: Duration,
    schedule: Schedule,
    timezone: Tz,
    dst_policy: DstPolicy,
    cursor: Option<Cursor>,
    emitted: usize,
}

impl Occurrences<'_> {
    fn instance_at(&self, start: DateTime<Utc>) -> Option<AppointmentInstance> {
        let end = start.checked_add_signed(self.duration)?;
        Some(self.template.instantiate(self.emitted, start, end))
    }
}

impl Iterator for Occurrences<'_> {
    type Item = AppointmentInstance;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.cursor?;

            if self.schedule.is_past_end(&cursor) {
                self.cursor = None;
                return None;
            }

            if !self.schedule.accepts(&cursor) {
                self.cursor = self.schedule.skip_day(cursor);
                continue;
            }

            self.cursor = self.schedule.next(cursor);

            let Some(start) = self.dst_policy.resolve(&self.timezone, cursor.local) else {
                trace!(local = %cursor.local, timezone = %self.timezone, "skipped occurrence in DST gap");
                continue;
            };

            let Some(instance) = self.instance_at(start) else {
                self.cursor = None;
                return None;
            };
            self.emitted += 1;
            return Some(instance);
        }
    }
}
