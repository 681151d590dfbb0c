//! Detect generated instances that collide with an assignee's existing bookings.
//!
//! Intervals are half-open: an instance ending exactly when a booking starts
//! (or vice versa) is NOT a conflict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{AppointmentInstance, Booking};

/// One generated instance and every existing booking it overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult<B> {
    pub instance: AppointmentInstance,
    /// Never empty.
    pub conflicts: Vec<B>,
}

impl<B: Booking> ConflictResult<B> {
    /// Largest overlap, in minutes, between the instance and any of its conflicts.
    pub fn max_overlap_minutes(&self) -> i64 {
        self.conflicts
            .iter()
            .map(|booking| overlap_minutes(&self.instance, booking))
            .max()
            .unwrap_or(0)
    }
}

/// Two intervals overlap iff `a_start < b_end && a_end > b_start`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Overlap duration `min(a.end, b.end) - max(a.start, b.start)` in minutes,
/// or 0 when the two do not overlap.
pub fn overlap_minutes<A, B>(a: &A, b: &B) -> i64
where
    A: Booking + ?Sized,
    B: Booking + ?Sized,
{
    if !overlaps(a.start(), a.end(), b.start(), b.end()) {
        return 0;
    }
    let overlap_start = a.start().max(b.start());
    let overlap_end = a.end().min(b.end());
    (overlap_end - overlap_start).num_minutes()
}

/// Report which `instances` overlap an existing booking held by `assignee_id`.
///
/// Bookings for other assignees (or with no assignee) are ignored. Instances
/// without conflicts are left out, and results keep the order of `instances`.
/// An empty report is the normal "all clear" outcome.
pub fn check_conflicts<B>(
    instances: &[AppointmentInstance],
    existing: &[B],
    assignee_id: &str,
) -> Vec<ConflictResult<B>>
where
    B: Booking + Clone,
{
    let held: Vec<&B> = existing
        .iter()
        .filter(|booking| booking.assignee_id() == Some(assignee_id))
        .collect();

    let report: Vec<ConflictResult<B>> = instances
        .iter()
        .filter_map(|instance| {
            let conflicts: Vec<B> = held
                .iter()
                .filter(|booking| {
                    overlaps(instance.start, instance.end, booking.start(), booking.end())
                })
                .map(|booking| (*booking).clone())
                .collect();

            (!conflicts.is_empty()).then(|| ConflictResult {
                instance: instance.clone(),
                conflicts,
            })
        })
        .collect();

    debug!(
        assignee_id,
        instances = instances.len(),
        existing = held.len(),
        conflicting = report.len(),
        "checked recurrence for conflicts"
    );

    report
}

/// Drop every instance named in `report`, keeping the rest in order.
///
/// This is the "skip conflicting dates" choice offered after a conflict check.
/// Instances are matched on every field, so caller-built lists that repeat or
/// omit `occurrence` still drop only the instances that actually conflict.
pub fn without_conflicts<B>(
    instances: &[AppointmentInstance],
    report: &[ConflictResult<B>],
) -> Vec<AppointmentInstance> {
    instances
        .iter()
        .filter(|instance| !report.iter().any(|r| r.instance == **instance))
        .cloned()
        .collect()
}
