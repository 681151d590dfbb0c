//! # recurrence-engine
//!
//! Deterministic expansion of recurring field-service appointments, plus
//! conflict checking against an assignee's existing bookings.
//!
//! Both operations are pure: no I/O, no shared state, identical inputs give
//! identical outputs. Fetching existing bookings and persisting the generated
//! instances is up to the caller.
//!
//! ## Modules
//!
//! - [`expander`] — template + rule → bounded list of appointment instances
//! - [`conflict`] — detect instances overlapping an assignee's bookings
//! - [`rule`] — recurrence rules, weekday parsing, month-end policy
//! - [`dst`] — DST transition policies (skip, shift forward, wall clock)
//! - [`model`] — template, instance, and existing-booking shapes
//! - [`error`] — Error types

pub mod conflict;
pub mod dst;
pub mod error;
pub mod expander;
pub mod model;
pub mod rule;

pub use conflict::{check_conflicts, without_conflicts, ConflictResult};
pub use dst::DstPolicy;
pub use error::RecurrenceError;
pub use expander::{expand, expand_with_options, ExpandOptions, DEFAULT_CAP};
pub use model::{AppointmentInstance, AppointmentTemplate, Booking, ExistingAppointment, Location};
pub use rule::{Pattern, RecurrenceRule};
