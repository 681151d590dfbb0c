//! WASM bindings for recurrence-engine.
//!
//! Exposes appointment expansion and conflict checking to the scheduling UI via
//! `wasm-bindgen`. All complex types are passed as JSON strings using the same
//! camelCase shapes the UI already sends to the database.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p recurrence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/recurrence-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/recurrence_engine_wasm.wasm
//! # Rename .js -> .cjs for ESM compatibility
//! mv packages/recurrence-engine-js/wasm/recurrence_engine_wasm.js \
//!    packages/recurrence-engine-js/wasm/recurrence_engine_wasm.cjs
//! ```

use recurrence_engine::{
    AppointmentInstance, AppointmentTemplate, DstPolicy, ExistingAppointment, ExpandOptions,
    RecurrenceRule,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// JSON plumbing (kept free of JsValue so it can be tested natively)
// ---------------------------------------------------------------------------

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn build_options(
    cap: Option<u32>,
    timezone: Option<&str>,
    dst_policy: Option<&str>,
) -> Result<ExpandOptions, String> {
    let mut options = ExpandOptions::default();
    if let Some(cap) = cap {
        options.cap = cap as usize;
    }
    if let Some(tz) = timezone {
        options = options.in_timezone(tz).map_err(|e| e.to_string())?;
    }
    if let Some(policy) = dst_policy {
        let policy = policy.parse::<DstPolicy>().map_err(|e| e.to_string())?;
        options = options.with_dst_policy(policy);
    }
    Ok(options)
}

fn expand_json(
    template_json: &str,
    rule_json: &str,
    options: &ExpandOptions,
) -> Result<String, String> {
    let template: AppointmentTemplate = from_json(template_json, "template")?;
    let rule: RecurrenceRule = from_json(rule_json, "rule")?;
    let instances = recurrence_engine::expand_with_options(&template, &rule, options)
        .map_err(|e| e.to_string())?;
    to_json(&instances)
}

fn check_conflicts_json(
    instances_json: &str,
    existing_json: &str,
    assignee_id: &str,
) -> Result<String, String> {
    let instances: Vec<AppointmentInstance> = from_json(instances_json, "instances")?;
    let existing: Vec<ExistingAppointment> = from_json(existing_json, "existing appointments")?;
    let report = recurrence_engine::check_conflicts(&instances, &existing, assignee_id);
    to_json(&report)
}

fn without_conflicts_json(
    instances_json: &str,
    existing_json: &str,
    assignee_id: &str,
) -> Result<String, String> {
    let instances: Vec<AppointmentInstance> = from_json(instances_json, "instances")?;
    let existing: Vec<ExistingAppointment> = from_json(existing_json, "existing appointments")?;
    let report = recurrence_engine::check_conflicts(&instances, &existing, assignee_id);
    to_json(&recurrence_engine::without_conflicts(&instances, &report))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand an appointment template into concrete instances.
///
/// Returns a JSON array of instances with RFC 3339 timestamps.
///
/// # Arguments
/// - `template_json` -- `{start, end, title, description?, assigneeId?, location?}`
/// - `rule_json` -- `{pattern, frequency, endDate?, daysOfWeek?}`
/// - `cap` -- Maximum number of instances (defaults to 52)
/// - `timezone` -- IANA timezone for calendar arithmetic (defaults to UTC)
/// - `dst_policy` -- `"wall-clock"` (default), `"shift-forward"` or `"skip"`
#[wasm_bindgen(js_name = "expandRecurrence")]
pub fn expand_recurrence(
    template_json: &str,
    rule_json: &str,
    cap: Option<u32>,
    timezone: Option<String>,
    dst_policy: Option<String>,
) -> Result<String, JsValue> {
    build_options(cap, timezone.as_deref(), dst_policy.as_deref())
        .and_then(|options| expand_json(template_json, rule_json, &options))
        .map_err(|e| JsValue::from_str(&e))
}

/// Report which instances overlap an existing appointment held by `assignee_id`.
///
/// Returns a JSON array of `{instance, conflicts}` objects. An empty array means
/// no conflicts.
#[wasm_bindgen(js_name = "checkConflicts")]
pub fn check_conflicts(
    instances_json: &str,
    existing_json: &str,
    assignee_id: &str,
) -> Result<String, JsValue> {
    check_conflicts_json(instances_json, existing_json, assignee_id)
        .map_err(|e| JsValue::from_str(&e))
}

/// Return the instances that do NOT overlap any appointment held by `assignee_id`.
#[wasm_bindgen(js_name = "withoutConflicts")]
pub fn without_conflicts(
    instances_json: &str,
    existing_json: &str,
    assignee_id: &str,
) -> Result<String, JsValue> {
    without_conflicts_json(instances_json, existing_json, assignee_id)
        .map_err(|e| JsValue::from_str(&e))
}
