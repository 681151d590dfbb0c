//! Property-based tests for recurrence expansion using proptest.
//!
//! These tests verify invariants that should hold for *any* valid template and
//! rule, not just the specific examples in `expander_tests.rs`.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use proptest::prelude::*;
use recurrence_engine::rule::parse_weekday;
use recurrence_engine::{
    expand, expand_with_options, AppointmentTemplate, ExpandOptions, Pattern, RecurrenceRule,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_pattern() -> impl Strategy<Value = Pattern> {
    prop_oneof![
        Just(Pattern::Daily),
        Just(Pattern::Weekly),
        Just(Pattern::Monthly),
    ]
}

fn arb_frequency() -> impl Strategy<Value = u32> {
    1u32..=12
}

fn arb_cap() -> impl Strategy<Value = usize> {
    0usize..=80
}

/// Weekday names in the mixed spellings the UI and RFC 5545 use.
fn arb_days() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(
        vec!["Monday", "tue", "WE", "Thursday", "fri", "SA", "sunday"],
        1..=7,
    )
}

/// Timezones whose DST transitions happen away from midnight, so a gap never
/// moves an occurrence onto a different local day.
fn arb_timezone() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("UTC"),
        Just("America/New_York"),
        Just("America/Los_Angeles"),
        Just("Europe/London"),
        Just("Asia/Tokyo"),
    ]
}

/// A template starting in 2025-2027 lasting 0-10 hours.
/// Day is capped at 28 to avoid invalid month/day combos.
fn arb_template() -> impl Strategy<Value = AppointmentTemplate> {
    (
        2025i32..=2027,
        1u32..=12,
        1u32..=28,
        0u32..=23,
        0u32..=59,
        0i64..=600,
    )
        .prop_map(|(y, m, d, h, min, dur)| {
            let start = Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap();
            AppointmentTemplate::new(start, start + Duration::minutes(dur), "Visit")
        })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

fn starts(template: &AppointmentTemplate, rule: &RecurrenceRule, cap: usize) -> Vec<DateTime<Utc>> {
    expand(template, rule, cap)
        .unwrap()
        .iter()
        .map(|i| i.start)
        .collect()
}

// ---------------------------------------------------------------------------
// Property 1: DAILY count is min(cap, floor(days_to_end / frequency) + 1)
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn daily_count_matches_formula(
        template in arb_template(),
        frequency in arb_frequency(),
        cap in arb_cap(),
        days_to_end in proptest::option::of(0i64..=400),
    ) {
        let mut rule = RecurrenceRule::daily(frequency);
        if let Some(days) = days_to_end {
            rule = rule.until(template.start.date_naive() + Duration::days(days));
        }

        let result = expand(&template, &rule, cap).unwrap();

        let expected = match days_to_end {
            Some(days) => cap.min((days / i64::from(frequency)) as usize + 1),
            None => cap,
        };
        prop_assert_eq!(result.len(), expected);
    }
}

// ---------------------------------------------------------------------------
// Property 2: Duration preserved exactly, in every timezone
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn duration_preserved(
        template in arb_template(),
        pattern in arb_pattern(),
        frequency in arb_frequency(),
        cap in arb_cap(),
        tz in arb_timezone(),
    ) {
        let rule = RecurrenceRule::new(pattern, frequency);
        let options = ExpandOptions::with_cap(cap).in_timezone(tz).unwrap();

        let result = expand_with_options(&template, &rule, &options).unwrap();

        for instance in &result {
            prop_assert_eq!(instance.end - instance.start, template.duration());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Never more than `cap`, never past the end date
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn bounded_by_cap_and_end_date(
        template in arb_template(),
        pattern in arb_pattern(),
        frequency in arb_frequency(),
        cap in arb_cap(),
        days_to_end in -30i64..=365,
    ) {
        let end_date = template.start.date_naive() + Duration::days(days_to_end);
        let rule = RecurrenceRule::new(pattern, frequency).until(end_date);

        let result = expand(&template, &rule, cap).unwrap();

        prop_assert!(result.len() <= cap);
        for instance in &result {
            prop_assert!(
                instance.start.date_naive() <= end_date,
                "{:?} is after end date {}",
                instance.start,
                end_date
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: WEEKLY with a selection only lands on selected (local) weekdays
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn weekly_selection_lands_on_selected_days(
        template in arb_template(),
        days in arb_days(),
        frequency in arb_frequency(),
        cap in 1usize..=40,
        tz in arb_timezone(),
    ) {
        let rule = RecurrenceRule::weekly(frequency).on_days(&days);
        let options = ExpandOptions::with_cap(cap).in_timezone(tz).unwrap();
        let selected: Vec<Weekday> = days.iter().map(|d| parse_weekday(d).unwrap()).collect();

        let result = expand_with_options(&template, &rule, &options).unwrap();

        prop_assert_eq!(result.len(), cap);
        for instance in &result {
            let local = instance.start.with_timezone(&options.timezone);
            prop_assert!(
                selected.contains(&local.weekday()),
                "{:?} (local {:?}) not in {:?}",
                instance.start,
                local,
                selected
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: Deterministic -- identical inputs, identical outputs
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_is_deterministic(
        template in arb_template(),
        pattern in arb_pattern(),
        frequency in arb_frequency(),
        cap in arb_cap(),
    ) {
        let rule = RecurrenceRule::new(pattern, frequency);
        prop_assert_eq!(
            expand(&template, &rule, cap).unwrap(),
            expand(&template, &rule, cap).unwrap()
        );
    }
}

// ---------------------------------------------------------------------------
// Property 6: Strictly increasing starts, occurrences numbered 0..n
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn starts_strictly_increase(
        template in arb_template(),
        pattern in arb_pattern(),
        frequency in arb_frequency(),
        cap in arb_cap(),
    ) {
        let rule = RecurrenceRule::new(pattern, frequency);
        let result = expand(&template, &rule, cap).unwrap();

        for window in result.windows(2) {
            prop_assert!(window[0].start < window[1].start);
        }
        for (i, instance) in result.iter().enumerate() {
            prop_assert_eq!(instance.occurrence, i);
        }
        if let Some(first) = result.first() {
            prop_assert_eq!(first.start, template.start);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 7: DAILY spacing is exactly `frequency` days in UTC
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn daily_spacing(
        template in arb_template(),
        frequency in arb_frequency(),
        cap in 2usize..=30,
    ) {
        let gap = Duration::days(i64::from(frequency));
        for window in starts(&template, &RecurrenceRule::daily(frequency), cap).windows(2) {
            prop_assert_eq!(window[1] - window[0], gap);
        }
    }
}
