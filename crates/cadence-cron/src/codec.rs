//! Cron field expansion and calendar-entry conversion.

use std::collections::BTreeSet;

use cadence_types::CalendarEntry;

use crate::CronError;

/// Expand a single cron field into concrete values.
///
/// `None` means unconstrained: a wildcard yields `[None]`, and so does
/// anything that cannot be parsed. A step `*/n` expands to
/// `0, n, 2n, ...` with `ceil(max / n)` terms; a comma list yields the
/// parsed integers in the given order.
pub fn expand_field(field: &str, max: u32) -> Vec<Option<u32>> {
    if field == "*" {
        return vec![None];
    }
    if let Some(step) = field.strip_prefix("*/") {
        match step.parse::<u32>() {
            Ok(n) if n > 0 => return (0..max.div_ceil(n)).map(|i| Some(i * n)).collect(),
            _ => return vec![None],
        }
    }
    let values: Option<Vec<u32>> = field
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect();
    match values {
        Some(values) if !values.is_empty() => values.into_iter().map(Some).collect(),
        _ => vec![None],
    }
}

/// Recognize a value set as a clean `*/step` expansion.
///
/// Strict round-trip test: the sorted values must start at 0 and equal
/// `{0, step, 2*step, ...}` with exactly `ceil(max / step)` terms.
/// Anything else (non-zero start, missing or extra term) is rejected.
pub fn detect_step(values: &[u32], max: u32) -> Option<u32> {
    if values.len() < 2 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    if sorted[0] != 0 {
        return None;
    }
    let step = sorted[1] - sorted[0];
    if step == 0 {
        return None;
    }
    let expected: Vec<u32> = (0..max.div_ceil(step)).map(|i| i * step).collect();
    (sorted == expected).then_some(step)
}

/// A day/weekday field contributes a scalar constraint only when it is a
/// bare single integer. Wildcards, steps, lists, and ranges are not
/// representable as one scalar and are dropped.
fn scalar_constraint(field: &str) -> Option<u32> {
    field.parse().ok()
}

/// Convert a cron expression to calendar trigger entries.
///
/// Produces the cross product of expanded hours and minutes (hours
/// outer), each entry carrying the scalar day/weekday constraints.
pub fn cron_to_calendar_entries(cron: &str) -> Result<Vec<CalendarEntry>, CronError> {
    let [minute, hour, dom, _month, dow] = crate::split_fields(cron)?;

    let minutes = expand_field(minute, 60);
    let hours = expand_field(hour, 24);
    let day = scalar_constraint(dom);
    let weekday = scalar_constraint(dow);

    let mut entries = Vec::with_capacity(hours.len() * minutes.len());
    for h in &hours {
        for m in &minutes {
            entries.push(CalendarEntry {
                minute: *m,
                hour: *h,
                day,
                weekday,
            });
        }
    }
    Ok(entries)
}

/// Render a set of field values back to cron syntax: step form first,
/// then single value, then a sorted comma list.
fn render_field(values: &BTreeSet<u32>, max: u32) -> String {
    if values.is_empty() {
        return "*".to_string();
    }
    let sorted: Vec<u32> = values.iter().copied().collect();
    if let Some(step) = detect_step(&sorted, max) {
        return format!("*/{step}");
    }
    if sorted.len() == 1 {
        return sorted[0].to_string();
    }
    sorted
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Convert calendar trigger entries back to a cron expression.
///
/// Known limitation, preserved deliberately: `Day` and `Weekday` are
/// read from the first entry only; heterogeneity across entries is
/// discarded. Month is always a wildcard.
pub fn calendar_entries_to_cron(entries: &[CalendarEntry]) -> String {
    if entries.is_empty() {
        return "* * * * *".to_string();
    }

    let minutes: BTreeSet<u32> = entries.iter().filter_map(|e| e.minute).collect();
    let hours: BTreeSet<u32> = entries.iter().filter_map(|e| e.hour).collect();

    let minute_field = render_field(&minutes, 60);
    let hour_field = render_field(&hours, 24);
    let day_field = entries[0]
        .day
        .map_or_else(|| "*".to_string(), |d| d.to_string());
    let weekday_field = entries[0]
        .weekday
        .map_or_else(|| "*".to_string(), |d| d.to_string());

    format!("{minute_field} {hour_field} {day_field} * {weekday_field}")
}
