//! Preset classification of cron expressions for schedule editors.

use cadence_types::{ParsedSchedule, SchedulePreset};

/// Classify a cron expression into a UI preset.
///
/// Defaults to `custom` carrying the raw expression; malformed input
/// (not exactly 5 fields) returns the default unmodified. The decision
/// ladder is ordered, first match wins.
pub fn parse_cron_to_preset(cron: &str) -> ParsedSchedule {
    let mut parsed = ParsedSchedule::custom(cron);

    let Ok([minute, hour, dom, _month, dow]) = crate::split_fields(cron) else {
        return parsed;
    };

    // Steps or lists in the time fields are not expressible as a preset.
    if hour.contains('/') || hour.contains(',') || minute.contains('/') || minute.contains(',') {
        return parsed;
    }

    if hour != "*" {
        if let Ok(h) = hour.parse::<u32>() {
            let m = minute.parse::<u32>().unwrap_or(0);
            parsed.time = format!("{h:02}:{m:02}");
        }
    }

    if hour == "*" && dom == "*" && dow == "*" {
        parsed.preset = SchedulePreset::Hourly;
        return parsed;
    }

    if let Some(n) = dom.strip_prefix("*/") {
        if dow == "*" {
            parsed.preset = SchedulePreset::EveryNDays;
            parsed.interval_days = n.parse().unwrap_or(2);
            return parsed;
        }
    }

    if dom == "*" && dow == "1-5" {
        parsed.preset = SchedulePreset::Weekdays;
        return parsed;
    }

    if dom == "1" && dow == "*" {
        parsed.preset = SchedulePreset::Monthly;
        return parsed;
    }

    if dom == "*" && dow != "*" {
        parsed.preset = SchedulePreset::SpecificDays;
        parsed.selected_days = dow.split(',').map(String::from).collect();
        return parsed;
    }

    if dom == "*" && dow == "*" {
        parsed.preset = SchedulePreset::Daily;
        return parsed;
    }

    parsed
}
