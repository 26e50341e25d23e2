//! Human-readable descriptions of schedules.

use cadence_types::{Schedule, ScheduleKind};

/// Convert an interval in minutes to a cron expression.
///
/// Intervals above one hour that are not whole-hour multiples lose the
/// remainder; anything of a day or more pins to daily midnight. Both
/// truncations are intentional.
pub fn interval_to_cron(minutes: u64) -> String {
    if minutes < 60 {
        format!("*/{minutes} * * * *")
    } else if minutes == 60 {
        "0 * * * *".to_string()
    } else if minutes < 1440 {
        format!("0 */{} * * *", minutes / 60)
    } else {
        "0 0 * * *".to_string()
    }
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn weekday_name(day: u32) -> Option<&'static str> {
    WEEKDAY_NAMES.get(day as usize).copied()
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

fn format_time12(hour: u32, minute: u32) -> String {
    let (h12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{h12}:{minute:02} {meridiem}")
}

/// Describe a cron expression in plain English.
///
/// Tries a ladder of common shapes and echoes the raw expression when
/// none matches (a specific month always falls through).
pub fn cron_to_human(cron: &str) -> String {
    let Ok([minute, hour, dom, month, dow]) = crate::split_fields(cron) else {
        return cron.to_string();
    };

    if month != "*" {
        return cron.to_string();
    }

    if minute == "*" && hour == "*" {
        return "Every minute".to_string();
    }

    if hour == "*" && dom == "*" && dow == "*" {
        return match minute.parse::<u32>() {
            Ok(0) => "Every hour".to_string(),
            Ok(m) => format!("Every hour at :{m:02}"),
            Err(_) => cron.to_string(),
        };
    }

    let (Ok(h), Ok(m)) = (hour.parse::<u32>(), minute.parse::<u32>()) else {
        return cron.to_string();
    };
    let time = format_time12(h, m);

    if dom == "*" && dow == "*" {
        return format!("Every day at {time}");
    }
    if dom == "*" && dow == "1-5" {
        return format!("Weekdays at {time}");
    }
    if dom == "*" {
        if let Some(name) = dow.parse::<u32>().ok().and_then(weekday_name) {
            return format!("Every {name} at {time}");
        }
        return cron.to_string();
    }
    if dow == "*" {
        if let Ok(day) = dom.parse::<u32>() {
            return format!("Monthly on the {day}{} at {time}", ordinal_suffix(day));
        }
    }

    cron.to_string()
}

/// Reduced description ladder used for stored automation schedules:
/// every-minute, hourly-at-minute, daily, and weekdays only.
fn cron_schedule_summary(cron: &str) -> String {
    let Ok([minute, hour, dom, month, dow]) = crate::split_fields(cron) else {
        return cron.to_string();
    };

    if month != "*" {
        return cron.to_string();
    }
    if minute == "*" && hour == "*" {
        return "Every minute".to_string();
    }
    if hour == "*" && dom == "*" && dow == "*" {
        return match minute.parse::<u32>() {
            Ok(0) => "Every hour".to_string(),
            Ok(m) => format!("Every hour at :{m:02}"),
            Err(_) => cron.to_string(),
        };
    }

    let (Ok(h), Ok(m)) = (hour.parse::<u32>(), minute.parse::<u32>()) else {
        return cron.to_string();
    };
    let time = format_time12(h, m);

    if dom == "*" && dow == "*" {
        return format!("Every day at {time}");
    }
    if dom == "*" && dow == "1-5" {
        return format!("Weekdays at {time}");
    }

    cron.to_string()
}

/// Describe an automation schedule.
///
/// Schedules missing their required field render as "Unknown schedule".
pub fn schedule_to_human(schedule: &Schedule) -> String {
    match schedule.kind {
        ScheduleKind::Interval => match schedule.interval_minutes {
            None => "Unknown schedule".to_string(),
            Some(1) => "Every minute".to_string(),
            Some(m) if m < 60 => format!("Every {m} minutes"),
            Some(60) => "Every hour".to_string(),
            Some(m) if m % 60 == 0 => format!("Every {} hours", m / 60),
            Some(m) => format!("Every {}h {}m", m / 60, m % 60),
        },
        ScheduleKind::Cron => match &schedule.cron {
            None => "Unknown schedule".to_string(),
            Some(cron) => cron_schedule_summary(cron),
        },
    }
}
