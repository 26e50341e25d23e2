//! Next-run computation for cron schedules.

use chrono::{DateTime, Datelike, Duration, Local, Timelike};

use crate::CronError;

/// Parse the leading integer of a cron field; `*` and fields with no
/// leading digits count as unconstrained. A range like `1-5` therefore
/// reduces to its first day, matching the observed behavior this codec
/// reproduces.
fn leading_int(field: &str) -> Option<u32> {
    if field == "*" {
        return None;
    }
    let digits: String = field
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Compute the next run time for a cron expression from the current
/// local time.
///
/// Explicit hour/minute values are applied to "now" with seconds zeroed;
/// if the result is not strictly in the future, one day is added. A
/// weekday constraint then advances day by day until it matches, and a
/// day-of-month constraint advances afterwards, independently. The two
/// passes are sequential (an AND applied one after the other), which
/// diverges from standard cron's OR when both are restricted; the
/// divergence is kept on purpose.
pub fn next_run_time(cron: &str) -> Result<DateTime<Local>, CronError> {
    next_run_from(cron, Local::now())
}

/// Same as [`next_run_time`] but from an explicit base instant.
pub fn next_run_from(cron: &str, now: DateTime<Local>) -> Result<DateTime<Local>, CronError> {
    let [minute, hour, dom, _month, dow] = crate::split_fields(cron)?;

    let minute = leading_int(minute).filter(|m| *m <= 59);
    let hour = leading_int(hour).filter(|h| *h <= 23);
    let dom = leading_int(dom);
    let dow = leading_int(dow);

    let mut t = now;
    t = t.with_second(0).unwrap_or(t);
    t = t.with_nanosecond(0).unwrap_or(t);
    if let Some(m) = minute {
        t = t.with_minute(m).unwrap_or(t);
    }
    if let Some(h) = hour {
        t = t.with_hour(h).unwrap_or(t);
    }

    if t <= now {
        t += Duration::days(1);
    }

    if let Some(target) = dow {
        let mut remaining = 7;
        while t.weekday().num_days_from_sunday() != target && remaining > 0 {
            t += Duration::days(1);
            remaining -= 1;
        }
    }

    if let Some(target) = dom {
        let mut remaining = 366;
        while t.day() != target && remaining > 0 {
            t += Duration::days(1);
            remaining -= 1;
        }
    }

    Ok(t)
}
