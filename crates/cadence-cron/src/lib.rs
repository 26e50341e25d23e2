//! cadence-cron: cron expression handling.
//!
//! Bidirectional conversion between 5-field cron expressions and
//! OS-level calendar trigger entries, preset classification for schedule
//! editors, human-readable schedule descriptions, and next-run
//! computation. All functions are pure; no I/O.
//!
//! Supported field shapes are wildcard (`*`), step (`*/n`), comma list,
//! and single integer. The only recognized range is the literal weekday
//! value `1-5` (the weekdays preset).

pub mod codec;
pub mod describe;
pub mod next_run;
pub mod preset;

pub use codec::{
    calendar_entries_to_cron, cron_to_calendar_entries, detect_step, expand_field,
};
pub use describe::{cron_to_human, interval_to_cron, schedule_to_human};
pub use next_run::next_run_time;
pub use preset::parse_cron_to_preset;

/// Errors produced by the cron codec.
#[derive(Debug, thiserror::Error)]
pub enum CronError {
    /// The expression does not split into exactly 5 fields.
    #[error("invalid cron expression: {0:?}")]
    InvalidCron(String),
}

/// Split a cron string into its 5 fields, or fail.
pub(crate) fn split_fields(cron: &str) -> Result<[&str; 5], CronError> {
    let fields: Vec<&str> = cron.split_whitespace().collect();
    <[&str; 5]>::try_from(fields).map_err(|_| CronError::InvalidCron(cron.to_string()))
}
