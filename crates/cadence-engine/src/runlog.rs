//! Automation run logs: marker-delimited blocks, one per run.
//!
//! A run's log is delimited by the literal lines
//! `=== Automation started at <timestamp> ===` and
//! `=== Automation completed at <timestamp> ===`. A line containing
//! `Error` before the completion marker makes the run's status `error`;
//! a start marker with no completion marker reads as `running`.

use cadence_types::{RunRecord, RunStatus};

const START_PREFIX: &str = "=== Automation started at ";
const COMPLETE_PREFIX: &str = "=== Automation completed at ";
const MARKER_SUFFIX: &str = " ===";

/// Accumulates one run's log lines between the start and completion
/// markers.
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn start(timestamp: &str) -> Self {
        Self {
            lines: vec![format!("{START_PREFIX}{timestamp}{MARKER_SUFFIX}")],
        }
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Record a step failure. The `Error` substring is what log parsing
    /// keys on for run status.
    pub fn error(&mut self, text: impl std::fmt::Display) {
        self.lines.push(format!("Error: {text}"));
    }

    /// Close the run block and render it for appending to the log file.
    pub fn complete(mut self, timestamp: &str) -> String {
        self.lines
            .push(format!("{COMPLETE_PREFIX}{timestamp}{MARKER_SUFFIX}"));
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn marker_timestamp<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix)?.strip_suffix(MARKER_SUFFIX)
}

/// Reconstruct run records from a log file's content, one per start
/// marker, most recent first.
pub fn parse_run_log(content: &str) -> Vec<RunRecord> {
    let mut records: Vec<RunRecord> = Vec::new();
    let mut current: Option<RunRecord> = None;

    for line in content.lines() {
        if let Some(ts) = marker_timestamp(line, START_PREFIX) {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(RunRecord {
                started_at: ts.to_string(),
                completed_at: None,
                status: RunStatus::Running,
                lines: Vec::new(),
            });
        } else if let Some(ts) = marker_timestamp(line, COMPLETE_PREFIX) {
            if let Some(mut record) = current.take() {
                record.completed_at = Some(ts.to_string());
                record.status = if record.lines.iter().any(|l| l.contains("Error")) {
                    RunStatus::Error
                } else {
                    RunStatus::Completed
                };
                records.push(record);
            }
        } else if let Some(record) = current.as_mut() {
            record.lines.push(line.to_string());
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }
    records.reverse();
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_parse_round_trip() {
        let mut log = RunLog::start("2025-06-02T09:00:00Z");
        log.line("Polled 3 items");
        let block = log.complete("2025-06-02T09:00:05Z");

        let records = parse_run_log(&block);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].started_at, "2025-06-02T09:00:00Z");
        assert_eq!(records[0].completed_at.as_deref(), Some("2025-06-02T09:00:05Z"));
        assert_eq!(records[0].status, RunStatus::Completed);
        assert_eq!(records[0].lines, vec!["Polled 3 items"]);
    }

    #[test]
    fn test_error_line_marks_status_error() {
        let mut log = RunLog::start("t1");
        log.error("webhook dispatch failed");
        let block = log.complete("t2");

        let records = parse_run_log(&block);
        assert_eq!(records[0].status, RunStatus::Error);
    }

    #[test]
    fn test_missing_completion_marker_is_running() {
        let content = "=== Automation started at t1 ===\nworking\n";
        let records = parse_run_log(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RunStatus::Running);
        assert!(records[0].completed_at.is_none());
    }

    #[test]
    fn test_most_recent_first() {
        let mut content = RunLog::start("t1").complete("t2");
        content.push_str(&RunLog::start("t3").complete("t4"));
        content.push_str("=== Automation started at t5 ===\nstill going\n");

        let records = parse_run_log(&content);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].started_at, "t5");
        assert_eq!(records[0].status, RunStatus::Running);
        assert_eq!(records[1].started_at, "t3");
        assert_eq!(records[2].started_at, "t1");
    }

    #[test]
    fn test_unterminated_run_followed_by_new_start() {
        let content = "\
=== Automation started at t1 ===
crashed midway
=== Automation started at t2 ===
=== Automation completed at t3 ===
";
        let records = parse_run_log(content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].started_at, "t2");
        assert_eq!(records[0].status, RunStatus::Completed);
        assert_eq!(records[1].started_at, "t1");
        assert_eq!(records[1].status, RunStatus::Running);
    }
}
