//! cadence-types: shared data model for the cadence automation engine.
//!
//! Plain serde types with no behavior. Everything that is persisted or
//! crosses a crate boundary lives here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ──────────────────── Calendar / Schedule Types ────────────────────

/// A single OS-level calendar trigger. Absent fields are wildcards.
///
/// Field names match the calendar-trigger dictionary consumed by the
/// OS scheduler, hence the PascalCase serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    #[serde(rename = "Minute", default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(rename = "Hour", default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(rename = "Day", default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(rename = "Weekday", default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<u32>,
}

impl CalendarEntry {
    /// An entry with every field unconstrained.
    pub fn wildcard() -> Self {
        Self {
            minute: None,
            hour: None,
            day: None,
            weekday: None,
        }
    }
}

/// UI-facing classification of a cron expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePreset {
    Hourly,
    Daily,
    Weekdays,
    SpecificDays,
    EveryNDays,
    Monthly,
    Custom,
}

/// A cron expression decomposed for schedule-editor UIs.
///
/// Every field is always populated with a usable default; only the subset
/// relevant to `preset` is semantically meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSchedule {
    pub preset: SchedulePreset,
    /// "HH:MM", 24-hour.
    pub time: String,
    pub interval_days: u32,
    pub selected_days: Vec<String>,
    pub custom_cron: String,
}

impl ParsedSchedule {
    /// The default descriptor for a cron string: `custom`, carrying the
    /// raw expression.
    pub fn custom(cron: &str) -> Self {
        Self {
            preset: SchedulePreset::Custom,
            time: "09:00".to_string(),
            interval_days: 1,
            selected_days: Vec::new(),
            custom_cron: cron.to_string(),
        }
    }
}

/// How an automation decides when to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Interval,
    Cron,
}

/// An automation schedule.
///
/// Invariant: `kind == Interval` implies `interval_minutes` is set and
/// `cron` absent, and vice versa. Records that violate this render as
/// "Unknown schedule" rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
}

impl Schedule {
    pub fn interval(minutes: u64) -> Self {
        Self {
            kind: ScheduleKind::Interval,
            interval_minutes: Some(minutes),
            cron: None,
        }
    }

    pub fn cron(expr: impl Into<String>) -> Self {
        Self {
            kind: ScheduleKind::Cron,
            interval_minutes: None,
            cron: Some(expr.into()),
        }
    }
}

// ──────────────────── Automation Types ────────────────────

/// Where an automation pulls items from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source type (e.g. "github").
    #[serde(rename = "type")]
    pub kind: String,
    /// Source-specific settings (repo slug, feed URL, auth token, ...).
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

/// What kinds of polled items fire the automation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Event types to react to (e.g. "issues", "pull_request").
    #[serde(default)]
    pub event_types: Vec<String>,
    /// Fire only for items not seen before.
    #[serde(default = "default_true")]
    pub on_new_item: bool,
}

fn default_true() -> bool {
    true
}

/// Optional coding-assistant step run for each triggering item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    #[serde(default)]
    pub enabled: bool,
    /// Prompt template; interpolated per item before dispatch.
    #[serde(default)]
    pub prompt: String,
}

/// One notification channel attached to an automation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output type (e.g. "webhook", "telegram").
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Message template; a per-type default is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Type-specific settings (webhook URL, bot token, chat id, ...).
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

/// A recurring automation: poll a source, deduplicate, notify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schedule: Schedule,
    pub source: SourceConfig,
    pub trigger: TriggerConfig,
    pub agent: AgentStep,
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
    /// Last time a run started for this automation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

// ──────────────────── Source Items ────────────────────

/// An item polled from an external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    /// Item type within the source (e.g. "issue", "pull_request").
    pub item_type: String,
    /// Source-assigned identifier (issue number, feed entry id, ...).
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

// ──────────────────── Run Records ────────────────────

/// Outcome of a single automation run, reconstructed from its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Error,
}

/// One automation run as parsed from the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub status: RunStatus,
    /// Log lines between the start and completion markers.
    #[serde(default)]
    pub lines: Vec<String>,
}
