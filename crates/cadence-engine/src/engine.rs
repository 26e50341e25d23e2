//! The automation engine: dueness, gated runs, and the scheduler loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use serde_json::json;
use tracing::{info, warn};

use cadence_cron::describe::schedule_to_human;
use cadence_cron::next_run::next_run_from;
use cadence_types::{Automation, RunRecord, ScheduleKind};

use crate::agent::AgentRunner;
use crate::dedup::{DedupStore, create_item_id, hash_content};
use crate::gate::RunGate;
use crate::output::{DEFAULT_TEMPLATE, build_output};
use crate::runlog::{RunLog, parse_run_log};
use crate::source::build_source;
use crate::store::AutomationStore;
use crate::template::interpolate_template;

/// Engine file locations, passed in explicitly; tests point them at a
/// temp directory.
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub automations_file: PathBuf,
    pub logs_dir: PathBuf,
}

impl EnginePaths {
    /// Conventional per-user location (`~/.cadence/`).
    pub fn from_home() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("home directory not found")?;
        Ok(Self::in_dir(&home.join(".cadence")))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            automations_file: dir.join("automations.json"),
            logs_dir: dir.join("logs"),
        }
    }
}

/// Drives automation runs off an external tick.
pub struct Engine {
    store: AutomationStore,
    dedup: DedupStore,
    gate: RunGate,
    agent: AgentRunner,
    logs_dir: PathBuf,
}

impl Engine {
    pub fn new(paths: EnginePaths) -> Self {
        Self {
            store: AutomationStore::new(paths.automations_file),
            dedup: DedupStore::new(),
            gate: RunGate::new(),
            agent: AgentRunner::new("claude"),
            logs_dir: paths.logs_dir,
        }
    }

    pub fn with_agent(mut self, agent: AgentRunner) -> Self {
        self.agent = agent;
        self
    }

    pub fn store(&self) -> &AutomationStore {
        &self.store
    }

    /// Whether an automation's schedule has come due.
    ///
    /// Schedules violating the interval/cron invariant are never due.
    pub fn is_due(automation: &Automation, now: DateTime<Utc>) -> bool {
        match automation.schedule.kind {
            ScheduleKind::Interval => {
                let Some(minutes) = automation.schedule.interval_minutes else {
                    return false;
                };
                match automation.last_run {
                    None => true,
                    Some(last) => now - last >= chrono::Duration::minutes(minutes as i64),
                }
            }
            ScheduleKind::Cron => {
                let Some(cron) = automation.schedule.cron.as_deref() else {
                    return false;
                };
                match automation.last_run {
                    None => true,
                    Some(last) => match next_run_from(cron, last.with_timezone(&Local)) {
                        Ok(next) => next <= now.with_timezone(&Local),
                        Err(_) => false,
                    },
                }
            }
        }
    }

    /// Run every enabled, due automation once. Returns the number of
    /// runs started.
    pub async fn tick(&self) -> anyhow::Result<usize> {
        let automations = self.store.list()?;
        let now = Utc::now();
        let mut started = 0;
        for automation in automations {
            if automation.enabled && Self::is_due(&automation, now) {
                self.run_gated(automation).await?;
                started += 1;
            }
        }
        Ok(started)
    }

    /// Manually trigger one automation, ignoring its schedule.
    pub async fn trigger(&self, id: &str) -> anyhow::Result<()> {
        let automation = self.store.get(id)?;
        self.run_gated(automation).await
    }

    /// Read the parsed run history for an automation, most recent run
    /// first.
    pub fn run_history(&self, id: &str) -> anyhow::Result<Vec<RunRecord>> {
        let path = self.log_path(id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(parse_run_log(&content))
    }

    fn log_path(&self, id: &str) -> PathBuf {
        self.logs_dir.join(format!("{id}.log"))
    }

    async fn run_gated(&self, automation: Automation) -> anyhow::Result<()> {
        let Some(_permit) = self.gate.try_acquire(&automation.id) else {
            warn!(automation = %automation.id, "run already in flight, skipping");
            return Ok(());
        };

        info!(automation = %automation.id, name = %automation.name, "automation run started");
        let mut log = RunLog::start(&Utc::now().to_rfc3339());
        self.execute(&automation, &mut log).await;
        let block = log.complete(&Utc::now().to_rfc3339());

        std::fs::create_dir_all(&self.logs_dir)?;
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(&automation.id))?;
        file.write_all(block.as_bytes())?;

        // The automation may have been deleted while its run was in
        // flight; losing the last_run bump is fine then.
        if let Err(err) = self
            .store
            .update(&automation.id, |a| a.last_run = Some(Utc::now()))
        {
            warn!(automation = %automation.id, error = %err, "failed to record last run");
        }
        Ok(())
    }

    /// One run: poll, dedup, agent step, outputs. Every step's failure
    /// is caught and logged; the run itself never aborts the tick.
    async fn execute(&self, automation: &Automation, log: &mut RunLog) {
        log.line(format!(
            "Schedule: {}",
            schedule_to_human(&automation.schedule)
        ));

        let poller = match build_source(&automation.source) {
            Ok(poller) => poller,
            Err(err) => {
                log.error(format!("source setup failed: {err}"));
                return;
            }
        };
        let items = match poller.poll(&automation.trigger.event_types).await {
            Ok(items) => items,
            Err(err) => {
                log.error(format!("source poll failed: {err}"));
                return;
            }
        };
        log.line(format!("Polled {} item(s)", items.len()));

        for item in items {
            let item_id = create_item_id(
                poller.source_type(),
                poller.collection_id(),
                &item.item_type,
                &item.id,
            );
            let hash = hash_content(&format!("{}\n{}", item.title, item.body));
            if automation.trigger.on_new_item && self.dedup.is_item_processed(&item_id, Some(&hash))
            {
                continue;
            }
            self.dedup.mark_item_processed(&item_id, Some(&hash));
            log.line(format!("Handling {item_id}"));

            let vars = json!({
                "automation": { "id": automation.id, "name": automation.name },
                "source": { "type": poller.source_type(), "id": poller.collection_id() },
                "item": item,
            });

            if automation.agent.enabled && !automation.agent.prompt.is_empty() {
                let prompt = interpolate_template(&automation.agent.prompt, &vars);
                match self.agent.run(&prompt).await {
                    Ok(_) => log.line("Agent step completed"),
                    Err(err) => log.error(format!("agent step failed: {err}")),
                }
            }

            // Channels are attempted in order; one failing never stops
            // the rest.
            for output in automation.outputs.iter().filter(|o| o.enabled) {
                let template = output.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
                let message = interpolate_template(template, &vars);
                match build_output(output) {
                    Ok(channel) => match channel.send(&message).await {
                        Ok(()) => log.line(format!("Dispatched {} output", channel.kind())),
                        Err(err) => log.error(format!("{} output failed: {err}", output.kind)),
                    },
                    Err(err) => log.error(format!("{} output invalid: {err}", output.kind)),
                }
            }
        }
    }

    /// Background loop driving [`Engine::tick`] once a minute.
    pub async fn run_scheduler(self: Arc<Self>) {
        info!("automation scheduler started");
        loop {
            match self.tick().await {
                Ok(0) => {}
                Ok(started) => info!(started, "tick started automation runs"),
                Err(err) => warn!(error = %err, "tick failed"),
            }
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        }
    }
}
