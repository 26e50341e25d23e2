use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use cadence_cron::schedule_to_human;
use cadence_engine::{Engine, EnginePaths};
use cadence_types::{
    AgentStep, Automation, OutputConfig, RunStatus, Schedule, SourceConfig, TriggerConfig,
};

#[derive(Subcommand)]
pub enum AutomationCommand {
    /// List automations
    List,
    /// Add an automation
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Poll interval in minutes
        #[arg(long, conflicts_with = "cron")]
        every: Option<u64>,

        /// Cron expression schedule
        #[arg(long)]
        cron: Option<String>,

        /// Source type ("github")
        #[arg(long, default_value = "github")]
        source: String,

        /// Repository slug for github sources (owner/name)
        #[arg(long)]
        repo: Option<String>,

        /// Event types to react to (comma-separated, e.g. "issues")
        #[arg(long)]
        events: Option<String>,

        /// Coding-assistant prompt template run per triggering item
        #[arg(long)]
        prompt: Option<String>,

        /// Webhook URL to notify
        #[arg(long)]
        webhook: Option<String>,

        /// Telegram bot token (with --telegram-chat)
        #[arg(long, requires = "telegram_chat")]
        telegram_token: Option<String>,

        /// Telegram chat id to notify
        #[arg(long, requires = "telegram_token")]
        telegram_chat: Option<String>,
    },
    /// Remove an automation
    Remove { id: String },
    /// Enable an automation
    Enable { id: String },
    /// Disable an automation
    Disable { id: String },
    /// Trigger an automation now, ignoring its schedule
    Run { id: String },
    /// Show recent runs of an automation
    History { id: String },
}

fn engine() -> anyhow::Result<Engine> {
    Ok(Engine::new(EnginePaths::from_home()?))
}

pub async fn run(command: AutomationCommand) -> anyhow::Result<()> {
    let engine = engine()?;
    match command {
        AutomationCommand::List => {
            for automation in engine.store().list()? {
                let state = if automation.enabled { "enabled" } else { "disabled" };
                println!(
                    "{}  {:8}  {}  {}",
                    automation.id,
                    state,
                    schedule_to_human(&automation.schedule),
                    automation.name
                );
            }
        }
        AutomationCommand::Add {
            name,
            every,
            cron,
            source,
            repo,
            events,
            prompt,
            webhook,
            telegram_token,
            telegram_chat,
        } => {
            let schedule = match (every, cron) {
                (Some(minutes), None) => Schedule::interval(minutes),
                (None, Some(expr)) => {
                    cadence_cron::cron_to_calendar_entries(&expr)
                        .with_context(|| format!("invalid cron expression: {expr:?}"))?;
                    Schedule::cron(expr)
                }
                _ => bail!("exactly one of --every or --cron is required"),
            };

            let mut config = HashMap::new();
            if let Some(repo) = repo {
                config.insert("repo".to_string(), json!(repo));
            }
            let source = SourceConfig { kind: source, config };
            cadence_engine::source::build_source(&source).context("invalid source")?;

            let mut outputs = Vec::new();
            if let Some(url) = webhook {
                let output = OutputConfig {
                    kind: "webhook".into(),
                    enabled: true,
                    template: None,
                    settings: HashMap::from([("url".to_string(), json!(url))]),
                };
                cadence_engine::output::build_output(&output).context("invalid webhook")?;
                outputs.push(output);
            }
            if let (Some(token), Some(chat)) = (telegram_token, telegram_chat) {
                let output = OutputConfig {
                    kind: "telegram".into(),
                    enabled: true,
                    template: None,
                    settings: HashMap::from([
                        ("bot_token".to_string(), json!(token)),
                        ("chat_id".to_string(), json!(chat)),
                    ]),
                };
                cadence_engine::output::build_output(&output).context("invalid telegram output")?;
                outputs.push(output);
            }

            let automation = Automation {
                id: uuid::Uuid::new_v4().to_string(),
                name,
                enabled: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                schedule,
                source,
                trigger: TriggerConfig {
                    event_types: events
                        .map(|e| e.split(',').map(|s| s.trim().to_string()).collect())
                        .unwrap_or_default(),
                    on_new_item: true,
                },
                agent: AgentStep {
                    enabled: prompt.is_some(),
                    prompt: prompt.unwrap_or_default(),
                },
                outputs,
                last_run: None,
            };
            let id = automation.id.clone();
            engine.store().create(automation)?;
            println!("Created automation {id}");
        }
        AutomationCommand::Remove { id } => {
            engine.store().delete(&id)?;
            println!("Removed automation {id}");
        }
        AutomationCommand::Enable { id } => {
            engine.store().update(&id, |a| a.enabled = true)?;
            println!("Enabled automation {id}");
        }
        AutomationCommand::Disable { id } => {
            engine.store().update(&id, |a| a.enabled = false)?;
            println!("Disabled automation {id}");
        }
        AutomationCommand::Run { id } => {
            engine.trigger(&id).await?;
            println!("Ran automation {id}");
        }
        AutomationCommand::History { id } => {
            for record in engine.run_history(&id)? {
                let status = match record.status {
                    RunStatus::Running => "running",
                    RunStatus::Completed => "completed",
                    RunStatus::Error => "error",
                };
                println!("{} [{status}]", record.started_at);
                for line in &record.lines {
                    println!("  {line}");
                }
            }
        }
    }
    Ok(())
}

/// Run the scheduler loop in the foreground until interrupted.
pub async fn run_serve() -> anyhow::Result<()> {
    let engine = Arc::new(engine()?);
    engine.run_scheduler().await;
    Ok(())
}
