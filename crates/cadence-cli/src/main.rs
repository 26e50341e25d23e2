mod automations;
mod providers;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cadence", about = "Scheduled automation engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage automations
    Automation {
        #[command(subcommand)]
        command: automations::AutomationCommand,
    },
    /// Manage MCP server registrations with coding-assistant CLIs
    Provider {
        #[command(subcommand)]
        command: providers::ProviderCommand,
    },
    /// Explain a schedule in plain English
    Describe {
        /// Cron expression to describe
        #[arg(long, conflicts_with = "every")]
        cron: Option<String>,

        /// Interval in minutes to convert and describe
        #[arg(long)]
        every: Option<u64>,
    },
    /// Run the scheduler loop in the foreground
    Serve,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Automation { command } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(automations::run(command))?;
        }
        Commands::Provider { command } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(providers::run(command))?;
        }
        Commands::Describe { cron, every } => match (cron, every) {
            (Some(expr), None) => {
                println!("{}", cadence_cron::cron_to_human(&expr));
                let next = cadence_cron::next_run_time(&expr)?;
                println!("Next run: {}", next.format("%Y-%m-%d %H:%M"));
            }
            (None, Some(minutes)) => {
                let expr = cadence_cron::interval_to_cron(minutes);
                println!("{expr}");
                println!("{}", cadence_cron::cron_to_human(&expr));
            }
            _ => anyhow::bail!("provide exactly one of --cron or --every"),
        },
        Commands::Serve => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(automations::run_serve())?;
        }
    }

    Ok(())
}
