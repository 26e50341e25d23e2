use clap::Subcommand;

use cadence_providers::{ProviderKind, ProviderPaths, ProviderRegistry};

#[derive(Subcommand)]
pub enum ProviderCommand {
    /// Register an MCP server with a coding-assistant CLI
    Register {
        /// Assistant tool (claude, gemini, codex)
        tool: String,

        /// Server name to register under
        #[arg(long, default_value = "cadence")]
        name: String,

        /// Command the assistant should launch
        #[arg(long)]
        command: String,

        /// Arguments passed to the command
        args: Vec<String>,
    },
    /// Remove an MCP server registration
    Remove {
        /// Assistant tool (claude, gemini, codex)
        tool: String,

        /// Server name to remove
        #[arg(long, default_value = "cadence")]
        name: String,
    },
    /// Show registration status across all assistants
    Status {
        /// Server name to look for
        #[arg(long, default_value = "cadence")]
        name: String,

        /// Path expected among the registered server's arguments
        #[arg(long)]
        path: String,
    },
}

pub async fn run(command: ProviderCommand) -> anyhow::Result<()> {
    let registry = ProviderRegistry::new(ProviderPaths::from_home()?);
    match command {
        ProviderCommand::Register {
            tool,
            name,
            command,
            args,
        } => {
            let kind = ProviderKind::for_tool(&tool)?;
            registry
                .register_mcp_server(kind, &name, &command, &args)
                .await?;
            println!("Registered {name} with {tool}");
        }
        ProviderCommand::Remove { tool, name } => {
            let kind = ProviderKind::for_tool(&tool)?;
            registry.remove_mcp_server(kind, &name).await?;
            println!("Removed {name} from {tool}");
        }
        ProviderCommand::Status { name, path } => {
            for kind in [ProviderKind::Claude, ProviderKind::Gemini, ProviderKind::Codex] {
                let state = if registry.is_mcp_server_registered(kind, &name, &path) {
                    "registered"
                } else {
                    "not registered"
                };
                println!("{:>6}: {state}", kind.cli_command());
            }
        }
    }
    Ok(())
}
