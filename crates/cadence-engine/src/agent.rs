//! Coding-assistant invocation for automations with an agent step.
//!
//! The assistant CLI is a spawn target only: the prompt is escaped,
//! wrapped in a double-quoted shell argument, and the process is waited
//! on with a bounded timeout.

use std::time::Duration;

use anyhow::{Context, bail};
use tokio::process::Command;

use cadence_security::escape_shell_arg;

pub struct AgentRunner {
    cli: String,
    timeout: Duration,
}

impl AgentRunner {
    pub fn new(cli: impl Into<String>) -> Self {
        Self {
            cli: cli.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the shell command line for a prompt.
    pub fn command_line(&self, prompt: &str) -> String {
        format!("{} -p \"{}\"", self.cli, escape_shell_arg(prompt))
    }

    /// Run the assistant once with the given prompt, returning stdout.
    pub async fn run(&self, prompt: &str) -> anyhow::Result<String> {
        let command_line = self.command_line(prompt);
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("sh").arg("-c").arg(&command_line).output(),
        )
        .await
        .context("agent invocation timed out")?
        .context("agent spawn failed")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("agent exited with {}: {}", output.status, stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
