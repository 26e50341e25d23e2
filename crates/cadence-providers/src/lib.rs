//! cadence-providers: MCP server registration for coding-assistant CLIs.
//!
//! Each supported tool registers integration endpoints ("MCP servers")
//! differently: `claude` through CLI invocation flags, `gemini` through a
//! JSON settings file, `codex` through a TOML config file. All three share
//! one capability set: register, remove, and check registration.
//!
//! Registration always tries the tool's native `mcp add` subcommand first;
//! any failure (missing binary, non-zero exit, timeout) falls back to a
//! direct config-file write that preserves every unrelated key or section.
//! Only a failure of the fallback write itself surfaces to the caller.

pub mod json_config;
pub mod toml_config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("home directory not found")]
    NoHomeDir,
    #[error("config write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// How a tool's registration is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStrategy {
    /// Registration is carried entirely by CLI invocation arguments; no
    /// file write happens on the success path.
    Flag,
    /// Registration lives in a config file. The file is still only
    /// written as a fallback; a successful CLI call leaves it untouched.
    ConfigFile,
}

/// Supported coding-assistant CLIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    Gemini,
    Codex,
}

impl ProviderKind {
    /// Select a provider by tool name.
    pub fn for_tool(name: &str) -> Result<Self, RegistryError> {
        match name {
            "claude" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            "codex" => Ok(Self::Codex),
            other => Err(RegistryError::UnknownTool(other.to_string())),
        }
    }

    pub fn cli_command(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Codex => "codex",
        }
    }

    pub fn config_strategy(&self) -> ConfigStrategy {
        match self {
            Self::Claude => ConfigStrategy::Flag,
            Self::Gemini | Self::Codex => ConfigStrategy::ConfigFile,
        }
    }
}

/// Per-tool fallback config locations, passed in explicitly so tests and
/// concurrent configurations never touch the real home directory.
#[derive(Debug, Clone)]
pub struct ProviderPaths {
    /// JSON fallback for `claude` (`~/.claude.json`).
    pub claude_config: PathBuf,
    /// JSON settings for `gemini` (`~/.gemini/settings.json`).
    pub gemini_settings: PathBuf,
    /// TOML config for `codex` (`~/.codex/config.toml`).
    pub codex_config: PathBuf,
}

impl ProviderPaths {
    /// Resolve the conventional per-user locations.
    pub fn from_home() -> Result<Self, RegistryError> {
        let home = dirs::home_dir().ok_or(RegistryError::NoHomeDir)?;
        Ok(Self {
            claude_config: home.join(".claude.json"),
            gemini_settings: home.join(".gemini").join("settings.json"),
            codex_config: home.join(".codex").join("config.toml"),
        })
    }

    fn config_path(&self, kind: ProviderKind) -> &Path {
        match kind {
            ProviderKind::Claude => &self.claude_config,
            ProviderKind::Gemini => &self.gemini_settings,
            ProviderKind::Codex => &self.codex_config,
        }
    }
}

/// Registers and removes MCP servers across the supported tools.
pub struct ProviderRegistry {
    paths: ProviderPaths,
    cli_timeout: Duration,
}

impl ProviderRegistry {
    pub fn new(paths: ProviderPaths) -> Self {
        Self {
            paths,
            cli_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_cli_timeout(mut self, timeout: Duration) -> Self {
        self.cli_timeout = timeout;
        self
    }

    /// Register an MCP server with a tool.
    ///
    /// Native CLI registration is attempted first; any failure silently
    /// falls back to the config-file upsert. Fallback write errors
    /// propagate.
    pub async fn register_mcp_server(
        &self,
        kind: ProviderKind,
        name: &str,
        command: &str,
        args: &[String],
    ) -> Result<(), RegistryError> {
        match self.run_native_add(kind, name, command, args).await {
            Ok(()) => {
                info!(tool = kind.cli_command(), name, "registered MCP server via CLI");
                Ok(())
            }
            Err(err) => {
                warn!(
                    tool = kind.cli_command(),
                    name,
                    error = %err,
                    "CLI registration failed, writing fallback config"
                );
                self.write_fallback(kind, name, command, args)
            }
        }
    }

    /// Remove an MCP server registration.
    ///
    /// The native remove subcommand is best-effort; the fallback config
    /// entry is stripped independently. Idempotent when the file or
    /// entry is already gone.
    pub async fn remove_mcp_server(
        &self,
        kind: ProviderKind,
        name: &str,
    ) -> Result<(), RegistryError> {
        if let Err(err) = self
            .run_tool(kind, &["mcp".to_string(), "remove".to_string(), name.to_string()])
            .await
        {
            debug!(
                tool = kind.cli_command(),
                name,
                error = %err,
                "CLI removal failed, continuing with config cleanup"
            );
        }

        let path = self.paths.config_path(kind);
        if !path.exists() {
            return Ok(());
        }
        match kind {
            ProviderKind::Claude | ProviderKind::Gemini => {
                json_config::remove_server(path, name)?;
            }
            ProviderKind::Codex => {
                let content = std::fs::read_to_string(path)?;
                let stripped = toml_config::remove_section(&content, name);
                if stripped != content {
                    std::fs::write(path, stripped)?;
                }
            }
        }
        info!(tool = kind.cli_command(), name, "removed MCP server");
        Ok(())
    }

    /// Check the fallback config for a registration whose args contain
    /// `expected_path`. Pure file read; the CLI is never consulted.
    pub fn is_mcp_server_registered(
        &self,
        kind: ProviderKind,
        name: &str,
        expected_path: &str,
    ) -> bool {
        let path = self.paths.config_path(kind);
        match kind {
            ProviderKind::Claude | ProviderKind::Gemini => {
                json_config::is_registered(path, name, expected_path)
            }
            ProviderKind::Codex => {
                let Ok(content) = std::fs::read_to_string(path) else {
                    return false;
                };
                toml_config::is_registered(&content, name, expected_path)
            }
        }
    }

    async fn run_native_add(
        &self,
        kind: ProviderKind,
        name: &str,
        command: &str,
        args: &[String],
    ) -> std::io::Result<()> {
        let mut cli_args = vec!["mcp".to_string(), "add".to_string(), name.to_string()];
        match kind {
            // claude and codex take the server command after a `--`
            // separator; gemini takes it positionally.
            ProviderKind::Claude | ProviderKind::Codex => {
                cli_args.push("--".to_string());
                cli_args.push(command.to_string());
            }
            ProviderKind::Gemini => {
                cli_args.push(command.to_string());
            }
        }
        cli_args.extend(args.iter().cloned());
        self.run_tool(kind, &cli_args).await
    }

    /// Run a tool subcommand synchronously with a bounded timeout.
    /// Timeout and non-zero exit are both plain failures; no retry.
    async fn run_tool(&self, kind: ProviderKind, args: &[String]) -> std::io::Result<()> {
        let output = tokio::time::timeout(
            self.cli_timeout,
            Command::new(kind.cli_command()).args(args).output(),
        )
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "CLI call timed out"))??;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(std::io::Error::other(format!(
                "{} exited with {}: {}",
                kind.cli_command(),
                output.status,
                stderr.trim()
            )))
        }
    }

    fn write_fallback(
        &self,
        kind: ProviderKind,
        name: &str,
        command: &str,
        args: &[String],
    ) -> Result<(), RegistryError> {
        let path = self.paths.config_path(kind);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match kind {
            ProviderKind::Claude | ProviderKind::Gemini => {
                json_config::upsert_server(path, name, command, args)?;
            }
            ProviderKind::Codex => {
                let content = std::fs::read_to_string(path).unwrap_or_default();
                let updated = toml_config::upsert_section(&content, name, command, args);
                std::fs::write(path, updated)?;
            }
        }
        info!(tool = kind.cli_command(), name, path = %path.display(), "wrote fallback MCP config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(dir: &Path) -> ProviderRegistry {
        ProviderRegistry::new(ProviderPaths {
            claude_config: dir.join(".claude.json"),
            gemini_settings: dir.join(".gemini").join("settings.json"),
            codex_config: dir.join(".codex").join("config.toml"),
        })
        // The assistant CLIs are absent in the test environment, so
        // every native call fails fast and exercises the fallback path.
        .with_cli_timeout(Duration::from_secs(5))
    }

    #[test]
    fn test_for_tool() {
        assert_eq!(ProviderKind::for_tool("claude").unwrap(), ProviderKind::Claude);
        assert_eq!(ProviderKind::for_tool("gemini").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::for_tool("codex").unwrap(), ProviderKind::Codex);
        assert!(matches!(
            ProviderKind::for_tool("cursor"),
            Err(RegistryError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_config_strategies() {
        assert_eq!(ProviderKind::Claude.config_strategy(), ConfigStrategy::Flag);
        assert_eq!(
            ProviderKind::Gemini.config_strategy(),
            ConfigStrategy::ConfigFile
        );
        assert_eq!(
            ProviderKind::Codex.config_strategy(),
            ConfigStrategy::ConfigFile
        );
    }

    #[tokio::test]
    async fn test_register_falls_back_to_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());

        // No `gemini` binary in the test environment: the CLI attempt
        // fails and the settings file is written instead.
        reg.register_mcp_server(
            ProviderKind::Gemini,
            "cadence",
            "/usr/local/bin/cadence-mcp",
            &["--stdio".to_string()],
        )
        .await
        .unwrap();

        assert!(reg.is_mcp_server_registered(
            ProviderKind::Gemini,
            "cadence",
            "--stdio"
        ));
        assert!(!reg.is_mcp_server_registered(ProviderKind::Gemini, "cadence", "/other"));
        assert!(!reg.is_mcp_server_registered(ProviderKind::Gemini, "missing", "--stdio"));
    }

    #[tokio::test]
    async fn test_register_falls_back_to_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());

        reg.register_mcp_server(
            ProviderKind::Codex,
            "cadence",
            "cadence-mcp",
            &["/srv/proj".to_string()],
        )
        .await
        .unwrap();

        assert!(reg.is_mcp_server_registered(ProviderKind::Codex, "cadence", "/srv/proj"));

        // Re-registering with different args leaves exactly one section.
        reg.register_mcp_server(
            ProviderKind::Codex,
            "cadence",
            "cadence-mcp",
            &["/srv/other".to_string()],
        )
        .await
        .unwrap();

        let content = std::fs::read_to_string(dir.path().join(".codex/config.toml")).unwrap();
        assert_eq!(content.matches("[mcp_servers.cadence]").count(), 1);
        assert!(reg.is_mcp_server_registered(ProviderKind::Codex, "cadence", "/srv/other"));
        assert!(!reg.is_mcp_server_registered(ProviderKind::Codex, "cadence", "/srv/proj"));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());

        // Nothing registered, no files: must not error.
        reg.remove_mcp_server(ProviderKind::Claude, "ghost")
            .await
            .unwrap();
        reg.remove_mcp_server(ProviderKind::Codex, "ghost")
            .await
            .unwrap();

        reg.register_mcp_server(ProviderKind::Claude, "cadence", "cadence-mcp", &[])
            .await
            .unwrap();
        // The path match is positional: the command itself is not an arg.
        assert!(!reg.is_mcp_server_registered(ProviderKind::Claude, "cadence", "cadence-mcp"));

        reg.remove_mcp_server(ProviderKind::Claude, "cadence")
            .await
            .unwrap();
        reg.remove_mcp_server(ProviderKind::Claude, "cadence")
            .await
            .unwrap();
    }
}
