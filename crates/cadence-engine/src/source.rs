//! Source polling: where automations pull items from.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use cadence_types::{SourceConfig, SourceItem};

/// A pollable external source.
#[async_trait]
pub trait SourcePoller: Send + Sync {
    /// Source type tag used in dedup keys (e.g. "github").
    fn source_type(&self) -> &str;
    /// Collection identifier used in dedup keys (repo slug, feed id).
    fn collection_id(&self) -> &str;
    /// Fetch current items, filtered to the requested event types.
    /// An empty filter means all types.
    async fn poll(&self, event_types: &[String]) -> anyhow::Result<Vec<SourceItem>>;
}

/// Build a poller from an automation's source config.
pub fn build_source(source: &SourceConfig) -> anyhow::Result<Box<dyn SourcePoller>> {
    match source.kind.as_str() {
        "github" => Ok(Box::new(GithubSource::from_config(&source.config)?)),
        "static" => Ok(Box::new(StaticSource::from_config(&source.config)?)),
        other => bail!("unknown source type: {other}"),
    }
}

fn event_type_matches(item_type: &str, event_types: &[String]) -> bool {
    if event_types.is_empty() {
        return true;
    }
    event_types.iter().any(|e| match e.as_str() {
        "issues" | "issue" => item_type == "issue",
        "pull_request" | "pull_requests" => item_type == "pull_request",
        other => other == item_type,
    })
}

// ──────────────────── GitHub ────────────────────

/// Polls open issues and pull requests of one repository.
pub struct GithubSource {
    repo: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GithubSource {
    pub fn from_config(config: &HashMap<String, Value>) -> anyhow::Result<Self> {
        let repo = config
            .get("repo")
            .and_then(Value::as_str)
            .context("github source requires a repo")?;
        if !cadence_security::is_valid_repo(repo) {
            bail!("invalid repository: {repo:?}");
        }
        let token = config
            .get("token")
            .and_then(Value::as_str)
            .map(String::from);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("cadence-engine")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            repo: repo.to_string(),
            token,
            client,
        })
    }

    fn item_from_payload(&self, payload: &Value) -> Option<SourceItem> {
        let number = payload.get("number")?;
        // Defensive against odd API payloads: only positive integer
        // identifiers become dedup keys.
        if !cadence_security::is_valid_issue_number(number) {
            return None;
        }
        let item_type = if payload.get("pull_request").is_some() {
            "pull_request"
        } else {
            "issue"
        };
        Some(SourceItem {
            item_type: item_type.to_string(),
            id: number.to_string(),
            title: payload
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            body: payload
                .get("body")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            url: payload
                .get("html_url")
                .and_then(Value::as_str)
                .map(String::from),
            author: payload
                .pointer("/user/login")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

#[async_trait]
impl SourcePoller for GithubSource {
    fn source_type(&self) -> &str {
        "github"
    }

    fn collection_id(&self) -> &str {
        &self.repo
    }

    async fn poll(&self, event_types: &[String]) -> anyhow::Result<Vec<SourceItem>> {
        // The issues endpoint returns pull requests too; they carry a
        // `pull_request` key and are classified from it.
        let url = format!(
            "https://api.github.com/repos/{}/issues?state=open&sort=created&direction=desc&per_page=50",
            self.repo
        );
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("GitHub request failed")?;
        if !response.status().is_success() {
            bail!("GitHub returned {} for {}", response.status(), self.repo);
        }
        let payloads: Vec<Value> = response
            .json()
            .await
            .context("GitHub response parse failed")?;

        let items: Vec<SourceItem> = payloads
            .iter()
            .filter_map(|p| self.item_from_payload(p))
            .filter(|item| event_type_matches(&item.item_type, event_types))
            .collect();
        debug!(repo = %self.repo, count = items.len(), "polled GitHub items");
        Ok(items)
    }
}

// ──────────────────── Static ────────────────────

/// A source whose items are embedded in its config. Used for manual
/// triggers and tests.
pub struct StaticSource {
    id: String,
    items: Vec<SourceItem>,
}

impl StaticSource {
    pub fn from_config(config: &HashMap<String, Value>) -> anyhow::Result<Self> {
        let id = config
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("static")
            .to_string();
        let items = match config.get("items") {
            Some(value) => {
                serde_json::from_value(value.clone()).context("invalid static source items")?
            }
            None => Vec::new(),
        };
        Ok(Self { id, items })
    }
}

#[async_trait]
impl SourcePoller for StaticSource {
    fn source_type(&self) -> &str {
        "static"
    }

    fn collection_id(&self) -> &str {
        &self.id
    }

    async fn poll(&self, event_types: &[String]) -> anyhow::Result<Vec<SourceItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| event_type_matches(&item.item_type, event_types))
            .cloned()
            .collect())
    }
}
