//! Output channels: where automation notifications go.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde_json::Value;

use cadence_types::OutputConfig;

/// Default message template when an output config carries none.
pub const DEFAULT_TEMPLATE: &str = "[{{automation.name}}] {{item.title}} {{item.url}}";

/// One notification channel.
#[async_trait]
pub trait OutputChannel: Send + Sync {
    fn kind(&self) -> &str;
    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

/// Build a channel from an output config.
pub fn build_output(config: &OutputConfig) -> anyhow::Result<Box<dyn OutputChannel>> {
    match config.kind.as_str() {
        "webhook" => Ok(Box::new(WebhookOutput::from_settings(&config.settings)?)),
        "telegram" => Ok(Box::new(TelegramOutput::from_settings(&config.settings)?)),
        other => bail!("unknown output type: {other}"),
    }
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}

// ──────────────────── Webhook ────────────────────

/// Generic messaging webhook: POSTs `{"text": ...}` to an
/// allowlist-checked https URL.
pub struct WebhookOutput {
    url: String,
    client: reqwest::Client,
}

impl WebhookOutput {
    pub fn from_settings(settings: &HashMap<String, Value>) -> anyhow::Result<Self> {
        let url = settings
            .get("url")
            .and_then(Value::as_str)
            .context("webhook output requires a url")?;
        if !cadence_security::is_allowed_webhook_url(url) {
            bail!("webhook URL not allowed: {url}");
        }
        Ok(Self {
            url: url.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl OutputChannel for WebhookOutput {
    fn kind(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await
            .context("webhook request failed")?;
        if !response.status().is_success() {
            bail!("webhook returned {}", response.status());
        }
        Ok(())
    }
}

// ──────────────────── Telegram ────────────────────

#[derive(serde::Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram bot message to a fixed chat.
pub struct TelegramOutput {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramOutput {
    pub fn from_settings(settings: &HashMap<String, Value>) -> anyhow::Result<Self> {
        let bot_token = settings
            .get("bot_token")
            .and_then(Value::as_str)
            .context("telegram output requires a bot_token")?;
        let chat_id = settings
            .get("chat_id")
            .and_then(Value::as_str)
            .context("telegram output requires a chat_id")?;
        Ok(Self {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl OutputChannel for TelegramOutput {
    fn kind(&self) -> &str {
        "telegram"
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let response: TelegramResponse = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "chat_id": self.chat_id, "text": message }))
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("sendMessage response parse failed")?;
        if !response.ok {
            bail!(
                "sendMessage failed: {}",
                response.description.unwrap_or_else(|| "unknown error".into())
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_rejects_disallowed_urls() {
        for bad in [
            "http://example.com/hook",
            "https://127.0.0.1/hook",
            "https://169.254.169.254/latest/meta-data",
            "not a url",
        ] {
            let settings = HashMap::from([("url".to_string(), json!(bad))]);
            assert!(WebhookOutput::from_settings(&settings).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_webhook_accepts_public_https() {
        let settings = HashMap::from([("url".to_string(), json!("https://hooks.example.com/T/B"))]);
        let output = WebhookOutput::from_settings(&settings).unwrap();
        assert_eq!(output.kind(), "webhook");
    }

    #[test]
    fn test_webhook_requires_url_setting() {
        assert!(WebhookOutput::from_settings(&HashMap::new()).is_err());
    }

    #[test]
    fn test_telegram_requires_token_and_chat() {
        let settings = HashMap::from([("bot_token".to_string(), json!("123:ABC"))]);
        assert!(TelegramOutput::from_settings(&settings).is_err());

        let settings = HashMap::from([
            ("bot_token".to_string(), json!("123:ABC")),
            ("chat_id".to_string(), json!("42")),
        ]);
        let output = TelegramOutput::from_settings(&settings).unwrap();
        assert_eq!(output.kind(), "telegram");
    }

    #[test]
    fn test_build_output_rejects_unknown_kind() {
        let config = OutputConfig {
            kind: "pager".into(),
            enabled: true,
            template: None,
            settings: HashMap::new(),
        };
        assert!(build_output(&config).is_err());
    }
}
