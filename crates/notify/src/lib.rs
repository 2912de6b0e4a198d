//! Outbound notifications.
//!
//! The engine treats notification delivery as fire-and-forget: a failed
//! message is logged and dropped, never propagated into the acquisition
//! cycle. Chat command handling is out of scope; this crate only sends.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;

use slotrace_core::config::TelegramConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification rejected with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError>;
}

/// Swallows every message. Wired in when notifications are disabled.
#[derive(Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _recipient: &str, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Captures messages for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}

/// Sends through the Telegram Bot API (`sendMessage`).
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base_url: String,
    bot_token: SecretString,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|error| NotifyError::Transport(format!("client build failed: {error}")))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base_url,
            self.bot_token.expose_secret()
        );

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "chat_id": recipient, "text": text }))
            .send()
            .await
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "notify.telegram.rejected",
                recipient,
                status = status.as_u16(),
                "telegram rejected the message"
            );
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(())
    }
}
