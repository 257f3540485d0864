//! Outbound notification when a chat message has been stored.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use db::models::chat::ChatMessage;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("invalid webhook url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
}

impl WebhookError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            Self::InvalidUrl(_) => false,
        }
    }
}

/// Receives every chat message right after it is stored.
#[async_trait]
pub trait MessageSentSink: Send + Sync {
    async fn message_sent(&self, message: &ChatMessage);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl MessageSentSink for NoopSink {
    async fn message_sent(&self, _message: &ChatMessage) {}
}

/// POSTs `[message]` as JSON to a configured URL. Delivery runs on its own
/// task so senders never wait on the remote end.
#[derive(Debug, Clone)]
pub struct MessageSentWebhook {
    http: Client,
    url: Option<Url>,
}

impl MessageSentWebhook {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: Option<&str>) -> Result<Self, WebhookError> {
        let url = url
            .map(|raw| Url::parse(raw).map_err(|e| WebhookError::InvalidUrl(format!("{raw}: {e}"))))
            .transpose()?;
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("digihome/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebhookError::Transport(e.to_string()))?;
        Ok(Self { http, url })
    }

    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            url: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Deliver one message, retrying transient failures.
    pub async fn deliver(&self, message: &ChatMessage) -> Result<(), WebhookError> {
        let Some(url) = &self.url else {
            return Ok(());
        };
        let payload = [message];

        (|| async { self.post(url, &payload).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(5))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &WebhookError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "message-sent webhook failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn post(&self, url: &Url, payload: &[&ChatMessage; 1]) -> Result<(), WebhookError> {
        let res = self
            .http
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(WebhookError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl MessageSentSink for MessageSentWebhook {
    async fn message_sent(&self, message: &ChatMessage) {
        if !self.is_enabled() {
            return;
        }
        let webhook = self.clone();
        let message = message.clone();
        tokio::spawn(async move {
            match webhook.deliver(&message).await {
                Ok(()) => debug!(message_id = %message.id, "message-sent webhook delivered"),
                Err(e) => warn!(message_id = %message.id, error = %e, "message-sent webhook failed"),
            }
        });
    }
}

fn map_reqwest_error(e: reqwest::Error) -> WebhookError {
    if e.is_timeout() {
        WebhookError::Timeout
    } else {
        WebhookError::Transport(e.to_string())
    }
}
