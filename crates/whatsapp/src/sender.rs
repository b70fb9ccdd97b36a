use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use dhobi_core::config::WhatsAppConfig;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider rejected message: status {status}")]
    Rejected { status: u16 },
}

/// Outbound text delivery. At-most-once: callers log failures and never
/// retry, so delivery problems cannot stall or roll back order state.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError>;
}

/// Sends through the Graph API messages endpoint for one phone number id.
pub struct CloudApiSender {
    http: reqwest::Client,
    messages_url: String,
    access_token: SecretString,
}

impl CloudApiSender {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            messages_url: format!(
                "{}/{}/messages",
                config.api_base_url.trim_end_matches('/'),
                config.phone_number_id
            ),
            access_token: config.access_token.clone(),
        }
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

#[async_trait]
impl MessageSender for CloudApiSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "text": { "body": body },
        });

        let response = self
            .http
            .post(&self.messages_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| SendError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Rejected { status: status.as_u16() });
        }

        Ok(())
    }
}

/// Test double that records every send, optionally failing them all.
#[derive(Default)]
pub struct RecordingSender {
    sent: tokio::sync::Mutex<Vec<(String, String)>>,
    fail_sends: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails; state transitions must survive it.
    pub fn failing() -> Self {
        Self { sent: tokio::sync::Mutex::default(), fail_sends: true }
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        if self.fail_sends {
            return Err(SendError::Transport("recording sender configured to fail".to_owned()));
        }
        self.sent.lock().await.push((to.to_owned(), body.to_owned()));
        Ok(())
    }
}
