//! Outbound integrations behind narrow traits, so handlers never talk to a
//! concrete SMTP server or model API directly.

pub mod email;
pub mod inference;

use async_trait::async_trait;
use thiserror::Error;

pub use email::{MockEmailProvider, SmtpProvider};
pub use inference::HuggingFaceProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Authentication error: {0}")]
    Authentication(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub attachment: Option<EmailAttachment>,
}

/// Provider's acknowledgement of an accepted message.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub provider_id: Option<String>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<SendReceipt, ProviderError>;
    fn is_configured(&self) -> bool;
    /// Address mail is sent from.
    fn sender(&self) -> &str;
    /// `host:port` of the submission server.
    fn server(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, params: &CompletionParams)
        -> Result<String, ProviderError>;
}
