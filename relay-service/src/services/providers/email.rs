use super::{EmailAttachment, EmailMessage, EmailProvider, ProviderError, SendReceipt};
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{self, authentication::Credentials},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// SMTP reply codes meaning the server refused our credentials.
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

pub struct SmtpProvider {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    /// Without credentials the provider is built unconfigured; sends then fail
    /// with [`ProviderError::NotConfigured`] instead of reaching the server.
    pub fn new(config: SmtpConfig) -> Result<Self, ProviderError> {
        if !config.has_credentials() {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, ProviderError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| ProviderError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("Invalid recipient: {}", e)))?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        let html = SinglePart::html(email.body_html.clone());

        let message = match &email.attachment {
            Some(attachment) => builder.multipart(
                MultiPart::mixed()
                    .singlepart(html)
                    .singlepart(attachment_part(attachment)?),
            ),
            None => builder.singlepart(html),
        };

        message.map_err(|e| ProviderError::SendFailed(format!("Failed to build message: {}", e)))
    }
}

fn attachment_part(attachment: &EmailAttachment) -> Result<SinglePart, ProviderError> {
    let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
        ProviderError::SendFailed(format!(
            "Invalid attachment content type '{}': {}",
            attachment.content_type, e
        ))
    })?;

    Ok(Attachment::new(attachment.file_name.clone()).body(attachment.bytes.clone(), content_type))
}

fn classify_smtp_error(err: smtp::Error) -> ProviderError {
    let code = err.status().map(|code| code.to_string());

    match code.as_deref() {
        Some(code) if AUTH_FAILURE_CODES.contains(&code) => {
            ProviderError::Authentication(format!("SMTP authentication failed: {}", err))
        }
        _ if err.is_timeout() => ProviderError::Connection(format!("SMTP timeout: {}", err)),
        _ => ProviderError::SendFailed(format!("Failed to send email: {}", err)),
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailMessage) -> Result<SendReceipt, ProviderError> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("SMTP credentials are not set".to_string())
        })?;

        let message = self.build_message(email)?;

        let response = transport.send(message).await.map_err(classify_smtp_error)?;

        let provider_id = response.message().next().map(|s| s.to_string());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachment = email.attachment.is_some(),
            "Email sent successfully"
        );

        Ok(SendReceipt { provider_id })
    }

    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn sender(&self) -> &str {
        &self.config.from_email
    }

    fn server(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

/// How the mock provider answers a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    Accept,
    RejectCredentials,
    Fail,
}

/// In-memory provider used by tests; records every accepted message.
pub struct MockEmailProvider {
    sender: String,
    configured: bool,
    behavior: MockBehavior,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
            configured: true,
            behavior: MockBehavior::Accept,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new("")
        }
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<SendReceipt, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock email provider has no credentials".to_string(),
            ));
        }

        match self.behavior {
            MockBehavior::RejectCredentials => {
                return Err(ProviderError::Authentication(
                    "535 5.7.8 Username and Password not accepted".to_string(),
                ));
            }
            MockBehavior::Fail => {
                return Err(ProviderError::SendFailed("Connection reset".to_string()));
            }
            MockBehavior::Accept => {}
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().await.push(email.clone());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(SendReceipt {
            provider_id: Some(format!("mock-email-{}", count)),
        })
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn sender(&self) -> &str {
        &self.sender
    }

    fn server(&self) -> String {
        "mock.smtp.local:587".to_string()
    }
}
