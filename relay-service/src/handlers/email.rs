use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::ValidateEmail;

use crate::models::Post;
use crate::services::attachment::{self, AttachmentError};
use crate::services::templates::{DigestEmail, ReportEmail, TestEmail};
use crate::services::{EmailMessage, EmailProvider, ProviderError};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub new_posts_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReportRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total_posts_count: Option<usize>,
    #[serde(default)]
    pub excel_file: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub is_manual: bool,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    #[serde(default)]
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReportResponse {
    pub success: bool,
    pub message: String,
    pub from: String,
    pub to: String,
    pub file_name: String,
    pub posts_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    pub success: bool,
    pub message: String,
    pub from: String,
    pub to: String,
    pub smtp_server: String,
}

#[tracing::instrument(skip(state, payload))]
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>, AppError> {
    let Json(request) = payload?;

    let to = require_recipient(&request.to)?;
    require_posts(&request.posts)?;
    require_configured(state.email_provider.as_ref())?;

    let count = request.new_posts_count.unwrap_or(request.posts.len());
    let subject = subject_or(request.subject, || {
        format!("New E-Invoicing Posts ({})", count)
    });
    let body_html = render(DigestEmail::new(&request.posts, Some(count)))?;

    let email = EmailMessage {
        to: to.clone(),
        subject,
        body_html,
        attachment: None,
    };
    deliver(state.email_provider.as_ref(), &email).await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: format!("Email sent successfully with {} posts", request.posts.len()),
        from: state.email_provider.sender().to_string(),
        to,
    }))
}

#[tracing::instrument(skip(state, payload))]
pub async fn send_email_with_excel(
    State(state): State<AppState>,
    payload: Result<Json<SendReportRequest>, JsonRejection>,
) -> Result<Json<SendReportResponse>, AppError> {
    let Json(request) = payload?;

    let to = require_recipient(&request.to)?;
    require_posts(&request.posts)?;

    let encoded = request
        .excel_file
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Excel file is required")))?;
    let spreadsheet =
        attachment::spreadsheet(encoded, request.file_name.as_deref()).map_err(|e| match e {
            AttachmentError::Empty => AppError::BadRequest(anyhow::anyhow!("Excel file is required")),
            other => AppError::BadRequest(anyhow::anyhow!(other)),
        })?;

    require_configured(state.email_provider.as_ref())?;

    let email_body = ReportEmail::new(
        &request.posts,
        request.total_posts_count,
        &spreadsheet.file_name,
        request.is_manual,
    );
    let total = email_body.total;
    let subject = subject_or(request.subject, || {
        format!("E-Invoicing Report ({} posts)", total)
    });
    let body_html = render(email_body)?;
    let file_name = spreadsheet.file_name.clone();

    tracing::info!(
        file_name = %file_name,
        bytes = spreadsheet.bytes.len(),
        manual = request.is_manual,
        "Sending report with spreadsheet attachment"
    );

    let email = EmailMessage {
        to: to.clone(),
        subject,
        body_html,
        attachment: Some(spreadsheet),
    };
    deliver(state.email_provider.as_ref(), &email).await?;

    Ok(Json(SendReportResponse {
        success: true,
        message: format!("Report sent successfully with {} posts", total),
        from: state.email_provider.sender().to_string(),
        to,
        file_name,
        posts_count: total,
    }))
}

#[tracing::instrument(skip(state, payload))]
pub async fn test_email(
    State(state): State<AppState>,
    payload: Result<Json<TestEmailRequest>, JsonRejection>,
) -> Result<Json<TestEmailResponse>, AppError> {
    let Json(request) = payload?;

    let to = require_recipient(&request.to)?;
    require_configured(state.email_provider.as_ref())?;

    let provider = state.email_provider.as_ref();
    let server = provider.server();
    let body_html = render(TestEmail::new(provider.sender(), &server))?;

    let email = EmailMessage {
        to: to.clone(),
        subject: "E-Invoicing Monitor - Test Email".to_string(),
        body_html,
        attachment: None,
    };

    match provider.send(&email).await {
        Ok(_) => {}
        Err(ProviderError::Authentication(msg)) => {
            tracing::warn!(server = %server, "SMTP server rejected credentials");
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "SMTP authentication failed, check the email account and app password: {}",
                msg
            )));
        }
        Err(e) => return Err(provider_error(e)),
    }

    Ok(Json(TestEmailResponse {
        success: true,
        message: "Test email sent successfully".to_string(),
        from: provider.sender().to_string(),
        to,
        smtp_server: server,
    }))
}

fn require_recipient(to: &str) -> Result<String, AppError> {
    let to = to.trim();
    if to.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Recipient email address is required"
        )));
    }
    if !to.validate_email() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid recipient email address: {}",
            to
        )));
    }
    Ok(to.to_string())
}

fn require_posts(posts: &[Post]) -> Result<(), AppError> {
    if posts.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No posts provided")));
    }
    Ok(())
}

fn require_configured(provider: &dyn EmailProvider) -> Result<(), AppError> {
    if !provider.is_configured() {
        return Err(AppError::NotConfigured(
            "Email credentials not configured".to_string(),
        ));
    }
    Ok(())
}

fn subject_or(subject: Option<String>, default: impl FnOnce() -> String) -> String {
    subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

fn render(template: impl Template) -> Result<String, AppError> {
    template
        .render()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render email: {}", e)))
}

async fn deliver(provider: &dyn EmailProvider, email: &EmailMessage) -> Result<(), AppError> {
    let receipt = provider.send(email).await.map_err(provider_error)?;
    tracing::info!(
        to = %email.to,
        provider_id = ?receipt.provider_id,
        "Notification delivered"
    );
    Ok(())
}

fn provider_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::NotConfigured(_) => {
            AppError::NotConfigured("Email credentials not configured".to_string())
        }
        ProviderError::InvalidRecipient(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        other => AppError::EmailError(other.to_string()),
    }
}
