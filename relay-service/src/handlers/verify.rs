use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::models::ClassificationResult;
use crate::startup::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ClassificationResult,
}

#[tracing::instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let Json(request) = payload?;

    let title = request.title.unwrap_or_default();
    let content = request.content.unwrap_or_default();

    if title.is_empty() && content.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Title or content is required"
        )));
    }

    let result = state.classifier.classify(&title, &content).await;

    Ok(Json(VerifyResponse {
        success: true,
        result,
    }))
}
