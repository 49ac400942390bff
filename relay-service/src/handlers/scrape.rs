use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::models::FetchResult;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub page: FetchResult,
}

#[tracing::instrument(skip(state, params))]
pub async fn scrape(
    State(state): State<AppState>,
    params: Result<Query<ScrapeParams>, QueryRejection>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let Query(params) = params?;

    let url = params
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("URL parameter is required")))?;

    match state.fetcher.fetch(&url).await {
        Ok(page) => Ok(Json(ScrapeResponse {
            success: true,
            page,
        })),
        Err(e) => Err(AppError::UpstreamError {
            message: e.to_string(),
            url: Some(url),
        }),
    }
}
