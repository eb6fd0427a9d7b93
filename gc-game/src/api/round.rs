//! Round endpoints: generate, evaluate and category listing
//!
//! Served under both `/api/*` (the paths the browser client calls) and the
//! bare paths.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::round::ImageSource;
use crate::words::CategorySummary;
use crate::AppState;

/// GET /generate response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Space-joined answer the client echoes back to /evaluate
    pub answer: String,
    /// PNG data URLs ordered noisiest → clean
    pub images: Vec<String>,
    pub categories: [String; 2],
    pub correct_words: [String; 2],
    pub image_source: ImageSource,
}

/// POST /evaluate body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub user_guess: String,
    pub answer: String,
}

/// POST /evaluate response
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    /// "1" for a match, "0" otherwise
    pub score: &'static str,
    pub status: &'static str,
    pub judgment: String,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategorySummary>,
}

/// GET /generate
pub async fn generate(State(state): State<AppState>) -> ApiResult<Json<GenerateResponse>> {
    let round = state.orchestrator.generate().await?;

    let ladder = round.ladder;
    let images = tokio::task::spawn_blocking(move || ladder.to_data_urls())
        .await
        .map_err(|e| ApiError::Internal(format!("Image encoding task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Image encoding failed: {}", e)))?;

    debug!(frames = images.len(), "Encoded noise ladder");

    Ok(Json(GenerateResponse {
        answer: round.answer.answer,
        images,
        categories: round.pair.categories(),
        correct_words: round.pair.words(),
        image_source: round.image_source,
    }))
}

/// POST /evaluate
pub async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> ApiResult<Json<EvaluateResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let scored = state
        .orchestrator
        .evaluate(&request.user_guess, &request.answer)
        .await?;

    Ok(Json(EvaluateResponse {
        score: scored.verdict.verdict.as_score(),
        status: "ok",
        judgment: scored.verdict.judgment,
    }))
}

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state.orchestrator.categories().summaries(),
    })
}

pub fn round_routes() -> Router<AppState> {
    Router::new()
        .route("/api/generate", get(generate))
        .route("/api/evaluate", post(evaluate))
        .route("/api/categories", get(list_categories))
        .route("/generate", get(generate))
        .route("/evaluate", post(evaluate))
}
