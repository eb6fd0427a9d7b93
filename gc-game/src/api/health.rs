//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{AppState, BuildInfo, BUILD_INFO};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub build: BuildInfo,
    /// Number of word categories the service is drawing from
    pub categories: usize,
}

/// GET /health
///
/// Cheap liveness probe; never touches the remote collaborators.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "gc-game",
        version: BUILD_INFO.version,
        build: BUILD_INFO,
        categories: state.orchestrator.categories().len(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
