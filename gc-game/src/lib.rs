//! gc-game library - Guesscasso round service
//!
//! Two words from two categories are merged into an image prompt; the
//! generated image is degraded into a noise ladder revealed frame by frame,
//! and the player's guess is judged by a language model.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod noise;
pub mod round;
pub mod services;
pub mod words;

pub use crate::error::{ApiError, ApiResult};
pub use crate::round::RoundOrchestrator;

/// Build identity stamped by build.rs
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub built_at: &'static str,
    pub profile: &'static str,
}

pub const BUILD_INFO: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GC_GIT_HASH"),
    built_at: env!("GC_BUILT_AT"),
    profile: env!("GC_BUILD_PROFILE"),
};

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "v{} [{}] built {} ({})",
            self.version, self.git_hash, self.built_at, self.profile
        )
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only round pipeline shared by all requests
    pub orchestrator: Arc<RoundOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<RoundOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::round_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
