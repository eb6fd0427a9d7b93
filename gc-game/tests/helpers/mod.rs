//! Shared fakes for gc-game integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use gc_game::round::RoundSettings;
use gc_game::services::{
    parse_judgment, AnswerScorer, ImageSynthesizer, ScoreVerdict, ScoringError, SynthesisError,
    SynthesisRequest,
};
use gc_game::words::CategoryTable;
use gc_game::{build_router, AppState, RoundOrchestrator};
use image::{Rgb, RgbImage};
use serde_json::Value;
use std::sync::Arc;

/// Synthesizer returning a solid image of the requested size
pub struct SolidSynthesizer(pub [u8; 3]);

#[async_trait]
impl ImageSynthesizer for SolidSynthesizer {
    fn source_id(&self) -> &'static str {
        "Solid"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<RgbImage, SynthesisError> {
        Ok(RgbImage::from_pixel(request.width, request.height, Rgb(self.0)))
    }
}

/// Synthesizer that always fails
pub struct FailingSynthesizer;

#[async_trait]
impl ImageSynthesizer for FailingSynthesizer {
    fn source_id(&self) -> &'static str {
        "Failing"
    }

    async fn synthesize(&self, _request: &SynthesisRequest) -> Result<RgbImage, SynthesisError> {
        Err(SynthesisError::Network("connection refused".to_string()))
    }
}

/// Scorer replying with a fixed judgment text
pub struct FixedScorer(pub &'static str);

#[async_trait]
impl AnswerScorer for FixedScorer {
    fn source_id(&self) -> &'static str {
        "Fixed"
    }

    async fn judge(&self, _guess: &str, _answer: &str) -> Result<ScoreVerdict, ScoringError> {
        Ok(ScoreVerdict {
            verdict: parse_judgment(self.0)?,
            judgment: self.0.to_string(),
        })
    }
}

/// Scorer that always fails
pub struct FailingScorer;

#[async_trait]
impl AnswerScorer for FailingScorer {
    fn source_id(&self) -> &'static str {
        "Failing"
    }

    async fn judge(&self, _guess: &str, _answer: &str) -> Result<ScoreVerdict, ScoringError> {
        Err(ScoringError::Api {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

pub fn sample_categories() -> CategoryTable {
    CategoryTable::new()
        .with_category("Animals", &["lion", "fish"])
        .with_category("Space", &["comet", "nebula"])
}

pub fn small_settings() -> RoundSettings {
    RoundSettings {
        width: 8,
        height: 8,
        ..RoundSettings::default()
    }
}

pub fn test_app(
    synthesizer: Arc<dyn ImageSynthesizer>,
    scorer: Arc<dyn AnswerScorer>,
) -> Router {
    let orchestrator = RoundOrchestrator::new(
        Arc::new(sample_categories()),
        synthesizer,
        scorer,
        small_settings(),
    )
    .expect("valid orchestrator");
    build_router(AppState::new(Arc::new(orchestrator)))
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
