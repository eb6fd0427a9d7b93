//! Text-to-image synthesis collaborator
//!
//! The orchestrator only sees the [`ImageSynthesizer`] trait. The bundled
//! implementation calls a Hugging Face text-to-image inference endpoint and
//! decodes the returned bytes into an RGB image.

use async_trait::async_trait;
use image::RgbImage;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_SYNTHESIS_ENDPOINT: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_SYNTHESIS_MODEL: &str = "stable-diffusion-v1-5/stable-diffusion-v1-5";
const USER_AGENT: &str = concat!("Guesscasso/", env!("CARGO_PKG_VERSION"));

/// Image synthesis errors
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Image synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Could not decode image: {0}")]
    Decode(String),
}

/// Parameters for one synthesis request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    #[serde(skip)]
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub seed: u32,
}

/// Remote text-to-image service
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Identifier used in logs
    fn source_id(&self) -> &'static str;

    /// Produce one base image for `request.prompt`
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<RgbImage, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct InferencePayload<'a> {
    inputs: &'a str,
    parameters: &'a SynthesisRequest,
}

/// Hugging Face text-to-image inference client
pub struct HuggingFaceClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HuggingFaceClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SynthesisError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }
}

#[async_trait]
impl ImageSynthesizer for HuggingFaceClient {
    fn source_id(&self) -> &'static str {
        "HuggingFace"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<RgbImage, SynthesisError> {
        let payload = InferencePayload {
            inputs: &request.prompt,
            parameters: request,
        };

        tracing::debug!(
            model = %self.model,
            steps = request.num_inference_steps,
            seed = request.seed,
            "Requesting image synthesis"
        );
        let started = Instant::now();

        let mut builder = self
            .http_client
            .post(self.model_url())
            .header(reqwest::header::ACCEPT, "image/png")
            .json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SynthesisError::Timeout(started.elapsed())
            } else {
                SynthesisError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| SynthesisError::Decode(e.to_string()))?
            .to_rgb8();

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            width = image.width(),
            height = image.height(),
            "Image synthesis complete"
        );
        Ok(image)
    }
}
