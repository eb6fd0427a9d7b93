//! Round orchestration
//!
//! A round has two statelessly connected phases. `generate` picks a word
//! pair, asks the image collaborator for a base image and builds the noise
//! ladder. `evaluate` takes the guess plus the answer echoed back by the
//! client and asks the scoring collaborator for a verdict.
//!
//! Failure policy differs per phase: a failed image is replaced by a
//! placeholder so the round stays playable, a failed score is reported to
//! the caller.

use crate::noise::{placeholder_image, NoiseLadder, NoiseLadderBuilder};
use crate::services::{
    AnswerScorer, ImageSynthesizer, ScoreVerdict, ScoringError, SynthesisError, SynthesisRequest,
    Verdict,
};
use crate::words::{select_pair, CategoryTable, WordListError, WordPair};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Round errors surfaced to callers
#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    WordList(#[from] WordListError),

    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(#[from] ScoringError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Phase a round is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    AwaitingGeneration,
    AwaitingGuess,
    Scored,
}

/// How the two words are turned into an image prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// "{a} and {b} merged into one entity"
    #[default]
    Merged,
    /// "{a}-{b} hybrid"
    Hybrid,
}

impl PromptStyle {
    pub fn render(&self, pair: &WordPair) -> String {
        let (a, b) = (&pair.first.word, &pair.second.word);
        match self {
            PromptStyle::Merged => format!("{} and {} merged into one entity", a, b),
            PromptStyle::Hybrid => format!("{}-{} hybrid", a, b),
        }
    }
}

/// Answer and prompt derived from a word pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundAnswer {
    pub answer: String,
    pub prompt: String,
}

impl RoundAnswer {
    pub fn from_pair(pair: &WordPair, style: PromptStyle) -> Self {
        Self {
            answer: pair.answer(),
            prompt: style.render(pair),
        }
    }
}

/// Where the base image of a round came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Synthesized,
    Placeholder,
}

/// Tunables for a round, fixed at startup
#[derive(Debug, Clone)]
pub struct RoundSettings {
    pub rung_count: usize,
    pub noise_intensity: f32,
    pub width: u32,
    pub height: u32,
    pub inference_steps: u32,
    pub guidance_scale: f32,
    /// Fixed synthesis seed; a fresh one is drawn per round when `None`
    pub seed: Option<u32>,
    pub prompt_style: PromptStyle,
    pub placeholder_color: [u8; 3],
    pub synthesis_timeout: Duration,
    pub scoring_timeout: Duration,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            rung_count: crate::noise::DEFAULT_RUNG_COUNT,
            noise_intensity: crate::noise::DEFAULT_NOISE_INTENSITY,
            width: 512,
            height: 512,
            inference_steps: 5,
            guidance_scale: 6.5,
            seed: None,
            prompt_style: PromptStyle::Merged,
            placeholder_color: [0, 0, 255],
            synthesis_timeout: Duration::from_secs(60),
            scoring_timeout: Duration::from_secs(20),
        }
    }
}

/// Output of the generate phase
#[derive(Debug, Clone)]
pub struct GeneratedRound {
    pub pair: WordPair,
    pub answer: RoundAnswer,
    pub ladder: NoiseLadder,
    pub image_source: ImageSource,
    pub phase: RoundPhase,
}

/// Output of the score phase
#[derive(Debug, Clone)]
pub struct ScoredRound {
    pub verdict: ScoreVerdict,
    pub phase: RoundPhase,
}

/// Composes word selection, image synthesis, noise and scoring into rounds
///
/// Holds only read-only state; one instance serves any number of concurrent
/// rounds.
pub struct RoundOrchestrator {
    categories: Arc<CategoryTable>,
    synthesizer: Arc<dyn ImageSynthesizer>,
    scorer: Arc<dyn AnswerScorer>,
    ladder: NoiseLadderBuilder,
    settings: RoundSettings,
}

impl RoundOrchestrator {
    /// Validates the category table and ladder parameters up front so data
    /// errors stop startup rather than individual rounds.
    pub fn new(
        categories: Arc<CategoryTable>,
        synthesizer: Arc<dyn ImageSynthesizer>,
        scorer: Arc<dyn AnswerScorer>,
        settings: RoundSettings,
    ) -> Result<Self, RoundError> {
        categories.validate()?;
        if settings.width == 0 || settings.height == 0 {
            return Err(RoundError::InvalidInput(format!(
                "image dimensions must be non-zero, got {}x{}",
                settings.width, settings.height
            )));
        }
        let ladder = NoiseLadderBuilder::new(settings.rung_count, settings.noise_intensity)
            .map_err(|e| RoundError::InvalidInput(e.to_string()))?;

        Ok(Self {
            categories,
            synthesizer,
            scorer,
            ladder,
            settings,
        })
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    /// Generate phase with an entropy-seeded random source
    pub async fn generate(&self) -> Result<GeneratedRound, RoundError> {
        let mut rng = StdRng::from_entropy();
        self.generate_with_rng(&mut rng).await
    }

    /// Generate phase: pick words, synthesize (or substitute), build ladder
    pub async fn generate_with_rng(&self, rng: &mut StdRng) -> Result<GeneratedRound, RoundError> {
        let pair = select_pair(&self.categories, rng)?;
        let answer = RoundAnswer::from_pair(&pair, self.settings.prompt_style);
        let seed = self.settings.seed.unwrap_or_else(|| rng.gen());

        info!(
            categories = ?pair.categories(),
            seed,
            "Generating round"
        );

        let request = SynthesisRequest {
            prompt: answer.prompt.clone(),
            width: self.settings.width,
            height: self.settings.height,
            num_inference_steps: self.settings.inference_steps,
            guidance_scale: self.settings.guidance_scale,
            seed,
        };

        let (base, image_source) = match self.request_image(&request).await {
            Ok(image) => (image, ImageSource::Synthesized),
            Err(e) => {
                warn!(
                    source = self.synthesizer.source_id(),
                    "Image synthesis failed, using placeholder: {}", e
                );
                (self.placeholder(), ImageSource::Placeholder)
            }
        };

        let builder = self.ladder;
        let mut ladder_rng = StdRng::seed_from_u64(rng.gen());
        let ladder = tokio::task::spawn_blocking(move || builder.build(&base, &mut ladder_rng))
            .await
            .map_err(|e| RoundError::Internal(format!("Noise ladder task failed: {}", e)))?;

        Ok(GeneratedRound {
            pair,
            answer,
            ladder,
            image_source,
            phase: RoundPhase::AwaitingGuess,
        })
    }

    /// Score phase: judge `guess` against the echoed `answer`
    ///
    /// An exact match (ignoring case and spacing) and an empty guess are
    /// decided locally; everything else goes to the scoring collaborator and
    /// its failure is returned as-is.
    pub async fn evaluate(&self, guess: &str, answer: &str) -> Result<ScoredRound, RoundError> {
        let normalised_answer = normalise(answer);
        if normalised_answer.is_empty() {
            return Err(RoundError::InvalidInput("answer must not be empty".to_string()));
        }
        let normalised_guess = normalise(guess);

        let verdict = if normalised_guess.is_empty() {
            ScoreVerdict {
                verdict: Verdict::NoMatch,
                judgment: "empty guess".to_string(),
            }
        } else if normalised_guess == normalised_answer {
            ScoreVerdict {
                verdict: Verdict::Match,
                judgment: "exact match".to_string(),
            }
        } else {
            self.request_score(&normalised_guess, &normalised_answer)
                .await
                .map_err(|e| {
                    error!(source = self.scorer.source_id(), "Scoring failed: {}", e);
                    RoundError::ScoringUnavailable(e)
                })?
        };

        info!(score = verdict.verdict.as_score(), "Round scored");
        Ok(ScoredRound {
            verdict,
            phase: RoundPhase::Scored,
        })
    }

    async fn request_image(&self, request: &SynthesisRequest) -> Result<RgbImage, SynthesisError> {
        let timeout = self.settings.synthesis_timeout;
        tokio::time::timeout(timeout, self.synthesizer.synthesize(request))
            .await
            .map_err(|_| SynthesisError::Timeout(timeout))?
    }

    async fn request_score(&self, guess: &str, answer: &str) -> Result<ScoreVerdict, ScoringError> {
        let timeout = self.settings.scoring_timeout;
        tokio::time::timeout(timeout, self.scorer.judge(guess, answer))
            .await
            .map_err(|_| ScoringError::Timeout(timeout))?
    }

    fn placeholder(&self) -> RgbImage {
        placeholder_image(
            self.settings.width,
            self.settings.height,
            self.settings.placeholder_color,
        )
    }
}

/// Lower-case and collapse whitespace
fn normalise(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
