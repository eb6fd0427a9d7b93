//! Remote collaborators used by the round orchestrator

pub mod answer_scorer;
pub mod image_synthesizer;

pub use answer_scorer::{
    parse_judgment, AnswerScorer, ChatCompletionsScorer, ScoreVerdict, ScoringError, Verdict,
};
pub use image_synthesizer::{
    HuggingFaceClient, ImageSynthesizer, SynthesisError, SynthesisRequest,
};
