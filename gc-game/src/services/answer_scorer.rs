//! Semantic answer scoring collaborator
//!
//! A language model judges whether a free-text guess names the same two
//! words as the answer. The reply must contain a `1` (match) or `0`
//! (no match) token; anything else is an error, never a default verdict.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_SCORING_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_SCORING_MODEL: &str = "gpt-4o-mini";
const USER_AGENT: &str = concat!("Guesscasso/", env!("CARGO_PKG_VERSION"));

const SYSTEM_PROMPT: &str = "You judge a word guessing game. The answer is two words. \
Decide whether the guess names the same two concepts, allowing synonyms, plurals, \
misspellings and any word order. Reply with the single character 1 if it does and 0 if it does not.";

/// Scoring errors
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Scoring timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unrecognised judgment: {0:?}")]
    UnrecognisedJudgment(String),
}

/// Binary outcome of a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Match,
    NoMatch,
}

impl Verdict {
    /// Wire token: "1" for a match, "0" otherwise
    pub fn as_score(&self) -> &'static str {
        match self {
            Verdict::Match => "1",
            Verdict::NoMatch => "0",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

/// Verdict plus the raw judgment text it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreVerdict {
    pub verdict: Verdict,
    pub judgment: String,
}

/// Remote guess judge
#[async_trait]
pub trait AnswerScorer: Send + Sync {
    /// Identifier used in logs
    fn source_id(&self) -> &'static str;

    async fn judge(&self, guess: &str, answer: &str) -> Result<ScoreVerdict, ScoringError>;
}

/// Interpret a model reply as a verdict
///
/// The first standalone `0` or `1` token wins.
pub fn parse_judgment(raw: &str) -> Result<Verdict, ScoringError> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|token| match token {
            "1" => Some(Verdict::Match),
            "0" => Some(Verdict::NoMatch),
            _ => None,
        })
        .ok_or_else(|| ScoringError::UnrecognisedJudgment(raw.to_string()))
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Scorer backed by an OpenAI-compatible chat completions endpoint
pub struct ChatCompletionsScorer {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsScorer {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl AnswerScorer for ChatCompletionsScorer {
    fn source_id(&self) -> &'static str {
        "ChatCompletions"
    }

    async fn judge(&self, guess: &str, answer: &str) -> Result<ScoreVerdict, ScoringError> {
        let user_prompt = format!("Answer: {}\nGuess: {}", answer, guess);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: 4,
        };

        let started = Instant::now();
        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ScoringError::Timeout(started.elapsed())
            } else {
                ScoringError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::Parse(e.to_string()))?;
        let judgment = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ScoringError::Parse("response has no message content".to_string()))?;

        let verdict = parse_judgment(&judgment)?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            score = verdict.as_score(),
            "Scoring complete"
        );

        Ok(ScoreVerdict { verdict, judgment })
    }
}
