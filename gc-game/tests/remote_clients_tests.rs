//! Integration tests for the remote collaborator clients
//!
//! Uses wiremock for HTTP mocking. Covers request shape, auth header,
//! response decoding and error status mapping for both clients.

use gc_game::services::{
    AnswerScorer, ChatCompletionsScorer, HuggingFaceClient, ImageSynthesizer, ScoringError,
    SynthesisError, SynthesisRequest, Verdict,
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "test-org/test-model";

fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn request() -> SynthesisRequest {
    SynthesisRequest {
        prompt: "lion and comet merged into one entity".to_string(),
        width: 4,
        height: 4,
        num_inference_steps: 5,
        guidance_scale: 6.5,
        seed: 42,
    }
}

fn synthesizer(server: &MockServer, timeout: Duration) -> HuggingFaceClient {
    HuggingFaceClient::new(server.uri(), MODEL, Some("hf-token".to_string()), timeout).unwrap()
}

fn scorer(server: &MockServer) -> ChatCompletionsScorer {
    ChatCompletionsScorer::new(
        server.uri(),
        "judge-model",
        Some("llm-token".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

// =============================================================================
// Image synthesis
// =============================================================================

#[tokio::test]
async fn test_synthesize_decodes_png() {
    let server = MockServer::start().await;
    let expected = RgbImage::from_pixel(4, 4, Rgb([12, 34, 56]));

    Mock::given(method("POST"))
        .and(path(format!("/{}", MODEL)))
        .and(header("authorization", "Bearer hf-token"))
        .and(body_partial_json(json!({
            "inputs": "lion and comet merged into one entity",
            "parameters": { "width": 4, "height": 4, "num_inference_steps": 5, "seed": 42 }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(&expected))
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let image = synthesizer(&server, Duration::from_secs(5))
        .synthesize(&request())
        .await
        .expect("synthesis failed");
    assert_eq!(image, expected);
}

#[tokio::test]
async fn test_synthesize_maps_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}", MODEL)))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&server)
        .await;

    let err = synthesizer(&server, Duration::from_secs(5))
        .synthesize(&request())
        .await
        .unwrap_err();
    match err {
        SynthesisError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model is loading");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_synthesize_rejects_non_image_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not an image"))
        .mount(&server)
        .await;

    let err = synthesizer(&server, Duration::from_secs(5))
        .synthesize(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Decode(_)));
}

#[tokio::test]
async fn test_synthesize_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(&RgbImage::new(4, 4)))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = synthesizer(&server, Duration::from_millis(200))
        .synthesize(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Timeout(_)));
}

// =============================================================================
// Answer scoring
// =============================================================================

#[tokio::test]
async fn test_judge_match() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer llm-token"))
        .and(body_partial_json(json!({ "model": "judge-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("1")))
        .mount(&server)
        .await;

    let verdict = scorer(&server)
        .judge("big cat shooting star", "lion comet")
        .await
        .expect("judge failed");
    assert_eq!(verdict.verdict, Verdict::Match);
    assert_eq!(verdict.judgment, "1");
}

#[tokio::test]
async fn test_judge_no_match() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("0")))
        .mount(&server)
        .await;

    let verdict = scorer(&server).judge("spoon", "lion comet").await.unwrap();
    assert_eq!(verdict.verdict, Verdict::NoMatch);
}

#[tokio::test]
async fn test_judge_unrecognised_reply_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Maybe?")))
        .mount(&server)
        .await;

    let err = scorer(&server).judge("spoon", "lion comet").await.unwrap_err();
    assert!(matches!(err, ScoringError::UnrecognisedJudgment(_)));
}

#[tokio::test]
async fn test_judge_maps_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = scorer(&server).judge("spoon", "lion comet").await.unwrap_err();
    assert!(matches!(err, ScoringError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_judge_missing_content_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = scorer(&server).judge("spoon", "lion comet").await.unwrap_err();
    assert!(matches!(err, ScoringError::Parse(_)));
}
