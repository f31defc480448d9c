use std::time::Duration;

use httpmock::prelude::*;
use pipeline_core::{PipelineError, SentimentLabel};
use sentiment_client::SentimentClient;
use serde_json::json;

fn client(server: &MockServer) -> SentimentClient {
    SentimentClient::new(server.base_url(), Duration::from_secs(10))
}

#[tokio::test]
async fn analyze_posts_text_and_uppercased_ticker() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path("/analyze").json_body(json!({
            "text": "Apple beats estimates. Strong iPhone demand.",
            "ticker": "AAPL"
        }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "sentiment": "positive", "sentiment_score": 0.87 }));
    });

    let verdict = client(&server)
        .analyze_sentiment("Apple beats estimates. Strong iPhone demand.", "aapl")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(verdict.label, SentimentLabel::Positive);
    assert!((verdict.score - 0.87).abs() < 1e-9);
}

#[tokio::test]
async fn negative_signed_score_keeps_magnitude_only() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "sentiment": "negative", "sentiment_score": -0.62 }));
    });

    let verdict = client(&server)
        .analyze_sentiment("Stock plunges on weak guidance", "TSLA")
        .await
        .unwrap();

    assert_eq!(verdict.label, SentimentLabel::Negative);
    assert!((verdict.score - 0.62).abs() < 1e-9);
}

#[tokio::test]
async fn blank_ticker_falls_back_to_general_market() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/analyze")
            .json_body(json!({ "text": "Fed holds rates", "ticker": "GENERAL MARKET" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "sentiment": "neutral", "sentiment_score": 0.0 }));
    });

    client(&server)
        .analyze_sentiment("Fed holds rates", "  ")
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn empty_text_is_rejected_without_a_network_call() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(200).json_body(json!({}));
    });

    let err = client(&server)
        .analyze_sentiment("   ", "AAPL")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)));
    mock.assert_hits(0);
}

#[tokio::test]
async fn upstream_failure_is_transient_not_neutral() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(503);
    });

    let err = client(&server)
        .analyze_sentiment("some headline", "AAPL")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Transient(_)));
}

#[tokio::test]
async fn timeout_is_reported_as_transient() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "sentiment": "neutral", "sentiment_score": 0.0 }))
            .delay(Duration::from_millis(500));
    });

    let tight = SentimentClient::new(server.base_url(), Duration::from_millis(50));
    let err = tight
        .analyze_sentiment("slow service", "AAPL")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Transient(_)));
}
