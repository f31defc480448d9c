use chrono::NaiveDate;
use finnhub_client::FinnhubClient;
use httpmock::prelude::*;
use pipeline_core::{NewsProvider, PipelineError};
use serde_json::json;

fn client(server: &MockServer) -> FinnhubClient {
    FinnhubClient::with_base_url("test-token".to_string(), server.base_url(), 1000)
}

#[tokio::test]
async fn market_news_sends_category_and_token() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/news")
            .query_param("category", "business")
            .query_param("token", "test-token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {
                    "category": "business",
                    "datetime": 1_700_000_000,
                    "headline": "Markets rally on rate cut hopes",
                    "id": 7_212_345,
                    "image": "https://example.com/a.png",
                    "related": "",
                    "source": "Reuters",
                    "summary": "Stocks climbed broadly.",
                    "url": "https://example.com/article"
                }
            ]));
    });

    let news = client(&server)
        .latest_by_category("business")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(news.len(), 1);
    let first = &news[0];
    assert_eq!(first.id.as_deref(), Some("7212345"));
    assert_eq!(first.headline.as_deref(), Some("Markets rally on rate cut hopes"));
    assert_eq!(first.source, "Reuters");
    assert_eq!(first.datetime, 1_700_000_000);
    assert!(first.related.is_empty());
    assert!(first.sentiment.is_none());
}

#[tokio::test]
async fn company_news_formats_date_window() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/company-news")
            .query_param("symbol", "AAPL")
            .query_param("from", "2026-08-23")
            .query_param("to", "2026-08-30")
            .query_param("token", "test-token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {
                    "datetime": 1_700_000_100,
                    "headline": "Apple beats estimates",
                    "related": "AAPL, MSFT",
                    "source": "Bloomberg",
                    "summary": "",
                    "url": "https://example.com/aapl"
                }
            ]));
    });

    let news = client(&server)
        .company_news(
            "aapl",
            NaiveDate::from_ymd_opt(2026, 8, 23).unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        )
        .await
        .unwrap();

    mock.assert();
    assert_eq!(news.len(), 1);
    // Comma-separated `related` string is split and uppercased; empty summary
    // is normalized to absent.
    assert_eq!(news[0].related, vec!["AAPL", "MSFT"]);
    assert!(news[0].summary.is_none());
    assert!(news[0].id.is_none());
}

#[tokio::test]
async fn non_success_status_is_a_transient_failure() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/news");
        then.status(502).body("bad gateway");
    });

    let err = client(&server)
        .latest_by_category("general")
        .await
        .unwrap_err();

    match err {
        PipelineError::Transient(msg) => assert!(msg.contains("502")),
        other => panic!("expected transient failure, got {other:?}"),
    }
}
