//! HTTP boundary for the StockSense news/sentiment pipeline.
//!
//! Thin axum layer: routes validate input, call into the pipeline crates and
//! wrap results in the standard `ApiResponse` envelope. All real behavior
//! (fan-out, dedup, enrichment, caching) lives in `news-aggregator`.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use news_aggregator::{CompanyNameResolver, NewsAggregator, SentimentEnricher};
use pipeline_core::{PipelineError, QuoteProvider, SentimentScorer};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod news_routes;
pub mod sentiment_routes;
pub mod stock_routes;


/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Route-level error. Pipeline errors keep their taxonomy on the way out so
/// clients can tell a bad request from a flaky upstream; anything else is a
/// plain 500.
pub enum AppError {
    Pipeline(PipelineError),
    Internal(anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Pipeline(PipelineError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Pipeline(PipelineError::UpstreamUnavailable(msg)) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::Pipeline(PipelineError::Transient(msg)) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "unhandled route error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<NewsAggregator>,
    pub enricher: Arc<SentimentEnricher>,
    pub resolver: Arc<CompanyNameResolver>,
    pub quotes: Arc<dyn QuoteProvider>,
    pub sentiment: Arc<dyn SentimentScorer>,
}

impl AppState {
    pub fn new(
        news: Arc<dyn pipeline_core::NewsProvider>,
        quotes: Arc<dyn QuoteProvider>,
        sentiment: Arc<dyn SentimentScorer>,
    ) -> Self {
        Self {
            aggregator: Arc::new(NewsAggregator::new(news)),
            enricher: Arc::new(SentimentEnricher::new(Arc::clone(&sentiment))),
            resolver: Arc::new(CompanyNameResolver::new(Arc::clone(&quotes))),
            quotes,
            sentiment,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(stock_routes::stock_routes())
        .merge(news_routes::news_routes())
        .merge(sentiment_routes::sentiment_routes())
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // The news capability needs a provider credential; its absence is a
    // startup failure, not something to discover one request at a time.
    let finnhub_key = std::env::var("FINNHUB_API_KEY").map_err(|_| {
        PipelineError::UpstreamUnavailable("FINNHUB_API_KEY is not set".to_string())
    })?;

    let sentiment_url = std::env::var("SENTIMENT_SERVICE_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());

    let quotes: Arc<dyn QuoteProvider> = Arc::new(match std::env::var("YAHOO_BASE_URL") {
        Ok(base) => yahoo_client::YahooClient::with_base_url(base),
        Err(_) => yahoo_client::YahooClient::new(),
    });

    let state = AppState::new(
        Arc::new(finnhub_client::FinnhubClient::new(finnhub_key)),
        quotes,
        Arc::new(sentiment_client::SentimentClient::new(
            sentiment_url,
            Duration::from_secs(10),
        )),
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("api-server listening on {bind_addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
