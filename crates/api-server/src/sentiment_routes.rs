//! Direct sentiment analysis endpoint.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use pipeline_core::{PipelineError, SentimentVerdict};
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
}

pub fn sentiment_routes() -> Router<AppState> {
    Router::new().route("/api/sentiment/analyze", post(analyze))
}

/// Score a piece of text. Empty text is the caller's mistake and comes back
/// as 400; an unreachable scorer is ours and degrades to a neutral verdict
/// so clients keep rendering.
async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<SentimentVerdict>>, AppError> {
    let text = req.text.as_deref().unwrap_or("").trim().to_string();
    if text.is_empty() {
        return Err(PipelineError::Validation("Text cannot be empty".to_string()).into());
    }

    let ticker = req.ticker.as_deref().unwrap_or("").trim().to_string();

    let verdict = match state.sentiment.analyze(&text, &ticker).await {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::warn!(error = %e, "sentiment analysis failed, returning neutral");
            SentimentVerdict::neutral()
        }
    };

    Ok(Json(ApiResponse::success(verdict)))
}
