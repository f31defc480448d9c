//! Quote, suggestion and index endpoints backed by the quote provider.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use pipeline_core::{PipelineError, QuoteSnapshot, SymbolSuggestion};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct TickerRequest {
    #[serde(default)]
    pub ticker: Option<String>,
}

#[derive(Deserialize)]
pub struct SuggestionsRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct StockDetails {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

impl From<QuoteSnapshot> for StockDetails {
    fn from(snapshot: QuoteSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol,
            name: snapshot.name,
            price: snapshot.price,
            currency: snapshot.currency,
        }
    }
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<SymbolSuggestion>,
}

#[derive(Serialize)]
pub struct IndicesResponse {
    pub nasdaq: StockDetails,
    pub sp500: StockDetails,
    pub dow: StockDetails,
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock-details", post(get_stock_details))
        .route("/api/stock-details/suggestions", post(get_suggestions))
        .route("/api/stock-details/indices", get(get_indices))
}

async fn get_stock_details(
    State(state): State<AppState>,
    Json(req): Json<TickerRequest>,
) -> Result<Json<ApiResponse<StockDetails>>, AppError> {
    let ticker = req.ticker.as_deref().unwrap_or("").trim().to_uppercase();
    if ticker.is_empty() {
        return Err(PipelineError::Validation("Ticker is required.".to_string()).into());
    }

    let snapshot = state.quotes.quote(&ticker).await.map_err(|e| {
        tracing::debug!(%ticker, error = %e, "quote lookup failed");
        PipelineError::Transient("Invalid ticker symbol or data not found.".to_string())
    })?;

    Ok(Json(ApiResponse::success(snapshot.into())))
}

/// Symbol suggestions for the search box. Short queries and upstream
/// failures both answer with an empty list; a flaky provider must never
/// break typing.
async fn get_suggestions(
    State(state): State<AppState>,
    Json(req): Json<SuggestionsRequest>,
) -> Json<ApiResponse<SuggestionsResponse>> {
    let query = req.query.as_deref().unwrap_or("").trim().to_string();
    if query.len() < 2 {
        return Json(ApiResponse::success(SuggestionsResponse {
            suggestions: Vec::new(),
        }));
    }

    let suggestions = match state.quotes.search(&query).await {
        Ok(results) => results,
        Err(e) => {
            tracing::debug!(%query, error = %e, "suggestion search failed");
            Vec::new()
        }
    };

    Json(ApiResponse::success(SuggestionsResponse { suggestions }))
}

async fn get_indices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IndicesResponse>>, AppError> {
    let (nasdaq, sp500, dow) = tokio::join!(
        state.quotes.quote("^IXIC"),
        state.quotes.quote("^GSPC"),
        state.quotes.quote("^DJI"),
    );

    let to_details = |result: Result<QuoteSnapshot, PipelineError>| {
        result
            .map(StockDetails::from)
            .map_err(|_| PipelineError::Transient("Failed to fetch index data.".to_string()))
    };

    Ok(Json(ApiResponse::success(IndicesResponse {
        nasdaq: to_details(nasdaq)?,
        sp500: to_details(sp500)?,
        dow: to_details(dow)?,
    })))
}
