//! Market and portfolio news endpoints.
//!
//! The portfolio path is the heavy one: fan-out aggregation, batch sentiment
//! enrichment and company-name resolution all happen here before the
//! response leaves the server. The market feed stays raw.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::future::join_all;
use pipeline_core::{NewsItem, TickerFailure};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct MarketNewsQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct PortfolioNewsQuery {
    #[serde(default)]
    pub tickers: Option<String>,
}

#[derive(Serialize)]
pub struct MarketNewsResponse {
    pub news: Vec<NewsItem>,
}

#[derive(Serialize)]
pub struct PortfolioNewsResponse {
    pub news: Vec<NewsItem>,
    pub failed: Vec<TickerFailure>,
    /// Display names for every ticker mentioned in the batch, keyed by
    /// uppercase symbol.
    pub company_names: HashMap<String, String>,
}

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock-details/news", get(get_market_news))
        .route("/api/news/portfolio", get(get_portfolio_news))
}

async fn get_market_news(
    State(state): State<AppState>,
    Query(query): Query<MarketNewsQuery>,
) -> Result<Json<ApiResponse<MarketNewsResponse>>, AppError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("general");

    let set = state.aggregator.fetch_market_news(category).await?;
    Ok(Json(ApiResponse::success(MarketNewsResponse {
        news: set.items,
    })))
}

async fn get_portfolio_news(
    State(state): State<AppState>,
    Query(query): Query<PortfolioNewsQuery>,
) -> Result<Json<ApiResponse<PortfolioNewsResponse>>, AppError> {
    let tickers: Vec<String> = query
        .tickers
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let set = state.aggregator.fetch_for_tickers(&tickers).await?;
    let news = state.enricher.enrich_all(set.items, None).await;

    // One resolution per distinct mentioned ticker; the resolver caches, so
    // repeated symbols across articles cost a single lookup.
    let mut mentioned: Vec<String> = news
        .iter()
        .flat_map(|item| item.related.iter().cloned())
        .collect();
    mentioned.sort();
    mentioned.dedup();

    let names = join_all(mentioned.iter().map(|t| state.resolver.resolve(t))).await;
    let company_names = mentioned.into_iter().zip(names).collect();

    Ok(Json(ApiResponse::success(PortfolioNewsResponse {
        news,
        failed: set.failed,
        company_names,
    })))
}
