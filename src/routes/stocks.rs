use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{MarketStatus, StockHistoryResponse, StockPriceResponse};
use crate::services::mock_prices::SYNTHETIC_SOURCE;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol/price", get(get_stock_price))
        .route("/:symbol/history", get(get_stock_history))
        .route("/market/status", get(get_market_status))
        .route("/market/refresh-cache", post(refresh_cache))
}

pub async fn get_stock_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockPriceResponse>, AppError> {
    info!("GET /stocks/{}/price - Fetching price", symbol);
    let price = state.market_data.get_price(&symbol).await.map_err(|e| {
        error!("Failed to fetch price for {}: {}", symbol, e);
        e
    })?;
    Ok(Json(StockPriceResponse {
        symbol: symbol.trim().to_uppercase(),
        price,
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_days")]
    days: u32,
}

fn default_days() -> u32 {
    30
}

// The gateway hands back an empty series when neither the provider nor the
// cache has data; substituting the synthetic walk and labeling it is this
// layer's job, not the gateway's.
pub async fn get_stock_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<StockHistoryResponse>, AppError> {
    info!(
        "GET /stocks/{}/history?days={} - Fetching history",
        symbol, params.days
    );
    let bars = state
        .market_data
        .get_history(&symbol, params.days)
        .await
        .map_err(|e| {
            error!("Failed to fetch history for {}: {}", symbol, e);
            e
        })?;

    let (points, data_source) = if bars.is_empty() {
        let synthetic = state.market_data.synthetic_history(&symbol, params.days).await?;
        (synthetic, SYNTHETIC_SOURCE.to_string())
    } else {
        (bars, state.market_data.provider_name().to_string())
    };

    Ok(Json(StockHistoryResponse {
        symbol: symbol.trim().to_uppercase(),
        data_source,
        points,
    }))
}

pub async fn get_market_status(State(state): State<AppState>) -> Json<MarketStatus> {
    info!("GET /stocks/market/status - Reporting service status");
    Json(state.market_data.status())
}

pub async fn refresh_cache(State(state): State<AppState>) -> Json<Value> {
    info!("POST /stocks/market/refresh-cache - Clearing quote caches");
    state.market_data.refresh_cache();
    Json(json!({
        "message": "Cache refreshed successfully",
        "timestamp": Utc::now(),
    }))
}
