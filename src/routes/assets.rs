use axum::extract::{Path, State};
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Asset, CreateAsset, SellAssetRequest, TransactionReceipt, UpdateAsset};
use crate::services;
use crate::state::AppState;

// Nested under /api/portfolios/:portfolio_id/assets.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_asset).get(list_assets))
        .route("/:ticker", put(update_asset))
        .route("/:ticker", delete(remove_asset))
        .route("/:ticker/sell", post(sell_asset))
}

#[axum::debug_handler]
pub async fn add_asset(
    State(state): State<AppState>,
    Path(portfolio_id): Path<Uuid>,
    Json(data): Json<CreateAsset>,
) -> Result<Json<Asset>, AppError> {
    info!("POST /portfolios/{}/assets - Adding asset", portfolio_id);
    let asset = services::asset_service::add(&state.pool, portfolio_id, data)
        .await
        .map_err(|e| {
            error!("Failed to add asset to portfolio {}: {}", portfolio_id, e);
            e
        })?;
    Ok(Json(asset))
}

pub async fn list_assets(
    State(state): State<AppState>,
    Path(portfolio_id): Path<Uuid>,
) -> Result<Json<Vec<Asset>>, AppError> {
    info!("GET /portfolios/{}/assets - Listing assets", portfolio_id);
    let assets = services::asset_service::list(&state.pool, portfolio_id)
        .await
        .map_err(|e| {
            error!("Failed to list assets for portfolio {}: {}", portfolio_id, e);
            e
        })?;
    Ok(Json(assets))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Path((portfolio_id, ticker)): Path<(Uuid, String)>,
    Json(data): Json<UpdateAsset>,
) -> Result<Json<Asset>, AppError> {
    info!(
        "PUT /portfolios/{}/assets/{} - Updating asset",
        portfolio_id, ticker
    );
    let asset = services::asset_service::update(&state.pool, portfolio_id, &ticker, data)
        .await
        .map_err(|e| {
            error!("Failed to update asset {}: {}", ticker, e);
            e
        })?;
    Ok(Json(asset))
}

pub async fn sell_asset(
    State(state): State<AppState>,
    Path((portfolio_id, ticker)): Path<(Uuid, String)>,
    Json(data): Json<SellAssetRequest>,
) -> Result<Json<TransactionReceipt>, AppError> {
    info!(
        "POST /portfolios/{}/assets/{}/sell - Selling asset",
        portfolio_id, ticker
    );
    let receipt = services::asset_service::sell(&state.pool, portfolio_id, &ticker, data)
        .await
        .map_err(|e| {
            error!("Failed to sell asset {}: {}", ticker, e);
            e
        })?;
    Ok(Json(receipt))
}

pub async fn remove_asset(
    State(state): State<AppState>,
    Path((portfolio_id, ticker)): Path<(Uuid, String)>,
) -> Result<Json<()>, AppError> {
    info!(
        "DELETE /portfolios/{}/assets/{} - Removing asset",
        portfolio_id, ticker
    );
    services::asset_service::remove(&state.pool, portfolio_id, &ticker)
        .await
        .map_err(|e| {
            error!("Failed to remove asset {}: {}", ticker, e);
            e
        })?;
    Ok(Json(()))
}
