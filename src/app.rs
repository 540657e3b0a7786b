use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{assets, health, portfolios, stocks};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/portfolios", portfolios::router())
        .nest("/api/portfolios/:portfolio_id/assets", assets::router())
        .nest("/api/stocks", stocks::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
