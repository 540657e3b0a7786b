mod app;
mod db;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::external::alphavantage::AlphaVantageProvider;
use crate::external::quote_provider::QuoteProvider;
use crate::services::market_data::{MarketDataConfig, MarketDataService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let market_config = MarketDataConfig::from_env();
    let provider = Arc::new(AlphaVantageProvider::from_env(market_config.fetch_timeout));
    if provider.is_configured() {
        tracing::info!("Quote provider: Alpha Vantage");
    } else {
        tracing::warn!(
            "ALPHAVANTAGE_API_KEY not set - serving cached and mock prices only"
        );
    }

    let state = AppState {
        pool,
        market_data: Arc::new(MarketDataService::new(provider, market_config)),
    };
    let app = app::create_app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Trackfolio backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
