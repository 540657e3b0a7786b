pub mod asset_service;
pub mod market_data;
pub mod mock_prices;
pub mod portfolio_service;
pub mod quote_cache;
pub mod transaction_service;
