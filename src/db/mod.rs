pub mod asset_queries;
pub mod portfolio_queries;
pub mod transaction_queries;
