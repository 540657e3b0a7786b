mod asset;
mod portfolio;
mod quote;
mod transaction;
mod valuation;

pub use asset::{Asset, CreateAsset, UpdateAsset};
pub use portfolio::{CreatePortfolio, Portfolio, UpdatePortfolio};
pub use quote::{CacheStats, MarketStatus, StockHistoryResponse, StockPriceResponse};
pub use transaction::{SellAssetRequest, Transaction, TransactionReceipt, TransactionSide};
pub use valuation::{AssetValuation, PortfolioValuation};
