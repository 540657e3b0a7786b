use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_side", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

// Append-only record of a buy or sell event. Never mutated after insertion;
// deleting a portfolio cascades over its transactions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: uuid::Uuid,
    pub portfolio_id: uuid::Uuid,
    pub ticker: String,
    pub side: TransactionSide,
    pub quantity: BigDecimal,
    pub price_per_share: BigDecimal,
    pub total_amount: BigDecimal,
    pub fees: BigDecimal,
    pub executed_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Transaction {
    pub(crate) fn sell(
        portfolio_id: uuid::Uuid,
        ticker: String,
        quantity: BigDecimal,
        price_per_share: BigDecimal,
        total_amount: BigDecimal,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            portfolio_id,
            ticker,
            side: TransactionSide::Sell,
            quantity,
            price_per_share,
            total_amount,
            fees: BigDecimal::from(0),
            executed_at: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SellAssetRequest {
    pub quantity: BigDecimal,
    pub current_market_price: BigDecimal,
}

// A transaction enriched with the profit or loss it booked, returned from the
// sell endpoint and the history listing.
#[derive(Debug, Serialize)]
pub struct TransactionReceipt {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub realized_pnl: Option<BigDecimal>,
}
