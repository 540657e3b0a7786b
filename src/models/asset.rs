use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// The current holding of one ticker within a portfolio. Unique on
// (portfolio_id, ticker); a fully liquidated holding is deleted, never kept
// at quantity zero.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Asset {
    pub id: uuid::Uuid,
    pub portfolio_id: uuid::Uuid,
    pub ticker: String,
    pub quantity: BigDecimal,
    pub average_cost: BigDecimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAsset {
    pub ticker: String,
    pub quantity: BigDecimal,
    pub average_cost: BigDecimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAsset {
    pub quantity: BigDecimal,
    pub average_cost: BigDecimal,
}

impl Asset {
    pub(crate) fn new(
        portfolio_id: uuid::Uuid,
        ticker: String,
        quantity: BigDecimal,
        average_cost: BigDecimal,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            portfolio_id,
            ticker,
            quantity,
            average_cost,
            created_at: now,
            updated_at: now,
        }
    }
}
