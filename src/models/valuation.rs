use bigdecimal::BigDecimal;
use serde::Serialize;

// One priced position: stored quantity/cost combined with the current quote.
#[derive(Debug, Clone, Serialize)]
pub struct AssetValuation {
    pub ticker: String,
    pub quantity: BigDecimal,
    pub average_cost: BigDecimal,
    pub current_price: BigDecimal,
    pub market_value: BigDecimal,
    pub cost_basis: BigDecimal,
    pub gain_loss: BigDecimal,
    pub gain_loss_pct: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct PortfolioValuation {
    pub portfolio_id: uuid::Uuid,
    pub name: String,
    pub total_market_value: BigDecimal,
    pub total_cost_basis: BigDecimal,
    pub total_gain_loss: BigDecimal,
    pub total_gain_loss_pct: BigDecimal,
    pub positions: Vec<AssetValuation>,
}
