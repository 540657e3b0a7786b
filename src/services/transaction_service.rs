use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{TransactionReceipt, TransactionSide};
use crate::utils::round_money;

/// A portfolio's append-only trade log, newest first. SELL rows get their
/// realized P&L recomputed against the position's current average cost while
/// one survives; once the position is gone there is no basis left to price
/// the row against.
pub async fn history(
    pool: &PgPool,
    portfolio_id: Uuid,
) -> Result<Vec<TransactionReceipt>, AppError> {
    if !db::portfolio_queries::exists(pool, portfolio_id).await? {
        return Err(AppError::NotFound(format!(
            "Portfolio not found with id: {portfolio_id}"
        )));
    }

    let transactions = db::transaction_queries::fetch_by_portfolio(pool, portfolio_id).await?;

    let mut receipts = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        let realized_pnl = match transaction.side {
            TransactionSide::Sell => {
                db::asset_queries::fetch_by_ticker(pool, portfolio_id, &transaction.ticker)
                    .await?
                    .map(|asset| {
                        let cost_basis = &asset.average_cost * &transaction.quantity;
                        round_money(&(&transaction.total_amount - cost_basis))
                    })
            }
            TransactionSide::Buy => None,
        };
        receipts.push(TransactionReceipt {
            transaction,
            realized_pnl,
        });
    }
    Ok(receipts)
}
