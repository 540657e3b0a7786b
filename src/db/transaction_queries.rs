use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Transaction;

const TX_COLUMNS: &str = "id, portfolio_id, ticker, side, quantity, price_per_share, \
                          total_amount, fees, executed_at, created_at";

pub async fn insert(conn: &mut PgConnection, input: Transaction) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "INSERT INTO transactions
             (id, portfolio_id, ticker, side, quantity, price_per_share,
              total_amount, fees, executed_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {TX_COLUMNS}"
    ))
    .bind(input.id)
    .bind(input.portfolio_id)
    .bind(input.ticker)
    .bind(input.side)
    .bind(input.quantity)
    .bind(input.price_per_share)
    .bind(input.total_amount)
    .bind(input.fees)
    .bind(input.executed_at)
    .bind(input.created_at)
    .fetch_one(conn)
    .await
}

pub async fn fetch_by_portfolio(
    pool: &PgPool,
    portfolio_id: Uuid,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {TX_COLUMNS} FROM transactions
         WHERE portfolio_id = $1
         ORDER BY executed_at DESC"
    ))
    .bind(portfolio_id)
    .fetch_all(pool)
    .await
}
