use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Asset;

const ASSET_COLUMNS: &str =
    "id, portfolio_id, ticker, quantity, average_cost, created_at, updated_at";

pub async fn fetch_all(pool: &PgPool, portfolio_id: Uuid) -> Result<Vec<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "SELECT {ASSET_COLUMNS} FROM assets
         WHERE portfolio_id = $1
         ORDER BY ticker"
    ))
    .bind(portfolio_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_by_ticker(
    pool: &PgPool,
    portfolio_id: Uuid,
    ticker: &str,
) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "SELECT {ASSET_COLUMNS} FROM assets
         WHERE portfolio_id = $1 AND ticker = $2"
    ))
    .bind(portfolio_id)
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

pub async fn exists(
    pool: &PgPool,
    portfolio_id: Uuid,
    ticker: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM assets WHERE portfolio_id = $1 AND ticker = $2)",
    )
    .bind(portfolio_id)
    .bind(ticker)
    .fetch_one(pool)
    .await
}

pub async fn insert(pool: &PgPool, input: Asset) -> Result<Asset, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "INSERT INTO assets (id, portfolio_id, ticker, quantity, average_cost, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {ASSET_COLUMNS}"
    ))
    .bind(input.id)
    .bind(input.portfolio_id)
    .bind(input.ticker)
    .bind(input.quantity)
    .bind(input.average_cost)
    .bind(input.created_at)
    .bind(input.updated_at)
    .fetch_one(pool)
    .await
}

// Full replacement of quantity and average cost (a correction, not a blend).
pub async fn replace(
    pool: &PgPool,
    portfolio_id: Uuid,
    ticker: &str,
    quantity: BigDecimal,
    average_cost: BigDecimal,
) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "UPDATE assets
         SET quantity = $3, average_cost = $4, updated_at = now()
         WHERE portfolio_id = $1 AND ticker = $2
         RETURNING {ASSET_COLUMNS}"
    ))
    .bind(portfolio_id)
    .bind(ticker)
    .bind(quantity)
    .bind(average_cost)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, portfolio_id: Uuid, ticker: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assets WHERE portfolio_id = $1 AND ticker = $2")
        .bind(portfolio_id)
        .bind(ticker)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// Row-locked read used by the sell path. Holding the lock until the enclosing
// transaction commits serializes concurrent check-then-act sequences against
// the same position.
pub async fn lock_for_update(
    conn: &mut PgConnection,
    portfolio_id: Uuid,
    ticker: &str,
) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "SELECT {ASSET_COLUMNS} FROM assets
         WHERE portfolio_id = $1 AND ticker = $2
         FOR UPDATE"
    ))
    .bind(portfolio_id)
    .bind(ticker)
    .fetch_optional(conn)
    .await
}

pub async fn set_quantity(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: BigDecimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE assets SET quantity = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(quantity)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_by_id(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM assets WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
