use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{CreatePortfolio, Portfolio, UpdatePortfolio};

pub async fn create(pool: &PgPool, input: CreatePortfolio) -> Result<Portfolio, AppError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Portfolio name cannot be empty".into()));
    }
    if db::portfolio_queries::name_taken(pool, &name, None).await? {
        return Err(AppError::Duplicate(format!(
            "Portfolio with name '{name}' already exists"
        )));
    }
    let portfolio = db::portfolio_queries::insert(pool, Portfolio::new(name)).await?;
    Ok(portfolio)
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Portfolio>, AppError> {
    let portfolios = db::portfolio_queries::fetch_all(pool).await?;
    Ok(portfolios)
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Portfolio, AppError> {
    let portfolio = db::portfolio_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with id: {id}")))?;
    Ok(portfolio)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: UpdatePortfolio,
) -> Result<Portfolio, AppError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Portfolio name cannot be empty".into()));
    }
    if db::portfolio_queries::name_taken(pool, &name, Some(id)).await? {
        return Err(AppError::Duplicate(format!(
            "Portfolio with name '{name}' already exists"
        )));
    }
    let portfolio = db::portfolio_queries::update(pool, id, UpdatePortfolio { name })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with id: {id}")))?;
    Ok(portfolio)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    match db::portfolio_queries::delete(pool, id).await? {
        0 => Err(AppError::NotFound(format!("Portfolio not found with id: {id}"))),
        _ => Ok(()),
    }
}
