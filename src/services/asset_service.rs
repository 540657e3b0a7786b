use bigdecimal::BigDecimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Asset, AssetValuation, CreateAsset, PortfolioValuation, SellAssetRequest, Transaction,
    TransactionReceipt, UpdateAsset,
};
use crate::services::market_data::MarketDataService;
use crate::utils::{is_zero, round_money, round_ratio};

fn normalize_ticker(ticker: &str) -> Result<String, AppError> {
    let trimmed = ticker.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Ticker cannot be empty".into()));
    }
    Ok(trimmed.to_uppercase())
}

fn require_positive(value: &BigDecimal, what: &str) -> Result<(), AppError> {
    if *value <= BigDecimal::from(0) {
        return Err(AppError::Validation(format!("{what} must be > 0")));
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum SaleOutcome {
    FullSale,
    PartialSale { remaining: BigDecimal },
}

// The sufficiency check and the full-vs-partial split, separated from the
// row locking so the branch logic is testable on its own.
fn settle_sale(held: &BigDecimal, sold: &BigDecimal) -> Result<SaleOutcome, AppError> {
    if held < sold {
        return Err(AppError::InsufficientQuantity {
            requested: sold.clone(),
            available: held.clone(),
        });
    }
    if held == sold {
        Ok(SaleOutcome::FullSale)
    } else {
        Ok(SaleOutcome::PartialSale {
            remaining: held - sold,
        })
    }
}

/// Sale proceeds against cost basis, booked at the moment of sale.
fn realized_pnl(
    total_amount: &BigDecimal,
    quantity: &BigDecimal,
    average_cost: &BigDecimal,
) -> BigDecimal {
    round_money(&(total_amount - quantity * average_cost))
}

fn gain_loss_pct(gain_loss: &BigDecimal, cost_basis: &BigDecimal) -> BigDecimal {
    if is_zero(cost_basis) {
        return round_ratio(&BigDecimal::from(0));
    }
    (round_ratio(&(gain_loss / cost_basis)) * BigDecimal::from(100)).with_scale(4)
}

fn value_position(asset: &Asset, current_price: &BigDecimal) -> AssetValuation {
    let market_value = round_money(&(&asset.quantity * current_price));
    let cost_basis = round_money(&(&asset.quantity * &asset.average_cost));
    let gain_loss = &market_value - &cost_basis;
    let pct = gain_loss_pct(&gain_loss, &cost_basis);

    AssetValuation {
        ticker: asset.ticker.clone(),
        quantity: asset.quantity.clone(),
        average_cost: asset.average_cost.clone(),
        current_price: current_price.clone(),
        market_value,
        cost_basis,
        gain_loss,
        gain_loss_pct: pct,
    }
}

// Opening is create-only: adding to an existing position goes through
// `update`, which replaces quantity and cost outright.
pub async fn add(
    pool: &PgPool,
    portfolio_id: Uuid,
    input: CreateAsset,
) -> Result<Asset, AppError> {
    let ticker = normalize_ticker(&input.ticker)?;
    require_positive(&input.quantity, "Quantity")?;
    require_positive(&input.average_cost, "Average cost")?;

    if !db::portfolio_queries::exists(pool, portfolio_id).await? {
        return Err(AppError::NotFound(format!(
            "Portfolio not found with id: {portfolio_id}"
        )));
    }
    if db::asset_queries::exists(pool, portfolio_id, &ticker).await? {
        return Err(AppError::Duplicate(format!(
            "Asset {ticker} already exists in this portfolio"
        )));
    }

    let asset = db::asset_queries::insert(
        pool,
        Asset::new(portfolio_id, ticker, input.quantity, input.average_cost),
    )
    .await?;
    Ok(asset)
}

pub async fn list(pool: &PgPool, portfolio_id: Uuid) -> Result<Vec<Asset>, AppError> {
    if !db::portfolio_queries::exists(pool, portfolio_id).await? {
        return Err(AppError::NotFound(format!(
            "Portfolio not found with id: {portfolio_id}"
        )));
    }
    let assets = db::asset_queries::fetch_all(pool, portfolio_id).await?;
    Ok(assets)
}

pub async fn update(
    pool: &PgPool,
    portfolio_id: Uuid,
    ticker: &str,
    input: UpdateAsset,
) -> Result<Asset, AppError> {
    let ticker = normalize_ticker(ticker)?;
    require_positive(&input.quantity, "Quantity")?;
    require_positive(&input.average_cost, "Average cost")?;

    let asset =
        db::asset_queries::replace(pool, portfolio_id, &ticker, input.quantity, input.average_cost)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Asset {ticker} not found in portfolio"))
            })?;
    Ok(asset)
}

/// Sell part or all of a position at `current_market_price`. The position row
/// is read under FOR UPDATE inside one database transaction, so the quantity
/// check cannot race a concurrent sell of the same position. A full sale
/// deletes the row; a partial one reduces quantity and leaves the average
/// cost of the remaining shares untouched.
pub async fn sell(
    pool: &PgPool,
    portfolio_id: Uuid,
    ticker: &str,
    input: SellAssetRequest,
) -> Result<TransactionReceipt, AppError> {
    let ticker = normalize_ticker(ticker)?;
    require_positive(&input.quantity, "Quantity")?;
    require_positive(&input.current_market_price, "Current market price")?;

    if !db::portfolio_queries::exists(pool, portfolio_id).await? {
        return Err(AppError::NotFound(format!(
            "Portfolio not found with id: {portfolio_id}"
        )));
    }

    let mut tx = pool.begin().await?;

    let asset = db::asset_queries::lock_for_update(&mut tx, portfolio_id, &ticker)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {ticker} not found in portfolio")))?;

    let outcome = settle_sale(&asset.quantity, &input.quantity)?;

    let total_amount = round_money(&(&input.quantity * &input.current_market_price));
    let pnl = realized_pnl(&total_amount, &input.quantity, &asset.average_cost);

    let record = db::transaction_queries::insert(
        &mut tx,
        Transaction::sell(
            portfolio_id,
            ticker.clone(),
            input.quantity.clone(),
            input.current_market_price.clone(),
            total_amount,
        ),
    )
    .await?;

    match outcome {
        SaleOutcome::FullSale => {
            db::asset_queries::delete_by_id(&mut tx, asset.id).await?;
            info!("Sold entire {} position in portfolio {}", ticker, portfolio_id);
        }
        SaleOutcome::PartialSale { remaining } => {
            db::asset_queries::set_quantity(&mut tx, asset.id, remaining).await?;
        }
    }

    tx.commit().await?;

    Ok(TransactionReceipt {
        transaction: record,
        realized_pnl: Some(pnl),
    })
}

// Correction path: drops the position without writing a transaction record.
pub async fn remove(pool: &PgPool, portfolio_id: Uuid, ticker: &str) -> Result<(), AppError> {
    let ticker = normalize_ticker(ticker)?;
    match db::asset_queries::delete(pool, portfolio_id, &ticker).await? {
        0 => Err(AppError::NotFound(format!(
            "Asset {ticker} not found in portfolio"
        ))),
        _ => Ok(()),
    }
}

/// Price every position through the market-data gateway and roll the results
/// up to portfolio totals. The gateway never fails for a held ticker, so a
/// valuation only errs on a missing portfolio or a database problem.
pub async fn valuation(
    pool: &PgPool,
    market_data: &MarketDataService,
    portfolio_id: Uuid,
) -> Result<PortfolioValuation, AppError> {
    let portfolio = db::portfolio_queries::fetch_one(pool, portfolio_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with id: {portfolio_id}")))?;

    let assets = db::asset_queries::fetch_all(pool, portfolio_id).await?;

    let mut positions = Vec::with_capacity(assets.len());
    let mut total_market_value = BigDecimal::from(0);
    let mut total_cost_basis = BigDecimal::from(0);

    for asset in &assets {
        let current_price = market_data.get_price(&asset.ticker).await?;
        let position = value_position(asset, &current_price);
        total_market_value += &position.market_value;
        total_cost_basis += &position.cost_basis;
        positions.push(position);
    }

    let total_gain_loss = &total_market_value - &total_cost_basis;
    let total_gain_loss_pct = gain_loss_pct(&total_gain_loss, &total_cost_basis);

    Ok(PortfolioValuation {
        portfolio_id: portfolio.id,
        name: portfolio.name,
        total_market_value,
        total_cost_basis,
        total_gain_loss,
        total_gain_loss_pct,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn asset(quantity: &str, average_cost: &str) -> Asset {
        Asset::new(
            Uuid::new_v4(),
            "MSFT".to_string(),
            dec(quantity),
            dec(average_cost),
        )
    }

    fn pnl(quantity: &str, market_price: &str, average_cost: &str) -> BigDecimal {
        let total = round_money(&(dec(quantity) * dec(market_price)));
        realized_pnl(&total, &dec(quantity), &dec(average_cost))
    }

    #[test]
    fn test_settle_sale_full_sale_removes_position() {
        assert_eq!(settle_sale(&dec("10"), &dec("10")).unwrap(), SaleOutcome::FullSale);
        // scale must not matter for the equality check
        assert_eq!(
            settle_sale(&dec("10.00"), &dec("10")).unwrap(),
            SaleOutcome::FullSale
        );
    }

    #[test]
    fn test_settle_sale_partial_sale_leaves_remainder() {
        assert_eq!(
            settle_sale(&dec("20"), &dec("5")).unwrap(),
            SaleOutcome::PartialSale { remaining: dec("15") }
        );
    }

    #[test]
    fn test_settle_sale_oversell_is_rejected() {
        let err = settle_sale(&dec("3"), &dec("4")).unwrap_err();
        match err {
            AppError::InsufficientQuantity { requested, available } => {
                assert_eq!(requested, dec("4"));
                assert_eq!(available, dec("3"));
            }
            other => panic!("expected InsufficientQuantity, got {other:?}"),
        }
    }

    #[test]
    fn test_full_sale_pnl() {
        // open 10 @ 150, sell 10 @ 160 -> 100.00 booked
        assert_eq!(pnl("10", "160.00", "150.00"), dec("100.00"));
    }

    #[test]
    fn test_partial_sale_pnl() {
        // sell 5 of 20 @ 320 against a 300 cost basis
        assert_eq!(pnl("5", "320.00", "300.00"), dec("100.00"));
    }

    #[test]
    fn test_pnl_can_be_negative() {
        assert_eq!(pnl("4", "90.00", "100.00"), dec("-40.00"));
    }

    #[test]
    fn test_fractional_share_pnl_rounds_half_up() {
        // proceeds 33.634665 round to 33.63, cost basis 33.30 -> 0.33
        assert_eq!(pnl("0.333", "101.005", "100"), dec("0.33"));
    }

    #[test]
    fn test_value_position_math() {
        let a = asset("10", "100");
        let v = value_position(&a, &dec("120"));

        assert_eq!(v.market_value, dec("1200.00"));
        assert_eq!(v.cost_basis, dec("1000.00"));
        assert_eq!(v.gain_loss, dec("200.00"));
        assert_eq!(v.gain_loss_pct.to_string(), "20.0000");
    }

    #[test]
    fn test_value_position_loss() {
        let a = asset("8", "50");
        let v = value_position(&a, &dec("45"));

        assert_eq!(v.market_value, dec("360.00"));
        assert_eq!(v.cost_basis, dec("400.00"));
        assert_eq!(v.gain_loss, dec("-40.00"));
        assert_eq!(v.gain_loss_pct.to_string(), "-10.0000");
    }

    #[test]
    fn test_gain_loss_pct_zero_cost_basis() {
        assert_eq!(
            gain_loss_pct(&dec("100"), &dec("0")).to_string(),
            "0.0000"
        );
    }

    #[test]
    fn test_gain_loss_pct_rounds_ratio_at_four_places() {
        // 1 / 3000 = 0.000333... -> ratio rounds to 0.0003 -> 3.0000%... x100
        let pct = gain_loss_pct(&dec("1"), &dec("3000"));
        assert_eq!(pct.to_string(), "0.0300");
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("  aapl ").unwrap(), "AAPL");
        assert!(matches!(
            normalize_ticker("   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive(&dec("0.0001"), "Quantity").is_ok());
        assert!(require_positive(&dec("0"), "Quantity").is_err());
        assert!(require_positive(&dec("-1"), "Quantity").is_err());
    }
}
