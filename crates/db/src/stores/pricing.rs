//! Pricing ledger: append-only price history with an active-price pointer.
//!
//! Rotation is the one invariant-critical write in the system: a new active
//! price must deactivate the previous one for the same (line item, sale
//! unit) pair in the same transaction, or totals double count.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Row, Sqlite, Transaction};

use cartwise_core::money::round2;
use cartwise_core::{ListItemId, Price, PriceId, ProductId, SaleUnitId, UserId};

use super::{hydrate, new_id, parse_decimal, StoreError};
use crate::DbPool;

pub struct PricingLedger {
    pool: DbPool,
}

impl PricingLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new active price for a (line item, sale unit) pair,
    /// deactivate the prior one, refresh the item's price pointer and
    /// cached total. All inside one transaction; no writes on failure.
    pub async fn set_active_price(
        &self,
        user: &UserId,
        list_item_id: &ListItemId,
        sale_unit_id: &SaleUnitId,
        amount: Decimal,
    ) -> Result<Price, StoreError> {
        let row = hydrate::item_row(&self.pool, &list_item_id.0)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))?;
        if row.user_id != user.0 {
            return Err(StoreError::Forbidden);
        }

        let mut tx = self.pool.begin().await?;
        let price =
            rotate_item_price(&mut tx, &row.product_id, &list_item_id.0, &sale_unit_id.0, amount)
                .await?;
        recompute_total(&mut tx, &list_item_id.0).await?;
        tx.commit().await?;

        Ok(price)
    }
}

pub(crate) async fn rotate_item_price(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    item_id: &str,
    sale_unit_id: &str,
    amount: Decimal,
) -> Result<Price, StoreError> {
    let linked: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM list_item_sale_unit WHERE list_item_id = ? AND sale_unit_id = ?",
    )
    .bind(item_id)
    .bind(sale_unit_id)
    .fetch_optional(&mut **tx)
    .await?;
    if linked.is_none() {
        return Err(StoreError::Validation("Sale unit is not part of the line item".to_string()));
    }

    sqlx::query(
        "UPDATE price SET active = 0 WHERE list_item_id = ? AND sale_unit_id = ? AND active = 1",
    )
    .bind(item_id)
    .bind(sale_unit_id)
    .execute(&mut **tx)
    .await?;

    let price = insert_price(tx, product_id, sale_unit_id, Some(item_id), amount).await?;

    sqlx::query(
        "UPDATE list_item_sale_unit SET price_id = ? WHERE list_item_id = ? AND sale_unit_id = ?",
    )
    .bind(&price.id.0)
    .bind(item_id)
    .bind(sale_unit_id)
    .execute(&mut **tx)
    .await?;

    Ok(price)
}

/// Catalog-level rotation: the baseline price a product carries before any
/// line item exists (`list_item_id IS NULL`).
pub(crate) async fn rotate_catalog_price(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    sale_unit_id: &str,
    amount: Decimal,
) -> Result<Price, StoreError> {
    sqlx::query(
        "UPDATE price SET active = 0 \
         WHERE sale_unit_id = ? AND list_item_id IS NULL AND active = 1",
    )
    .bind(sale_unit_id)
    .execute(&mut **tx)
    .await?;

    insert_price(tx, product_id, sale_unit_id, None, amount).await
}

async fn insert_price(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    sale_unit_id: &str,
    item_id: Option<&str>,
    amount: Decimal,
) -> Result<Price, StoreError> {
    let id = new_id("price");
    let amount = round2(amount);
    let created_at = Utc::now();

    sqlx::query(
        "INSERT INTO price (id, product_id, sale_unit_id, list_item_id, amount, active, created_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&id)
    .bind(product_id)
    .bind(sale_unit_id)
    .bind(item_id)
    .bind(amount.to_string())
    .bind(created_at)
    .execute(&mut **tx)
    .await?;

    Ok(Price {
        id: PriceId(id),
        product_id: ProductId(product_id.to_string()),
        sale_unit_id: SaleUnitId(sale_unit_id.to_string()),
        list_item_id: item_id.map(|id| ListItemId(id.to_string())),
        amount,
        active: true,
        created_at,
    })
}

/// Re-derive the cached `total_price` from current quantities and active
/// prices. Must run in the same transaction as any price or quantity write.
pub(crate) async fn recompute_total(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: &str,
) -> Result<Decimal, StoreError> {
    let rows = sqlx::query(
        "SELECT lisu.quantity, pr.amount FROM list_item_sale_unit lisu \
         LEFT JOIN price pr ON pr.id = lisu.price_id \
         WHERE lisu.list_item_id = ?",
    )
    .bind(item_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut total = Decimal::ZERO;
    for row in &rows {
        let quantity: i64 = row.try_get("quantity")?;
        let amount_raw: Option<String> = row.try_get("amount")?;
        if let Some(amount_raw) = amount_raw {
            total += parse_decimal("price.amount", &amount_raw)? * Decimal::from(quantity);
        }
    }
    let total = round2(total);

    sqlx::query("UPDATE list_item SET total_price = ?, updated_at = ? WHERE id = ?")
        .bind(total.to_string())
        .bind(Utc::now())
        .bind(item_id)
        .execute(&mut **tx)
        .await?;

    Ok(total)
}
