//! Row loading and hydration shared by the stores. Line items are hydrated
//! the way callers consume them: product with vendor and sale units,
//! sale-unit quantity rows with their active price, and comparison members
//! one level deep.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cartwise_core::{
    ListId, ListItem, ListItemId, Price, PriceId, Product, ProductId, Recommendation, SaleUnit,
    SaleUnitId, SaleUnitQuantity, UserId, Vendor, VendorId,
};

use super::{parse_decimal, parse_decimal_opt, StoreError};
use crate::DbPool;

pub(crate) struct ItemRow {
    pub id: String,
    pub list_id: String,
    pub user_id: String,
    pub product_id: String,
    pub vendor_id: String,
    pub is_base_product: bool,
    pub is_anchored: bool,
    pub is_selected: bool,
    pub is_rejected: bool,
    pub total_price: Decimal,
    pub recommendation: Option<Recommendation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ITEM_COLUMNS: &str = "id, list_id, user_id, product_id, vendor_id, is_base_product, \
     is_anchored, is_selected, is_rejected, total_price, recommendation_item_id, \
     recommendation_saving, recommendation_reason, created_at, updated_at";

fn decode_item_row(row: &SqliteRow) -> Result<ItemRow, StoreError> {
    let total_price_raw: String = row.try_get("total_price")?;
    let recommendation_item_id: Option<String> = row.try_get("recommendation_item_id")?;
    let recommendation = match recommendation_item_id {
        Some(item_id) => {
            let saving_raw: Option<String> = row.try_get("recommendation_saving")?;
            let reason: Option<String> = row.try_get("recommendation_reason")?;
            Some(Recommendation {
                list_item_id: ListItemId(item_id),
                price_saving: parse_decimal_opt("recommendation_saving", saving_raw)?
                    .unwrap_or(Decimal::ZERO),
                reason: reason.unwrap_or_default(),
            })
        }
        None => None,
    };

    Ok(ItemRow {
        id: row.try_get("id")?,
        list_id: row.try_get("list_id")?,
        user_id: row.try_get("user_id")?,
        product_id: row.try_get("product_id")?,
        vendor_id: row.try_get("vendor_id")?,
        is_base_product: row.try_get("is_base_product")?,
        is_anchored: row.try_get("is_anchored")?,
        is_selected: row.try_get("is_selected")?,
        is_rejected: row.try_get("is_rejected")?,
        total_price: parse_decimal("total_price", &total_price_raw)?,
        recommendation,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) async fn item_row(pool: &DbPool, item_id: &str) -> Result<Option<ItemRow>, StoreError> {
    let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM list_item WHERE id = ?"))
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(decode_item_row).transpose()
}

async fn item_rows_for_list(pool: &DbPool, list_id: &str) -> Result<Vec<ItemRow>, StoreError> {
    let rows = sqlx::query(&format!(
        "SELECT {ITEM_COLUMNS} FROM list_item WHERE list_id = ? \
         ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(list_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(decode_item_row).collect()
}

async fn item_rows_for_product_number(
    pool: &DbPool,
    user_id: &str,
    product_number: &str,
) -> Result<Vec<ItemRow>, StoreError> {
    let rows = sqlx::query(
        "SELECT li.id, li.list_id, li.user_id, li.product_id, li.vendor_id, li.is_base_product, \
                li.is_anchored, li.is_selected, li.is_rejected, li.total_price, \
                li.recommendation_item_id, li.recommendation_saving, li.recommendation_reason, \
                li.created_at, li.updated_at \
         FROM list_item li \
         JOIN product p ON p.id = li.product_id \
         WHERE li.user_id = ? AND p.product_number = ? \
         ORDER BY li.created_at DESC, li.rowid DESC",
    )
    .bind(user_id)
    .bind(product_number)
    .fetch_all(pool)
    .await?;
    rows.iter().map(decode_item_row).collect()
}

pub(crate) async fn load_product(
    pool: &DbPool,
    product_id: &str,
) -> Result<Option<Product>, StoreError> {
    let row = sqlx::query(
        "SELECT p.id, p.brand, p.description, p.product_number, p.pack_size, p.category, \
                p.img_src, p.created_at, v.id AS vendor_id, v.name AS vendor_name \
         FROM product p \
         JOIN vendor v ON v.id = p.vendor_id \
         WHERE p.id = ?",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let vendor = Vendor {
        id: VendorId(row.try_get("vendor_id")?),
        name: row.try_get("vendor_name")?,
    };

    let unit_rows = sqlx::query(
        "SELECT su.id, su.unit, \
                pr.id AS price_id, pr.amount, pr.active, pr.created_at AS price_created_at \
         FROM product_sale_unit su \
         LEFT JOIN price pr \
            ON pr.sale_unit_id = su.id AND pr.list_item_id IS NULL AND pr.active = 1 \
         WHERE su.product_id = ? \
         ORDER BY su.rowid ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    let mut sale_units = Vec::with_capacity(unit_rows.len());
    for unit_row in &unit_rows {
        let sale_unit_id: String = unit_row.try_get("id")?;
        let price_id: Option<String> = unit_row.try_get("price_id")?;
        let price = match price_id {
            Some(price_id) => {
                let amount_raw: String = unit_row.try_get("amount")?;
                Some(Price {
                    id: PriceId(price_id),
                    product_id: ProductId(product_id.to_string()),
                    sale_unit_id: SaleUnitId(sale_unit_id.clone()),
                    list_item_id: None,
                    amount: parse_decimal("price.amount", &amount_raw)?,
                    active: unit_row.try_get("active")?,
                    created_at: unit_row.try_get("price_created_at")?,
                })
            }
            None => None,
        };
        sale_units.push(SaleUnit {
            id: SaleUnitId(sale_unit_id),
            product_id: ProductId(product_id.to_string()),
            unit: unit_row.try_get("unit")?,
            price,
        });
    }

    Ok(Some(Product {
        id: ProductId(row.try_get("id")?),
        vendor,
        brand: row.try_get("brand")?,
        description: row.try_get("description")?,
        product_number: row.try_get("product_number")?,
        pack_size: row.try_get("pack_size")?,
        category: row.try_get("category")?,
        img_src: row.try_get("img_src")?,
        sale_units,
        created_at: row.try_get("created_at")?,
    }))
}

async fn load_sale_unit_quantities(
    pool: &DbPool,
    item_id: &str,
) -> Result<Vec<SaleUnitQuantity>, StoreError> {
    let rows = sqlx::query(
        "SELECT lisu.sale_unit_id, lisu.quantity, su.unit, su.product_id, \
                pr.id AS price_id, pr.amount, pr.active, pr.created_at AS price_created_at \
         FROM list_item_sale_unit lisu \
         JOIN product_sale_unit su ON su.id = lisu.sale_unit_id \
         LEFT JOIN price pr ON pr.id = lisu.price_id \
         WHERE lisu.list_item_id = ? \
         ORDER BY su.rowid ASC",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await?;

    let mut quantities = Vec::with_capacity(rows.len());
    for row in &rows {
        let sale_unit_id: String = row.try_get("sale_unit_id")?;
        let product_id: String = row.try_get("product_id")?;
        let price_id: Option<String> = row.try_get("price_id")?;
        let price = match price_id {
            Some(price_id) => {
                let amount_raw: String = row.try_get("amount")?;
                Some(Price {
                    id: PriceId(price_id),
                    product_id: ProductId(product_id.clone()),
                    sale_unit_id: SaleUnitId(sale_unit_id.clone()),
                    list_item_id: Some(ListItemId(item_id.to_string())),
                    amount: parse_decimal("price.amount", &amount_raw)?,
                    active: row.try_get("active")?,
                    created_at: row.try_get("price_created_at")?,
                })
            }
            None => None,
        };
        quantities.push(SaleUnitQuantity {
            sale_unit: SaleUnit {
                id: SaleUnitId(sale_unit_id),
                product_id: ProductId(product_id),
                unit: row.try_get("unit")?,
                price: None,
            },
            quantity: row.try_get("quantity")?,
            price,
        });
    }

    Ok(quantities)
}

async fn load_members(pool: &DbPool, base_id: &str) -> Result<Vec<ListItem>, StoreError> {
    let member_ids: Vec<String> = sqlx::query_scalar(
        "SELECT comparison_item_id FROM comparison_product \
         WHERE base_item_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(base_id)
    .fetch_all(pool)
    .await?;

    let mut members = Vec::with_capacity(member_ids.len());
    for member_id in member_ids {
        // Dangling links are pruned on item removal; tolerate them here too.
        if let Some(row) = item_row(pool, &member_id).await? {
            members.push(hydrate_shallow(pool, row).await?);
        }
    }
    Ok(members)
}

// Members are hydrated one level deep only; this must not reach back into
// `load_members`.
async fn hydrate_shallow(pool: &DbPool, row: ItemRow) -> Result<ListItem, StoreError> {
    let product = load_product(pool, &row.product_id).await?.ok_or_else(|| {
        StoreError::Decode(format!("product {} missing for item {}", row.product_id, row.id))
    })?;
    let vendor = product.vendor.clone();
    let sale_unit_quantities = load_sale_unit_quantities(pool, &row.id).await?;

    Ok(ListItem {
        id: ListItemId(row.id),
        list_id: ListId(row.list_id),
        user_id: UserId(row.user_id),
        product,
        vendor,
        sale_unit_quantities,
        is_base_product: row.is_base_product,
        is_anchored: row.is_anchored,
        is_selected: row.is_selected,
        is_rejected: row.is_rejected,
        comparison_products: Vec::new(),
        recommendation: row.recommendation,
        total_price: row.total_price,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn hydrate_row(
    pool: &DbPool,
    row: ItemRow,
    with_members: bool,
) -> Result<ListItem, StoreError> {
    let mut item = hydrate_shallow(pool, row).await?;
    if with_members {
        item.comparison_products = load_members(pool, &item.id.0).await?;
    }
    Ok(item)
}

pub(crate) async fn load_item(
    pool: &DbPool,
    item_id: &str,
    with_members: bool,
) -> Result<Option<ListItem>, StoreError> {
    match item_row(pool, item_id).await? {
        Some(row) => Ok(Some(hydrate_row(pool, row, with_members).await?)),
        None => Ok(None),
    }
}

pub(crate) async fn load_items_for_list(
    pool: &DbPool,
    list_id: &str,
) -> Result<Vec<ListItem>, StoreError> {
    let rows = item_rows_for_list(pool, list_id).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(hydrate_row(pool, row, true).await?);
    }
    Ok(items)
}

pub(crate) async fn load_items_for_product_number(
    pool: &DbPool,
    user_id: &str,
    product_number: &str,
) -> Result<Vec<ListItem>, StoreError> {
    let rows = item_rows_for_product_number(pool, user_id, product_number).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(hydrate_row(pool, row, true).await?);
    }
    Ok(items)
}
