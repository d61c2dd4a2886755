//! Product catalog: identity and dedup of vendor products by product
//! number. Re-adding a known product number is not an error in the
//! list-building flow; it reuses the product and applies price deltas to
//! the existing sale units.

use std::sync::Arc;

use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};

use cartwise_core::money::round2;
use cartwise_core::{Classifier, Product, ProductId, ProductSpec};

use super::{hydrate, new_id, parse_decimal, pricing, StoreError};
use crate::DbPool;

pub struct CatalogStore {
    pool: DbPool,
}

impl CatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, product_id: &ProductId) -> Result<Option<Product>, StoreError> {
        hydrate::load_product(&self.pool, &product_id.0).await
    }

    pub async fn find_by_product_number(
        &self,
        product_number: &str,
    ) -> Result<Option<Product>, StoreError> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM product WHERE product_number = ?")
                .bind(product_number)
                .fetch_optional(&self.pool)
                .await?;
        match id {
            Some(id) => hydrate::load_product(&self.pool, &id).await,
            None => Ok(None),
        }
    }

    pub async fn is_product_number_taken(&self, product_number: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_product_number(product_number).await?.is_some())
    }

    /// Create the product, its sale units and their initial active prices
    /// in one transaction; or, when the product number already exists,
    /// reuse the product and rotate catalog prices for units whose amount
    /// changed. Sale units are matched by unit label; labels the product
    /// does not carry are ignored.
    pub async fn create_or_get_product(&self, spec: &ProductSpec) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM product WHERE product_number = ?")
                .bind(&spec.product_number)
                .fetch_optional(&mut *tx)
                .await?;

        let product_id = match existing {
            Some(product_id) => {
                apply_price_deltas(&mut tx, &product_id, spec).await?;
                product_id
            }
            None => create_product(&mut tx, spec).await?,
        };

        tx.commit().await?;

        hydrate::load_product(&self.pool, &product_id).await?.ok_or_else(|| {
            StoreError::Decode(format!("product {product_id} vanished after create"))
        })
    }

    /// Best-effort category assignment. Never fails the caller: classifier
    /// errors are logged and leave the category unset.
    pub async fn assign_category(
        &self,
        product_id: &ProductId,
        classifier: Arc<dyn Classifier>,
    ) {
        let row = sqlx::query("SELECT brand, description, category FROM product WHERE id = ?")
            .bind(&product_id.0)
            .fetch_optional(&self.pool)
            .await;

        let row = match row {
            Ok(Some(row)) => row,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(product_id = %product_id.0, error = %error, "category lookup failed");
                return;
            }
        };

        let category: Option<String> = row.try_get("category").unwrap_or(None);
        if category.is_some() {
            return;
        }
        let brand: String = row.try_get("brand").unwrap_or_default();
        let description: String = row.try_get("description").unwrap_or_default();

        match classifier.categorize(&brand, &description).await {
            Ok(label) => {
                let result =
                    sqlx::query("UPDATE product SET category = ?, updated_at = ? WHERE id = ?")
                        .bind(label.trim())
                        .bind(Utc::now())
                        .bind(&product_id.0)
                        .execute(&self.pool)
                        .await;
                if let Err(error) = result {
                    tracing::warn!(product_id = %product_id.0, error = %error, "category write failed");
                }
            }
            Err(error) => {
                tracing::warn!(product_id = %product_id.0, error = %error, "categorization degraded");
            }
        }
    }
}

pub(crate) async fn get_or_create_vendor(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<String, StoreError> {
    let existing: Option<String> = sqlx::query_scalar("SELECT id FROM vendor WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = new_id("ven");
    sqlx::query("INSERT INTO vendor (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
    Ok(id)
}

async fn create_product(
    tx: &mut Transaction<'_, Sqlite>,
    spec: &ProductSpec,
) -> Result<String, StoreError> {
    let vendor_id = get_or_create_vendor(tx, &spec.vendor).await?;
    let product_id = new_id("prod");
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO product \
             (id, vendor_id, brand, description, product_number, pack_size, category, img_src, \
              created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)",
    )
    .bind(&product_id)
    .bind(&vendor_id)
    .bind(&spec.brand)
    .bind(&spec.description)
    .bind(&spec.product_number)
    .bind(&spec.pack_size)
    .bind(&spec.img_src)
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    for unit_price in &spec.prices {
        let sale_unit_id = new_id("su");
        sqlx::query(
            "INSERT INTO product_sale_unit (id, product_id, unit, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&sale_unit_id)
        .bind(&product_id)
        .bind(&unit_price.unit)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        pricing::rotate_catalog_price(tx, &product_id, &sale_unit_id, unit_price.amount).await?;
    }

    Ok(product_id)
}

/// The sale-unit list of an existing product is fixed; only prices move.
async fn apply_price_deltas(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    spec: &ProductSpec,
) -> Result<(), StoreError> {
    for unit_price in &spec.prices {
        let unit_row = sqlx::query(
            "SELECT su.id, pr.amount FROM product_sale_unit su \
             LEFT JOIN price pr \
                ON pr.sale_unit_id = su.id AND pr.list_item_id IS NULL AND pr.active = 1 \
             WHERE su.product_id = ? AND su.unit = ?",
        )
        .bind(product_id)
        .bind(&unit_price.unit)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(unit_row) = unit_row else {
            continue;
        };
        let sale_unit_id: String = unit_row.try_get("id")?;
        let current: Option<String> = unit_row.try_get("amount")?;
        let unchanged = match current {
            Some(raw) => parse_decimal("price.amount", &raw)? == round2(unit_price.amount),
            None => false,
        };
        if unchanged {
            continue;
        }

        pricing::rotate_catalog_price(tx, product_id, &sale_unit_id, unit_price.amount).await?;
    }

    sqlx::query("UPDATE product SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::fixtures::{product_spec, setup_pool};

    use super::CatalogStore;

    #[tokio::test]
    async fn creates_product_with_sale_units_and_initial_prices() {
        let pool = setup_pool().await;
        let catalog = CatalogStore::new(pool.clone());

        let product = catalog
            .create_or_get_product(&product_spec(
                "Acme Foods",
                "200001",
                &[("CS", "24.99"), ("EA", "2.49")],
            ))
            .await
            .expect("create product");

        assert_eq!(product.sale_units.len(), 2);
        let case = product.sale_units.iter().find(|unit| unit.unit == "CS").expect("CS unit");
        assert_eq!(case.price.as_ref().map(|price| price.amount), Some(Decimal::new(2499, 2)));

        pool.close().await;
    }

    #[tokio::test]
    async fn re_adding_a_product_number_reuses_the_product() {
        let pool = setup_pool().await;
        let catalog = CatalogStore::new(pool.clone());

        let first = catalog
            .create_or_get_product(&product_spec("Acme Foods", "200002", &[("CS", "24.99")]))
            .await
            .expect("create");
        let second = catalog
            .create_or_get_product(&product_spec("Acme Foods", "200002", &[("CS", "19.99")]))
            .await
            .expect("reuse");

        assert_eq!(first.id, second.id);
        let unit = &second.sale_units[0];
        assert_eq!(unit.price.as_ref().map(|price| price.amount), Some(Decimal::new(1999, 2)));

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE product_number = '200002'")
                .fetch_one(&pool)
                .await
                .expect("count products");
        assert_eq!(product_count, 1);

        let active_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM price \
             WHERE sale_unit_id = ? AND list_item_id IS NULL AND active = 1",
        )
        .bind(&unit.id.0)
        .fetch_one(&pool)
        .await
        .expect("count active");
        assert_eq!(active_count, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_unit_labels_are_ignored_on_re_add() {
        let pool = setup_pool().await;
        let catalog = CatalogStore::new(pool.clone());

        catalog
            .create_or_get_product(&product_spec("Acme Foods", "200003", &[("CS", "24.99")]))
            .await
            .expect("create");
        let reused = catalog
            .create_or_get_product(&product_spec("Acme Foods", "200003", &[("PALLET", "99.99")]))
            .await
            .expect("reuse");

        assert_eq!(reused.sale_units.len(), 1);
        assert_eq!(reused.sale_units[0].unit, "CS");

        pool.close().await;
    }

    #[tokio::test]
    async fn vendors_are_shared_across_products() {
        let pool = setup_pool().await;
        let catalog = CatalogStore::new(pool.clone());

        let first = catalog
            .create_or_get_product(&product_spec("Acme Foods", "200004", &[("CS", "1.00")]))
            .await
            .expect("first");
        let second = catalog
            .create_or_get_product(&product_spec("Acme Foods", "200005", &[("CS", "2.00")]))
            .await
            .expect("second");

        assert_eq!(first.vendor.id, second.vendor.id);

        pool.close().await;
    }
}
