//! Line-item store: adding products to a list, quantity and price updates,
//! removal with comparison-link pruning, and the product-number fan-out
//! queries.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use cartwise_core::{ListId, ListItem, ListItemId, ProductSpec, SaleUnitId, UnitPrice, UserId};

use super::catalog::CatalogStore;
use super::{hydrate, new_id, pricing, StoreError};
use crate::DbPool;

#[derive(Clone, Debug)]
pub struct UnitPriceUpdate {
    pub sale_unit_id: SaleUnitId,
    pub amount: Decimal,
}

pub struct ListItemStore {
    pool: DbPool,
}

impl ListItemStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, item_id: &ListItemId) -> Result<Option<ListItem>, StoreError> {
        hydrate::load_item(&self.pool, &item_id.0, true).await
    }

    /// Resolve the product through the catalog (create or reuse), then
    /// create the line item with a quantity-0 row per sale unit. Units
    /// whose label matches a price in the payload get that price as their
    /// initial active price; the rest start without one and contribute 0.
    pub async fn add_line_item(
        &self,
        user: &UserId,
        list_id: &ListId,
        spec: &ProductSpec,
    ) -> Result<ListItem, StoreError> {
        let owner: Option<String> = sqlx::query_scalar("SELECT user_id FROM list WHERE id = ?")
            .bind(&list_id.0)
            .fetch_optional(&self.pool)
            .await?;
        match owner {
            None => return Err(StoreError::not_found("List")),
            Some(owner) if owner != user.0 => return Err(StoreError::Forbidden),
            Some(_) => {}
        }

        let product = CatalogStore::new(self.pool.clone()).create_or_get_product(spec).await?;

        let duplicate: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM list_item WHERE list_id = ? AND user_id = ? AND product_id = ?",
        )
        .bind(&list_id.0)
        .bind(&user.0)
        .bind(&product.id.0)
        .fetch_optional(&self.pool)
        .await?;
        if duplicate.is_some() {
            return Err(StoreError::Conflict("Product already in list".to_string()));
        }

        let item_id = new_id("item");
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO list_item \
                 (id, list_id, user_id, product_id, vendor_id, total_price, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, '0', ?, ?)",
        )
        .bind(&item_id)
        .bind(&list_id.0)
        .bind(&user.0)
        .bind(&product.id.0)
        .bind(&product.vendor.id.0)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for sale_unit in &product.sale_units {
            sqlx::query(
                "INSERT INTO list_item_sale_unit (list_item_id, sale_unit_id, quantity, price_id) \
                 VALUES (?, ?, 0, NULL)",
            )
            .bind(&item_id)
            .bind(&sale_unit.id.0)
            .execute(&mut *tx)
            .await?;

            let initial = spec.prices.iter().find(|price| price.unit == sale_unit.unit);
            if let Some(initial) = initial {
                pricing::rotate_item_price(
                    &mut tx,
                    &product.id.0,
                    &item_id,
                    &sale_unit.id.0,
                    initial.amount,
                )
                .await?;
            }
        }

        pricing::recompute_total(&mut tx, &item_id).await?;
        bump_items_count(&mut tx, &list_id.0).await?;
        tx.commit().await?;

        self.get(&ListItemId(item_id.clone()))
            .await?
            .ok_or_else(|| StoreError::Decode(format!("list item {item_id} vanished after create")))
    }

    /// Set a unit quantity and refresh the cached total. Fails when the
    /// (item, user, sale unit) triple does not line up, with nothing
    /// written.
    pub async fn set_quantity(
        &self,
        user: &UserId,
        item_id: &ListItemId,
        sale_unit_id: &SaleUnitId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE list_item_sale_unit SET quantity = ? \
             WHERE list_item_id = ? AND sale_unit_id = ? \
               AND EXISTS (SELECT 1 FROM list_item WHERE id = ? AND user_id = ?)",
        )
        .bind(quantity)
        .bind(&item_id.0)
        .bind(&sale_unit_id.0)
        .bind(&item_id.0)
        .bind(&user.0)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("List item or sale unit"));
        }

        pricing::recompute_total(&mut tx, &item_id.0).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Batch price update on one line item; every entry rotates through the
    /// pricing ledger inside a single transaction, all-or-nothing.
    pub async fn set_prices(
        &self,
        user: &UserId,
        item_id: &ListItemId,
        updates: &[UnitPriceUpdate],
    ) -> Result<ListItem, StoreError> {
        let row = hydrate::item_row(&self.pool, &item_id.0)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))?;
        if row.user_id != user.0 {
            return Err(StoreError::Forbidden);
        }

        let mut tx = self.pool.begin().await?;
        for update in updates {
            pricing::rotate_item_price(
                &mut tx,
                &row.product_id,
                &item_id.0,
                &update.sale_unit_id.0,
                update.amount,
            )
            .await?;
        }
        pricing::recompute_total(&mut tx, &item_id.0).await?;
        tx.commit().await?;

        self.get(item_id).await?.ok_or_else(|| StoreError::not_found("List item"))
    }

    pub async fn find_by_product_number(
        &self,
        user: &UserId,
        product_number: &str,
    ) -> Result<Vec<ListItem>, StoreError> {
        hydrate::load_items_for_product_number(&self.pool, &user.0, product_number).await
    }

    /// Fan-out price update: apply unit-label prices to every line item the
    /// user holds for this product number. Per item all-or-nothing; labels
    /// an item does not carry are skipped.
    pub async fn set_prices_by_product_number(
        &self,
        user: &UserId,
        product_number: &str,
        prices: &[UnitPrice],
    ) -> Result<Vec<ListItem>, StoreError> {
        let items = hydrate::load_items_for_product_number(&self.pool, &user.0, product_number).await?;

        for item in &items {
            let mut tx = self.pool.begin().await?;
            for price in prices {
                let row = item
                    .sale_unit_quantities
                    .iter()
                    .find(|row| row.sale_unit.unit == price.unit);
                let Some(row) = row else {
                    continue;
                };
                pricing::rotate_item_price(
                    &mut tx,
                    &item.product.id.0,
                    &item.id.0,
                    &row.sale_unit.id.0,
                    price.amount,
                )
                .await?;
            }
            pricing::recompute_total(&mut tx, &item.id.0).await?;
            tx.commit().await?;
        }

        hydrate::load_items_for_product_number(&self.pool, &user.0, product_number).await
    }

    /// Hard delete. Comparison links pointing at the removed item become
    /// dangling and are pruned here: bases whose group empties flip back to
    /// non-base, and members of a removed base lose their selection flags.
    pub async fn remove(
        &self,
        user: &UserId,
        list_id: &ListId,
        item_id: &ListItemId,
    ) -> Result<(), StoreError> {
        let row = sqlx::query("SELECT user_id, list_id FROM list_item WHERE id = ?")
            .bind(&item_id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))?;
        let owner: String = row.try_get("user_id")?;
        let item_list: String = row.try_get("list_id")?;
        if item_list != list_id.0 {
            return Err(StoreError::not_found("List item"));
        }
        if owner != user.0 {
            return Err(StoreError::Forbidden);
        }

        let mut tx = self.pool.begin().await?;

        // Members of a group this item anchored as base lose their flags.
        sqlx::query(
            "UPDATE list_item SET is_selected = 0, is_rejected = 0 \
             WHERE id IN (SELECT comparison_item_id FROM comparison_product WHERE base_item_id = ?)",
        )
        .bind(&item_id.0)
        .execute(&mut *tx)
        .await?;

        // Bases that referenced this item as a member shrink; empty groups
        // dissolve.
        let base_ids: Vec<String> = sqlx::query_scalar(
            "SELECT base_item_id FROM comparison_product WHERE comparison_item_id = ?",
        )
        .bind(&item_id.0)
        .fetch_all(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM comparison_product WHERE comparison_item_id = ?")
            .bind(&item_id.0)
            .execute(&mut *tx)
            .await?;
        for base_id in &base_ids {
            let remaining: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM comparison_product WHERE base_item_id = ?")
                    .bind(base_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if remaining == 0 {
                sqlx::query(
                    "UPDATE list_item SET is_base_product = 0, is_selected = 0, updated_at = ? \
                     WHERE id = ?",
                )
                .bind(Utc::now())
                .bind(base_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query("DELETE FROM price WHERE list_item_id = ?")
            .bind(&item_id.0)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM list_item WHERE id = ?")
            .bind(&item_id.0)
            .execute(&mut *tx)
            .await?;
        bump_items_count(&mut tx, &list_id.0).await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn bump_items_count(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    list_id: &str,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE list SET \
             items_count = (SELECT COUNT(*) FROM list_item WHERE list_id = ?), \
             updated_at = ? \
         WHERE id = ?",
    )
    .bind(list_id)
    .bind(Utc::now())
    .bind(list_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cartwise_core::{SaleUnitId, UnitPrice, UserId};

    use crate::fixtures::{product_spec, seed_line_item, seed_list, setup_pool, test_user};
    use crate::stores::comparison::ComparisonEngine;
    use crate::stores::StoreError;

    use super::{ListItemStore, UnitPriceUpdate};

    #[tokio::test]
    async fn add_creates_quantity_zero_rows_for_every_sale_unit() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let store = ListItemStore::new(pool.clone());

        let item = store
            .add_line_item(
                &user,
                &list.id,
                &product_spec("Acme Foods", "400001", &[("CS", "24.00"), ("EA", "2.00")]),
            )
            .await
            .expect("add");

        assert_eq!(item.sale_unit_quantities.len(), 2);
        assert!(item.sale_unit_quantities.iter().all(|row| row.quantity == 0));
        assert!(item.sale_unit_quantities.iter().all(|row| row.price.is_some()));
        assert_eq!(item.total_price, Decimal::ZERO);

        pool.close().await;
    }

    #[tokio::test]
    async fn duplicate_product_in_list_is_a_conflict() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let store = ListItemStore::new(pool.clone());
        let spec = product_spec("Acme Foods", "400002", &[("CS", "24.00")]);

        store.add_line_item(&user, &list.id, &spec).await.expect("first add");
        let error = store.add_line_item(&user, &list.id, &spec).await.expect_err("second add");
        assert!(matches!(error, StoreError::Conflict(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM list_item WHERE list_id = ?")
            .bind(&list.id.0)
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn units_without_a_payload_price_start_without_a_price_row() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let store = ListItemStore::new(pool.clone());

        // Seed the product with two units, then re-add with only one price.
        store
            .add_line_item(
                &user,
                &list.id,
                &product_spec("Acme Foods", "400003", &[("CS", "24.00"), ("EA", "2.00")]),
            )
            .await
            .expect("seed add");

        let other_list = seed_list(&pool, &user).await;
        let item = store
            .add_line_item(
                &user,
                &other_list.id,
                &product_spec("Acme Foods", "400003", &[("CS", "24.00")]),
            )
            .await
            .expect("partial add");

        let priced: Vec<_> =
            item.sale_unit_quantities.iter().filter(|row| row.price.is_some()).collect();
        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].sale_unit.unit, "CS");

        pool.close().await;
    }

    #[tokio::test]
    async fn set_quantity_recomputes_the_total() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let item = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "400004", &[("CS", "10.50")]),
        )
        .await;
        let sale_unit = item.sale_unit_quantities[0].sale_unit.id.clone();

        let store = ListItemStore::new(pool.clone());
        store.set_quantity(&user, &item.id, &sale_unit, 4).await.expect("set quantity");

        let refreshed = store.get(&item.id).await.expect("get").expect("present");
        assert_eq!(refreshed.total_price, Decimal::new(4200, 2));

        pool.close().await;
    }

    #[tokio::test]
    async fn set_quantity_on_foreign_sale_unit_mutates_nothing() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let item = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "400005", &[("CS", "10.50")]),
        )
        .await;

        let store = ListItemStore::new(pool.clone());
        let error = store
            .set_quantity(&user, &item.id, &SaleUnitId("su-not-mine".to_string()), 4)
            .await
            .expect_err("foreign unit");
        assert!(matches!(error, StoreError::NotFound { .. }));

        let refreshed = store.get(&item.id).await.expect("get").expect("present");
        assert_eq!(refreshed.total_price, Decimal::ZERO);
        assert!(refreshed.sale_unit_quantities.iter().all(|row| row.quantity == 0));

        pool.close().await;
    }

    #[tokio::test]
    async fn batch_price_update_is_all_or_nothing() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let item = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "400006", &[("CS", "10.00"), ("EA", "1.00")]),
        )
        .await;
        let cs_unit = item.sale_unit_quantities[0].sale_unit.id.clone();

        let store = ListItemStore::new(pool.clone());
        let error = store
            .set_prices(
                &user,
                &item.id,
                &[
                    UnitPriceUpdate { sale_unit_id: cs_unit.clone(), amount: Decimal::new(999, 2) },
                    UnitPriceUpdate {
                        sale_unit_id: SaleUnitId("su-unknown".to_string()),
                        amount: Decimal::ONE,
                    },
                ],
            )
            .await
            .expect_err("batch with foreign unit");
        assert!(matches!(error, StoreError::Validation(_)));

        // First entry must have rolled back with the batch.
        let refreshed = store.get(&item.id).await.expect("get").expect("present");
        let cs_row = refreshed
            .sale_unit_quantities
            .iter()
            .find(|row| row.sale_unit.id == cs_unit)
            .expect("CS row");
        assert_eq!(cs_row.price.as_ref().map(|price| price.amount), Some(Decimal::new(1000, 2)));

        pool.close().await;
    }

    #[tokio::test]
    async fn product_number_fan_out_updates_every_holding_item() {
        let pool = setup_pool().await;
        let user = test_user();
        let list_a = seed_list(&pool, &user).await;
        let list_b = seed_list(&pool, &user).await;
        let spec = product_spec("Acme Foods", "400007", &[("CS", "10.00")]);
        seed_line_item(&pool, &user, &list_a.id, spec.clone()).await;
        seed_line_item(&pool, &user, &list_b.id, spec).await;

        let store = ListItemStore::new(pool.clone());
        let updated = store
            .set_prices_by_product_number(
                &user,
                "400007",
                &[UnitPrice { unit: "CS".to_string(), amount: Decimal::new(850, 2) }],
            )
            .await
            .expect("fan out");

        assert_eq!(updated.len(), 2);
        for item in &updated {
            let row = &item.sale_unit_quantities[0];
            assert_eq!(row.price.as_ref().map(|price| price.amount), Some(Decimal::new(850, 2)));
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn remove_prunes_dangling_comparison_links() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let base = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "400008", &[("CS", "10.00")]),
        )
        .await;
        let member = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Best Foods", "400009", &[("CS", "8.00")]),
        )
        .await;

        let engine = ComparisonEngine::new(pool.clone());
        engine
            .add_comparison_product(&user, &base.id, Some(&member.id))
            .await
            .expect("link items");

        let store = ListItemStore::new(pool.clone());
        store.remove(&user, &list.id, &member.id).await.expect("remove member");

        let refreshed_base = store.get(&base.id).await.expect("get").expect("present");
        assert!(!refreshed_base.is_base_product);
        assert!(refreshed_base.comparison_products.is_empty());

        let dangling: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comparison_product WHERE comparison_item_id = ?")
                .bind(&member.id.0)
                .fetch_one(&pool)
                .await
                .expect("count links");
        assert_eq!(dangling, 0);

        pool.close().await;
    }

    #[tokio::test]
    async fn remove_is_ownership_checked() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let item = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "400010", &[("CS", "10.00")]),
        )
        .await;

        let store = ListItemStore::new(pool.clone());
        let error = store
            .remove(&UserId("other-user".to_string()), &list.id, &item.id)
            .await
            .expect_err("foreign remove");
        assert!(matches!(error, StoreError::Forbidden));

        pool.close().await;
    }
}
