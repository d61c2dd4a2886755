//! List CRUD and deep hydration: a list is returned with its line items
//! newest-first, each carrying product, vendor, sale-unit quantities with
//! active prices, and comparison members one level deep.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cartwise_core::{List, ListId, UserId};

use super::{hydrate, new_id, StoreError};
use crate::pagination::{order_clause, Page, PageParams};
use crate::DbPool;

const LIST_SORT_FIELDS: &[&str] = &["created_at", "updated_at", "name", "items_count"];

pub struct ListStore {
    pool: DbPool,
}

impl ListStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &UserId) -> Result<List, StoreError> {
        let id = new_id("list");
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO list (id, user_id, name, items_count, created_at, updated_at) \
             VALUES (?, ?, 'Untitled List', 0, ?, ?)",
        )
        .bind(&id)
        .bind(&user.0)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&ListId(id.clone()))
            .await?
            .ok_or_else(|| StoreError::Decode(format!("list {id} vanished after create")))
    }

    pub async fn get(&self, list_id: &ListId) -> Result<Option<List>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, name, items_count, created_at, updated_at FROM list WHERE id = ?",
        )
        .bind(&list_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut list = decode_list_row(&row)?;
        list.items = hydrate::load_items_for_list(&self.pool, &list_id.0).await?;
        Ok(Some(list))
    }

    /// Shallow page of a user's lists; items are not hydrated here.
    pub async fn query(&self, user: &UserId, params: &PageParams) -> Result<Page<List>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM list WHERE user_id = ?")
            .bind(&user.0)
            .fetch_one(&self.pool)
            .await?;

        let order = order_clause(params.sort_by.as_deref(), LIST_SORT_FIELDS, "created_at DESC");
        let rows = sqlx::query(&format!(
            "SELECT id, user_id, name, items_count, created_at, updated_at \
             FROM list WHERE user_id = ? ORDER BY {order} LIMIT ? OFFSET ?"
        ))
        .bind(&user.0)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let results = rows.iter().map(decode_list_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(results, params, total))
    }

    pub async fn update_name(
        &self,
        user: &UserId,
        list_id: &ListId,
        name: &str,
    ) -> Result<List, StoreError> {
        self.ensure_owner(user, list_id).await?;

        sqlx::query("UPDATE list SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(&list_id.0)
            .execute(&self.pool)
            .await?;

        self.get(list_id).await?.ok_or_else(|| StoreError::not_found("List"))
    }

    /// Hard delete. Foreign keys cascade the items, their sale-unit rows,
    /// comparison links, and any derived purchase list; the price history
    /// rows are soft references and go explicitly.
    pub async fn delete(&self, user: &UserId, list_id: &ListId) -> Result<(), StoreError> {
        self.ensure_owner(user, list_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM price WHERE list_item_id IN (SELECT id FROM list_item WHERE list_id = ?)",
        )
        .bind(&list_id.0)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM list WHERE id = ?").bind(&list_id.0).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn ensure_owner(&self, user: &UserId, list_id: &ListId) -> Result<(), StoreError> {
        let owner: Option<String> = sqlx::query_scalar("SELECT user_id FROM list WHERE id = ?")
            .bind(&list_id.0)
            .fetch_optional(&self.pool)
            .await?;
        match owner {
            None => Err(StoreError::not_found("List")),
            Some(owner) if owner != user.0 => Err(StoreError::Forbidden),
            Some(_) => Ok(()),
        }
    }
}

fn decode_list_row(row: &SqliteRow) -> Result<List, StoreError> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(List {
        id: ListId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        name: row.try_get("name")?,
        items_count: row.try_get("items_count")?,
        items: Vec::new(),
        created_at,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use cartwise_core::UserId;

    use crate::fixtures::{product_spec, seed_line_item, seed_list, setup_pool, test_user};
    use crate::pagination::PageParams;
    use crate::stores::StoreError;

    use super::ListStore;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let pool = setup_pool().await;
        let user = test_user();
        let store = ListStore::new(pool.clone());

        let list = store.create(&user).await.expect("create");
        assert_eq!(list.name, "Untitled List");
        assert_eq!(list.items_count, 0);

        let fetched = store.get(&list.id).await.expect("get").expect("present");
        assert_eq!(fetched.id, list.id);

        pool.close().await;
    }

    #[tokio::test]
    async fn items_are_returned_newest_first_with_count() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;

        seed_line_item(&pool, &user, &list.id, product_spec("Acme Foods", "300001", &[("CS", "1.00")]))
            .await;
        let newest = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "300002", &[("CS", "2.00")]),
        )
        .await;

        let store = ListStore::new(pool.clone());
        let fetched = store.get(&list.id).await.expect("get").expect("present");
        assert_eq!(fetched.items_count, 2);
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].id, newest.id);

        pool.close().await;
    }

    #[tokio::test]
    async fn query_pages_per_user() {
        let pool = setup_pool().await;
        let user = test_user();
        let store = ListStore::new(pool.clone());

        for _ in 0..3 {
            store.create(&user).await.expect("create");
        }
        store.create(&UserId("other-user".to_string())).await.expect("create other");

        let page = store
            .query(&user, &PageParams { limit: 2, page: 1, sort_by: None })
            .await
            .expect("query");
        assert_eq!(page.total_results, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.results.len(), 2);

        pool.close().await;
    }

    #[tokio::test]
    async fn update_name_is_ownership_checked() {
        let pool = setup_pool().await;
        let user = test_user();
        let store = ListStore::new(pool.clone());
        let list = store.create(&user).await.expect("create");

        let renamed = store.update_name(&user, &list.id, "Friday order").await.expect("rename");
        assert_eq!(renamed.name, "Friday order");

        let error = store
            .update_name(&UserId("other-user".to_string()), &list.id, "hijack")
            .await
            .expect_err("foreign rename");
        assert!(matches!(error, StoreError::Forbidden));

        pool.close().await;
    }

    #[tokio::test]
    async fn delete_cascades_items_and_price_history() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        let item = seed_line_item(
            &pool,
            &user,
            &list.id,
            product_spec("Acme Foods", "300003", &[("CS", "4.00")]),
        )
        .await;

        let store = ListStore::new(pool.clone());
        store.delete(&user, &list.id).await.expect("delete");

        assert!(store.get(&list.id).await.expect("get").is_none());
        let leftover_items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM list_item WHERE list_id = ?")
                .bind(&list.id.0)
                .fetch_one(&pool)
                .await
                .expect("count items");
        assert_eq!(leftover_items, 0);
        let leftover_prices: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM price WHERE list_item_id = ?")
                .bind(&item.id.0)
                .fetch_one(&pool)
                .await
                .expect("count prices");
        assert_eq!(leftover_prices, 0);

        pool.close().await;
    }
}
