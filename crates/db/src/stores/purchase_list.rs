//! Purchase-list consolidation engine: full rebuild from a list's resolved
//! selections, incremental add/remove with running aggregates, and the
//! cache-on-read savings annotation.
//!
//! The purchase list is a derived artifact. The list + line-item graph
//! stays the source of truth; a rebuild recomputes every aggregate from it,
//! so drift from incremental updates never survives an upsert.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use cartwise_core::money::{round2, subtract_clamped, sum_fixed};
use cartwise_core::{
    resolve_entries, ListId, ListItemId, PriceAtOrder, PurchaseList, PurchaseListId,
    PurchaseListItem, PurchaseListItemId, Recommendation, ResolvedEntry, UserId, Vendor, VendorId,
    VendorCost,
};

use super::{hydrate, new_id, parse_decimal, parse_decimal_opt, StoreError};
use crate::pagination::{order_clause, Page, PageParams};
use crate::DbPool;

const PURCHASE_LIST_SORT_FIELDS: &[&str] =
    &["created_at", "updated_at", "name", "total_amount", "items_count"];

pub struct PurchaseListStore {
    pool: DbPool,
}

struct PurchaseListRecord {
    id: String,
    list_id: String,
    user_id: String,
    name: String,
    total_amount: Decimal,
    unselected_total_amount: Decimal,
    price_saving: Option<Decimal>,
    items_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode_purchase_list_row(row: &SqliteRow) -> Result<PurchaseListRecord, StoreError> {
    let total_raw: String = row.try_get("total_amount")?;
    let unselected_raw: String = row.try_get("unselected_total_amount")?;
    let saving_raw: Option<String> = row.try_get("price_saving")?;
    Ok(PurchaseListRecord {
        id: row.try_get("id")?,
        list_id: row.try_get("list_id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        total_amount: parse_decimal("total_amount", &total_raw)?,
        unselected_total_amount: parse_decimal("unselected_total_amount", &unselected_raw)?,
        price_saving: parse_decimal_opt("price_saving", saving_raw)?,
        items_count: row.try_get("items_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl PurchaseListStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Idempotent full rebuild: tear down any existing purchase list for
    /// the list and consolidate the current selection state from scratch,
    /// all in one transaction.
    pub async fn upsert(&self, user: &UserId, list_id: &ListId) -> Result<PurchaseList, StoreError> {
        self.rebuild(user, list_id, None).await
    }

    /// Explicit create; conflicts when the list already has a purchase
    /// list (upsert is the rebuild path).
    pub async fn create(
        &self,
        user: &UserId,
        list_id: &ListId,
        name: Option<&str>,
    ) -> Result<PurchaseList, StoreError> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM purchase_list WHERE list_id = ?")
                .bind(&list_id.0)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(
                "Purchase list already exists for this list".to_string(),
            ));
        }
        self.rebuild(user, list_id, name).await
    }

    async fn rebuild(
        &self,
        user: &UserId,
        list_id: &ListId,
        name: Option<&str>,
    ) -> Result<PurchaseList, StoreError> {
        let list_row = sqlx::query("SELECT user_id, name FROM list WHERE id = ?")
            .bind(&list_id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("List"))?;
        let owner: String = list_row.try_get("user_id")?;
        if owner != user.0 {
            return Err(StoreError::Forbidden);
        }
        let list_name: String = list_row.try_get("name")?;

        let items = hydrate::load_items_for_list(&self.pool, &list_id.0).await?;
        let entries = resolve_entries(&items);
        let totals = cartwise_core::aggregate(&entries);

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM purchase_list WHERE list_id = ?")
            .bind(&list_id.0)
            .execute(&mut *tx)
            .await?;

        let purchase_list_id = new_id("pl");
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO purchase_list \
                 (id, list_id, user_id, name, total_amount, unselected_total_amount, \
                  price_saving, items_count, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(&purchase_list_id)
        .bind(&list_id.0)
        .bind(&user.0)
        .bind(name.unwrap_or(&list_name))
        .bind(totals.total_amount.to_string())
        .bind(totals.unselected_total_amount.to_string())
        .bind(entries.len() as i64)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for entry in &entries {
            insert_entry(&mut tx, &purchase_list_id, user, entry).await?;
        }
        for bucket in &totals.additional_cost {
            sqlx::query(
                "INSERT INTO vendor_cost (purchase_list_id, vendor_id, total_amount, price_saving) \
                 VALUES (?, ?, ?, NULL)",
            )
            .bind(&purchase_list_id)
            .bind(&bucket.vendor.id.0)
            .bind(bucket.total_amount.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(&PurchaseListId(purchase_list_id.clone())).await?.ok_or_else(|| {
            StoreError::Decode(format!("purchase list {purchase_list_id} vanished after rebuild"))
        })
    }

    /// Incremental consolidation of one selected/unselected pair. Rejects
    /// a pair when either side already appears in the purchase list, then
    /// freezes the selected item's price snapshot and bumps the aggregates,
    /// all in one transaction.
    pub async fn add_item(
        &self,
        user: &UserId,
        purchase_list_id: &PurchaseListId,
        selected_id: &ListItemId,
        unselected_id: &ListItemId,
    ) -> Result<PurchaseListItem, StoreError> {
        let record = self.record(purchase_list_id).await?;
        if record.user_id != user.0 {
            return Err(StoreError::Forbidden);
        }

        let selected = hydrate::load_item(&self.pool, &selected_id.0, false)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))?;
        let unselected = hydrate::load_item(&self.pool, &unselected_id.0, false)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))?;

        let duplicate: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM purchase_list_item \
             WHERE purchase_list_id = ? \
               AND (selected_item_id IN (?, ?) OR unselected_item_id IN (?, ?))",
        )
        .bind(&record.id)
        .bind(&selected_id.0)
        .bind(&unselected_id.0)
        .bind(&selected_id.0)
        .bind(&unselected_id.0)
        .fetch_optional(&self.pool)
        .await?;
        if duplicate.is_some() {
            return Err(StoreError::Conflict(
                "List item already consolidated in this purchase list".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let entry = ResolvedEntry {
            selected: selected.clone(),
            unselected: Some(unselected.clone()),
            is_anchored: false,
            recommendation: None,
        };
        let item_id = insert_entry(&mut tx, &record.id, user, &entry).await?;

        let total = sum_fixed(record.total_amount, selected.total_price);
        let unselected_total = sum_fixed(record.unselected_total_amount, unselected.total_price);
        apply_vendor_cost(&mut tx, &record.id, &selected.vendor.id.0, selected.total_price, false)
            .await?;
        apply_vendor_cost(
            &mut tx,
            &record.id,
            &unselected.vendor.id.0,
            unselected.total_price,
            false,
        )
        .await?;
        update_totals(&mut tx, &record.id, total, unselected_total).await?;

        tx.commit().await?;

        self.load_items(purchase_list_id)
            .await?
            .into_iter()
            .find(|item| item.id.0 == item_id)
            .ok_or_else(|| StoreError::Decode(format!("purchase list item {item_id} vanished")))
    }

    /// Inverse of `add_item`: subtract the same quantities from the same
    /// aggregates (floored at zero) and drop the snapshot row.
    pub async fn remove_item(
        &self,
        user: &UserId,
        purchase_list_item_id: &PurchaseListItemId,
    ) -> Result<(), StoreError> {
        let row = sqlx::query(
            "SELECT purchase_list_id, user_id, selected_item_id, unselected_item_id \
             FROM purchase_list_item WHERE id = ?",
        )
        .bind(&purchase_list_item_id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Purchase list item"))?;

        let purchase_list_id: String = row.try_get("purchase_list_id")?;
        let owner: String = row.try_get("user_id")?;
        let selected_item_id: String = row.try_get("selected_item_id")?;
        let unselected_item_id: Option<String> = row.try_get("unselected_item_id")?;
        if owner != user.0 {
            return Err(StoreError::Forbidden);
        }

        let record = self.record(&PurchaseListId(purchase_list_id.clone())).await?;

        let selected = live_amount_and_vendor(&self.pool, &selected_item_id).await?;
        let unselected = match &unselected_item_id {
            Some(id) => live_amount_and_vendor(&self.pool, id).await?,
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM purchase_list_item WHERE id = ?")
            .bind(&purchase_list_item_id.0)
            .execute(&mut *tx)
            .await?;

        let mut total = record.total_amount;
        let mut unselected_total = record.unselected_total_amount;
        if let Some((amount, vendor_id)) = &selected {
            total = subtract_clamped(total, *amount);
            apply_vendor_cost(&mut tx, &record.id, vendor_id, *amount, true).await?;
        }
        if let Some((amount, vendor_id)) = &unselected {
            unselected_total = subtract_clamped(unselected_total, *amount);
            apply_vendor_cost(&mut tx, &record.id, vendor_id, *amount, true).await?;
        }
        update_totals(&mut tx, &record.id, total, unselected_total).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(
        &self,
        purchase_list_id: &PurchaseListId,
    ) -> Result<Option<PurchaseList>, StoreError> {
        let row = sqlx::query(
            "SELECT id, list_id, user_id, name, total_amount, unselected_total_amount, \
                    price_saving, items_count, created_at, updated_at \
             FROM purchase_list WHERE id = ?",
        )
        .bind(&purchase_list_id.0)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let record = decode_purchase_list_row(&row)?;
        Ok(Some(self.hydrate_record(record).await?))
    }

    pub async fn get_by_list(&self, list_id: &ListId) -> Result<Option<PurchaseList>, StoreError> {
        let row = sqlx::query(
            "SELECT id, list_id, user_id, name, total_amount, unselected_total_amount, \
                    price_saving, items_count, created_at, updated_at \
             FROM purchase_list WHERE list_id = ?",
        )
        .bind(&list_id.0)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let record = decode_purchase_list_row(&row)?;
        Ok(Some(self.hydrate_record(record).await?))
    }

    /// Read-and-annotate: persist the derived savings figures onto the
    /// document, then return it.
    pub async fn get_with_savings(
        &self,
        purchase_list_id: &PurchaseListId,
    ) -> Result<PurchaseList, StoreError> {
        let record = self.record(purchase_list_id).await?;
        let price_saving = round2(record.unselected_total_amount - record.total_amount);

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE purchase_list SET price_saving = ?, updated_at = ? WHERE id = ?")
            .bind(price_saving.to_string())
            .bind(Utc::now())
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        let buckets = sqlx::query(
            "SELECT vendor_id, total_amount FROM vendor_cost WHERE purchase_list_id = ?",
        )
        .bind(&record.id)
        .fetch_all(&mut *tx)
        .await?;
        for bucket in &buckets {
            let vendor_id: String = bucket.try_get("vendor_id")?;
            let amount_raw: String = bucket.try_get("total_amount")?;
            let amount = parse_decimal("vendor_cost.total_amount", &amount_raw)?;
            let saving = round2(amount - record.total_amount);
            sqlx::query(
                "UPDATE vendor_cost SET price_saving = ? \
                 WHERE purchase_list_id = ? AND vendor_id = ?",
            )
            .bind(saving.to_string())
            .bind(&record.id)
            .bind(&vendor_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.get(purchase_list_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Purchase list"))
    }

    pub async fn query(
        &self,
        user: &UserId,
        params: &PageParams,
    ) -> Result<Page<PurchaseList>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchase_list WHERE user_id = ?")
            .bind(&user.0)
            .fetch_one(&self.pool)
            .await?;

        let order =
            order_clause(params.sort_by.as_deref(), PURCHASE_LIST_SORT_FIELDS, "created_at DESC");
        let rows = sqlx::query(&format!(
            "SELECT id, list_id, user_id, name, total_amount, unselected_total_amount, \
                    price_saving, items_count, created_at, updated_at \
             FROM purchase_list WHERE user_id = ? ORDER BY {order} LIMIT ? OFFSET ?"
        ))
        .bind(&user.0)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = decode_purchase_list_row(row)?;
            results.push(shallow_purchase_list(record));
        }
        Ok(Page::new(results, params, total))
    }

    pub async fn update_name(
        &self,
        user: &UserId,
        purchase_list_id: &PurchaseListId,
        name: &str,
    ) -> Result<PurchaseList, StoreError> {
        let record = self.record(purchase_list_id).await?;
        if record.user_id != user.0 {
            return Err(StoreError::Forbidden);
        }

        sqlx::query("UPDATE purchase_list SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(&record.id)
            .execute(&self.pool)
            .await?;

        self.get(purchase_list_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Purchase list"))
    }

    pub async fn delete(
        &self,
        user: &UserId,
        purchase_list_id: &PurchaseListId,
    ) -> Result<(), StoreError> {
        let record = self.record(purchase_list_id).await?;
        if record.user_id != user.0 {
            return Err(StoreError::Forbidden);
        }

        sqlx::query("DELETE FROM purchase_list WHERE id = ?")
            .bind(&record.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record(
        &self,
        purchase_list_id: &PurchaseListId,
    ) -> Result<PurchaseListRecord, StoreError> {
        let row = sqlx::query(
            "SELECT id, list_id, user_id, name, total_amount, unselected_total_amount, \
                    price_saving, items_count, created_at, updated_at \
             FROM purchase_list WHERE id = ?",
        )
        .bind(&purchase_list_id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Purchase list"))?;
        decode_purchase_list_row(&row)
    }

    async fn hydrate_record(&self, record: PurchaseListRecord) -> Result<PurchaseList, StoreError> {
        let id = PurchaseListId(record.id.clone());
        let additional_cost = self.load_vendor_costs(&record.id).await?;
        let items = self.load_items(&id).await?;
        let mut list = shallow_purchase_list(record);
        list.additional_cost = additional_cost;
        list.items = items;
        Ok(list)
    }

    async fn load_vendor_costs(
        &self,
        purchase_list_id: &str,
    ) -> Result<Vec<VendorCost>, StoreError> {
        let rows = sqlx::query(
            "SELECT vc.vendor_id, vc.total_amount, vc.price_saving, v.name AS vendor_name \
             FROM vendor_cost vc \
             JOIN vendor v ON v.id = vc.vendor_id \
             WHERE vc.purchase_list_id = ? \
             ORDER BY vc.rowid ASC",
        )
        .bind(purchase_list_id)
        .fetch_all(&self.pool)
        .await?;

        let mut buckets = Vec::with_capacity(rows.len());
        for row in &rows {
            let total_raw: String = row.try_get("total_amount")?;
            let saving_raw: Option<String> = row.try_get("price_saving")?;
            buckets.push(VendorCost {
                vendor: Vendor {
                    id: VendorId(row.try_get("vendor_id")?),
                    name: row.try_get("vendor_name")?,
                },
                total_amount: parse_decimal("vendor_cost.total_amount", &total_raw)?,
                price_saving: parse_decimal_opt("vendor_cost.price_saving", saving_raw)?,
            });
        }
        Ok(buckets)
    }

    async fn load_items(
        &self,
        purchase_list_id: &PurchaseListId,
    ) -> Result<Vec<PurchaseListItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, purchase_list_id, user_id, selected_item_id, unselected_item_id, \
                    is_anchored, price_at_order_json, recommendation_item_id, \
                    recommendation_saving, recommendation_reason, created_at \
             FROM purchase_list_item WHERE purchase_list_id = ? \
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(&purchase_list_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let selected_item_id: String = row.try_get("selected_item_id")?;
            let unselected_item_id: Option<String> = row.try_get("unselected_item_id")?;
            let price_at_order_raw: String = row.try_get("price_at_order_json")?;
            let price_at_order: Vec<PriceAtOrder> = serde_json::from_str(&price_at_order_raw)
                .map_err(|error| {
                    StoreError::Decode(format!("invalid price_at_order_json: {error}"))
                })?;

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

            let selected_item = hydrate::load_item(&self.pool, &selected_item_id, true).await?;
            let unselected_item = match &unselected_item_id {
                Some(id) => hydrate::load_item(&self.pool, id, false).await?,
                None => None,
            };

            items.push(PurchaseListItem {
                id: PurchaseListItemId(row.try_get("id")?),
                purchase_list_id: purchase_list_id.clone(),
                user_id: UserId(row.try_get("user_id")?),
                selected_item_id: ListItemId(selected_item_id),
                unselected_item_id: unselected_item_id.map(ListItemId),
                selected_item,
                unselected_item,
                is_anchored: row.try_get("is_anchored")?,
                price_at_order,
                recommendation,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(items)
    }
}

fn shallow_purchase_list(record: PurchaseListRecord) -> PurchaseList {
    PurchaseList {
        id: PurchaseListId(record.id),
        list_id: ListId(record.list_id),
        user_id: UserId(record.user_id),
        name: record.name,
        total_amount: record.total_amount,
        unselected_total_amount: record.unselected_total_amount,
        price_saving: record.price_saving,
        items_count: record.items_count,
        additional_cost: Vec::new(),
        items: Vec::new(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

async fn insert_entry(
    tx: &mut Transaction<'_, Sqlite>,
    purchase_list_id: &str,
    user: &UserId,
    entry: &ResolvedEntry,
) -> Result<String, StoreError> {
    let id = new_id("pli");
    let price_at_order = PurchaseListItem::freeze_prices(&entry.selected);
    let price_at_order_json = serde_json::to_string(&price_at_order)
        .map_err(|error| StoreError::Decode(format!("price snapshot encode failed: {error}")))?;

    sqlx::query(
        "INSERT INTO purchase_list_item \
             (id, purchase_list_id, user_id, selected_item_id, unselected_item_id, is_anchored, \
              price_at_order_json, recommendation_item_id, recommendation_saving, \
              recommendation_reason, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(purchase_list_id)
    .bind(&user.0)
    .bind(&entry.selected.id.0)
    .bind(entry.unselected.as_ref().map(|item| item.id.0.clone()))
    .bind(entry.is_anchored)
    .bind(price_at_order_json)
    .bind(entry.recommendation.as_ref().map(|rec| rec.list_item_id.0.clone()))
    .bind(entry.recommendation.as_ref().map(|rec| rec.price_saving.to_string()))
    .bind(entry.recommendation.as_ref().map(|rec| rec.reason.clone()))
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(id)
}

async fn apply_vendor_cost(
    tx: &mut Transaction<'_, Sqlite>,
    purchase_list_id: &str,
    vendor_id: &str,
    amount: Decimal,
    subtract: bool,
) -> Result<(), StoreError> {
    let current: Option<String> = sqlx::query_scalar(
        "SELECT total_amount FROM vendor_cost WHERE purchase_list_id = ? AND vendor_id = ?",
    )
    .bind(purchase_list_id)
    .bind(vendor_id)
    .fetch_optional(&mut **tx)
    .await?;

    match current {
        Some(raw) => {
            let current = parse_decimal("vendor_cost.total_amount", &raw)?;
            let updated = if subtract {
                subtract_clamped(current, amount)
            } else {
                sum_fixed(current, amount)
            };
            sqlx::query(
                "UPDATE vendor_cost SET total_amount = ? \
                 WHERE purchase_list_id = ? AND vendor_id = ?",
            )
            .bind(updated.to_string())
            .bind(purchase_list_id)
            .bind(vendor_id)
            .execute(&mut **tx)
            .await?;
        }
        None if !subtract => {
            sqlx::query(
                "INSERT INTO vendor_cost (purchase_list_id, vendor_id, total_amount, price_saving) \
                 VALUES (?, ?, ?, NULL)",
            )
            .bind(purchase_list_id)
            .bind(vendor_id)
            .bind(round2(amount).to_string())
            .execute(&mut **tx)
            .await?;
        }
        None => {}
    }
    Ok(())
}

async fn update_totals(
    tx: &mut Transaction<'_, Sqlite>,
    purchase_list_id: &str,
    total_amount: Decimal,
    unselected_total_amount: Decimal,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE purchase_list SET \
             total_amount = ?, unselected_total_amount = ?, \
             items_count = (SELECT COUNT(*) FROM purchase_list_item WHERE purchase_list_id = ?), \
             updated_at = ? \
         WHERE id = ?",
    )
    .bind(total_amount.to_string())
    .bind(unselected_total_amount.to_string())
    .bind(purchase_list_id)
    .bind(Utc::now())
    .bind(purchase_list_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn live_amount_and_vendor(
    pool: &DbPool,
    item_id: &str,
) -> Result<Option<(Decimal, String)>, StoreError> {
    let row = sqlx::query("SELECT total_price, vendor_id FROM list_item WHERE id = ?")
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let raw: String = row.try_get("total_price")?;
            Ok(Some((parse_decimal("total_price", &raw)?, row.try_get("vendor_id")?)))
        }
        None => Ok(None),
    }
}
