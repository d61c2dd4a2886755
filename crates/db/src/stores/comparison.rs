//! Comparison-group engine: base/comparison links, anchor and selection
//! toggles, and the recommendation analysis fan-out.
//!
//! Transition rules live in `cartwise_core::comparison`; this store loads
//! the state, applies the guards, and persists the outcome transactionally.

use std::sync::Arc;

use chrono::Utc;

use cartwise_core::comparison::{
    ensure_can_add_comparison, ensure_can_toggle_anchor, ensure_can_toggle_selection,
};
use cartwise_core::{Classifier, DomainError, ListId, ListItem, ListItemId, ProductDescriptor, UserId};

use super::{hydrate, StoreError};
use crate::DbPool;

pub const MSG_GROUP_CREATED: &str = "Product group created successfully";
pub const MSG_ITEM_ADDED: &str = "List item added to comparison group successfully";
pub const MSG_ITEM_REMOVED: &str = "List item removed successfully";
pub const MSG_GROUP_REMOVED: &str = "Product group removed successfully";

#[derive(Debug)]
pub struct ComparisonOutcome {
    pub item: ListItem,
    pub message: &'static str,
}

pub struct ComparisonEngine {
    pool: DbPool,
}

impl ComparisonEngine {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Link a comparison item into a base's group (set semantics: re-adding
    /// is a no-op), or, without a comparison id, seed an empty group on the
    /// base alone.
    pub async fn add_comparison_product(
        &self,
        user: &UserId,
        base_id: &ListItemId,
        comparison_id: Option<&ListItemId>,
    ) -> Result<ComparisonOutcome, StoreError> {
        let base = self.owned_item(user, base_id).await?;

        let Some(comparison_id) = comparison_id else {
            if base.is_anchored {
                return Err(DomainError::ComparisonOnAnchoredItem.into());
            }
            sqlx::query("UPDATE list_item SET is_base_product = 1, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(&base_id.0)
                .execute(&self.pool)
                .await?;
            let item = self.reload(base_id).await?;
            return Ok(ComparisonOutcome { item, message: MSG_GROUP_CREATED });
        };

        let comparison = self.owned_item(user, comparison_id).await?;
        ensure_can_add_comparison(&base, &comparison)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO comparison_product (base_item_id, comparison_item_id, created_at) \
             VALUES (?, ?, ?) \
             ON CONFLICT (base_item_id, comparison_item_id) DO NOTHING",
        )
        .bind(&base_id.0)
        .bind(&comparison_id.0)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE list_item SET is_base_product = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&base_id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let item = self.reload(base_id).await?;
        Ok(ComparisonOutcome { item, message: MSG_ITEM_ADDED })
    }

    /// Remove one member from a group, or the whole group when no member is
    /// named. A group left empty dissolves: the base flag flips back.
    pub async fn remove_comparison_product(
        &self,
        user: &UserId,
        base_id: &ListItemId,
        comparison_id: Option<&ListItemId>,
    ) -> Result<ComparisonOutcome, StoreError> {
        let base = self.owned_item(user, base_id).await?;
        if !base.is_base_product {
            return Err(DomainError::NotABaseProduct.into());
        }

        let mut tx = self.pool.begin().await?;

        let message = match comparison_id {
            Some(comparison_id) => {
                let in_group = base
                    .comparison_products
                    .iter()
                    .any(|member| member.id == *comparison_id);
                if !in_group {
                    return Err(DomainError::NotInComparisonGroup.into());
                }

                sqlx::query(
                    "DELETE FROM comparison_product \
                     WHERE base_item_id = ? AND comparison_item_id = ?",
                )
                .bind(&base_id.0)
                .bind(&comparison_id.0)
                .execute(&mut *tx)
                .await?;
                sqlx::query(
                    "UPDATE list_item SET is_selected = 0, is_rejected = 0, updated_at = ? \
                     WHERE id = ?",
                )
                .bind(Utc::now())
                .bind(&comparison_id.0)
                .execute(&mut *tx)
                .await?;

                let remaining: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM comparison_product WHERE base_item_id = ?",
                )
                .bind(&base_id.0)
                .fetch_one(&mut *tx)
                .await?;
                if remaining == 0 {
                    dissolve_base(&mut tx, &base_id.0).await?;
                    MSG_GROUP_REMOVED
                } else {
                    MSG_ITEM_REMOVED
                }
            }
            None => {
                sqlx::query(
                    "UPDATE list_item SET is_selected = 0, is_rejected = 0, updated_at = ? \
                     WHERE id IN (SELECT comparison_item_id FROM comparison_product \
                                  WHERE base_item_id = ?)",
                )
                .bind(Utc::now())
                .bind(&base_id.0)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM comparison_product WHERE base_item_id = ?")
                    .bind(&base_id.0)
                    .execute(&mut *tx)
                    .await?;
                dissolve_base(&mut tx, &base_id.0).await?;
                MSG_GROUP_REMOVED
            }
        };

        tx.commit().await?;

        let item = self.reload(base_id).await?;
        Ok(ComparisonOutcome { item, message })
    }

    /// Flip the anchor flag: "ship this item with no comparison".
    pub async fn toggle_anchor(
        &self,
        user: &UserId,
        item_id: &ListItemId,
    ) -> Result<ListItem, StoreError> {
        let item = self.owned_item(user, item_id).await?;
        ensure_can_toggle_anchor(&item)?;

        sqlx::query("UPDATE list_item SET is_anchored = ?, updated_at = ? WHERE id = ?")
            .bind(!item.is_anchored)
            .bind(Utc::now())
            .bind(&item_id.0)
            .execute(&self.pool)
            .await?;

        self.reload(item_id).await
    }

    /// Flip the selection flag on a group member (or the base itself).
    /// Turning a selection on clears every other selection in the group in
    /// the same transaction, so a group never carries two winners.
    pub async fn toggle_selected(
        &self,
        user: &UserId,
        item_id: &ListItemId,
        base_id: &ListItemId,
    ) -> Result<ListItem, StoreError> {
        let (base, item) = self.selection_pair(user, item_id, base_id).await?;

        let mut tx = self.pool.begin().await?;
        if !item.is_selected {
            sqlx::query(
                "UPDATE list_item SET is_selected = 0 \
                 WHERE id = ? OR id IN (SELECT comparison_item_id FROM comparison_product \
                                        WHERE base_item_id = ?)",
            )
            .bind(&base.id.0)
            .bind(&base.id.0)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "UPDATE list_item SET is_selected = 1, is_rejected = 0, updated_at = ? \
                 WHERE id = ?",
            )
            .bind(Utc::now())
            .bind(&item_id.0)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("UPDATE list_item SET is_selected = 0, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(&item_id.0)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.reload(item_id).await
    }

    /// Flip the rejection flag on a group member; rejecting clears any
    /// selection the member held.
    pub async fn toggle_rejected(
        &self,
        user: &UserId,
        item_id: &ListItemId,
        base_id: &ListItemId,
    ) -> Result<ListItem, StoreError> {
        let (_, item) = self.selection_pair(user, item_id, base_id).await?;

        if !item.is_rejected {
            sqlx::query(
                "UPDATE list_item SET is_rejected = 1, is_selected = 0, updated_at = ? \
                 WHERE id = ?",
            )
            .bind(Utc::now())
            .bind(&item_id.0)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE list_item SET is_rejected = 0, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(&item_id.0)
                .execute(&self.pool)
                .await?;
        }

        self.reload(item_id).await
    }

    /// Recommendation view: send every unanchored base group to the
    /// recommender and persist the verdict on the base. Groups fan out
    /// concurrently and fail independently; a classifier error leaves that
    /// base's recommendation unset.
    pub async fn get_list_analysis(
        &self,
        user: &UserId,
        list_id: &ListId,
        classifier: &Arc<dyn Classifier>,
    ) -> Result<Vec<ListItem>, StoreError> {
        let owner: Option<String> = sqlx::query_scalar("SELECT user_id FROM list WHERE id = ?")
            .bind(&list_id.0)
            .fetch_optional(&self.pool)
            .await?;
        match owner {
            None => return Err(StoreError::not_found("List")),
            Some(owner) if owner != user.0 => return Err(StoreError::Forbidden),
            Some(_) => {}
        }

        let items = hydrate::load_items_for_list(&self.pool, &list_id.0).await?;
        let bases: Vec<ListItem> = items
            .into_iter()
            .filter(|item| {
                item.is_base_product && !item.is_anchored && !item.comparison_products.is_empty()
            })
            .collect();

        let calls = bases.iter().map(|base| {
            let classifier = Arc::clone(classifier);
            async move {
                let mut descriptors = vec![ProductDescriptor::from_list_item(base)];
                descriptors
                    .extend(base.comparison_products.iter().map(ProductDescriptor::from_list_item));
                (base, classifier.recommend(&descriptors).await)
            }
        });

        for (base, outcome) in futures::future::join_all(calls).await {
            match outcome {
                Ok(recommendation) => {
                    let known = recommendation.list_item_id == base.id
                        || base
                            .comparison_products
                            .iter()
                            .any(|member| member.id == recommendation.list_item_id);
                    if !known {
                        tracing::warn!(
                            base_id = %base.id.0,
                            winner = %recommendation.list_item_id.0,
                            "recommender named an item outside the group; dropping"
                        );
                        continue;
                    }
                    sqlx::query(
                        "UPDATE list_item SET recommendation_item_id = ?, \
                             recommendation_saving = ?, recommendation_reason = ?, updated_at = ? \
                         WHERE id = ?",
                    )
                    .bind(&recommendation.list_item_id.0)
                    .bind(recommendation.price_saving.to_string())
                    .bind(&recommendation.reason)
                    .bind(Utc::now())
                    .bind(&base.id.0)
                    .execute(&self.pool)
                    .await?;
                }
                Err(error) => {
                    tracing::warn!(base_id = %base.id.0, error = %error, "recommendation degraded");
                }
            }
        }

        let mut refreshed = Vec::with_capacity(bases.len());
        for base in &bases {
            if let Some(item) = hydrate::load_item(&self.pool, &base.id.0, true).await? {
                refreshed.push(item);
            }
        }
        Ok(refreshed)
    }

    async fn owned_item(&self, user: &UserId, item_id: &ListItemId) -> Result<ListItem, StoreError> {
        let item = hydrate::load_item(&self.pool, &item_id.0, true)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))?;
        if item.user_id != *user {
            return Err(StoreError::Forbidden);
        }
        Ok(item)
    }

    async fn reload(&self, item_id: &ListItemId) -> Result<ListItem, StoreError> {
        hydrate::load_item(&self.pool, &item_id.0, true)
            .await?
            .ok_or_else(|| StoreError::not_found("List item"))
    }

    async fn selection_pair(
        &self,
        user: &UserId,
        item_id: &ListItemId,
        base_id: &ListItemId,
    ) -> Result<(ListItem, ListItem), StoreError> {
        let base = self.owned_item(user, base_id).await?;
        let item = if item_id == base_id {
            base.clone()
        } else {
            self.owned_item(user, item_id).await?
        };
        let in_group = base.comparison_products.iter().any(|member| member.id == *item_id);
        ensure_can_toggle_selection(&base, &item, in_group)?;
        Ok((base, item))
    }
}

async fn dissolve_base(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    base_id: &str,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE list_item SET is_base_product = 0, is_selected = 0, updated_at = ? WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(base_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
