//! Category analysis: a read-only reporting view that groups a list's
//! items by classifier-assigned category and asks the classifier to
//! sub-group near-duplicates and pick a winner per sub-group. Classifier
//! failures degrade to the plain grouped view; nothing is persisted.

use std::sync::Arc;

use serde::Serialize;

use cartwise_core::{Classifier, ListId, ListItem, ProductDescriptor, UserId};

use super::{hydrate, StoreError};
use crate::DbPool;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Clone, Debug, Serialize)]
pub struct AnalyzedItem {
    pub item: ListItem,
    pub recommended: bool,
    pub recommended_reason: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<AnalyzedItem>,
}

pub struct AnalysisStore {
    pool: DbPool,
}

impl AnalysisStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn category_view(
        &self,
        user: &UserId,
        list_id: &ListId,
        classifier: &Arc<dyn Classifier>,
    ) -> Result<Vec<CategoryGroup>, StoreError> {
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

        let mut groups: Vec<CategoryGroup> = Vec::new();
        for item in items {
            let category =
                item.product.category.clone().unwrap_or_else(|| UNCATEGORIZED.to_string());
            let analyzed = AnalyzedItem { item, recommended: false, recommended_reason: None };
            match groups.iter_mut().find(|group| group.category == category) {
                Some(group) => group.items.push(analyzed),
                None => groups.push(CategoryGroup { category, items: vec![analyzed] }),
            }
        }

        for group in &mut groups {
            if group.items.len() < 2 {
                continue;
            }
            annotate_group(group, classifier).await;
        }

        Ok(groups)
    }
}

async fn annotate_group(group: &mut CategoryGroup, classifier: &Arc<dyn Classifier>) {
    let product_numbers: Vec<String> = group
        .items
        .iter()
        .map(|analyzed| analyzed.item.product.product_number.clone())
        .collect();

    let sub_groups = match classifier.group_similar(&product_numbers).await {
        Ok(sub_groups) => sub_groups,
        Err(error) => {
            tracing::warn!(category = %group.category, error = %error, "sub-grouping degraded");
            return;
        }
    };

    for sub_group in sub_groups {
        if sub_group.len() < 2 {
            continue;
        }

        let descriptors: Vec<ProductDescriptor> = group
            .items
            .iter()
            .filter(|analyzed| sub_group.contains(&analyzed.item.product.product_number))
            .map(|analyzed| ProductDescriptor::from_list_item(&analyzed.item))
            .collect();
        if descriptors.len() < 2 {
            continue;
        }

        match classifier.recommend(&descriptors).await {
            Ok(recommendation) => {
                for analyzed in &mut group.items {
                    if analyzed.item.id == recommendation.list_item_id {
                        analyzed.recommended = true;
                        analyzed.recommended_reason = Some(recommendation.reason.clone());
                    }
                }
            }
            Err(error) => {
                tracing::warn!(category = %group.category, error = %error, "recommendation degraded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use cartwise_core::{Classifier, ClassifierError, ClassifierRecommendation, ProductDescriptor};

    use crate::fixtures::{product_spec_named, seed_list, seed_priced_item, setup_pool, test_user};

    use super::AnalysisStore;

    struct GroupEverything;

    #[async_trait]
    impl Classifier for GroupEverything {
        async fn categorize(&self, _: &str, _: &str) -> Result<String, ClassifierError> {
            Ok("Produce".to_string())
        }

        async fn group_similar(
            &self,
            product_numbers: &[String],
        ) -> Result<Vec<Vec<String>>, ClassifierError> {
            Ok(vec![product_numbers.to_vec()])
        }

        async fn recommend(
            &self,
            descriptors: &[ProductDescriptor],
        ) -> Result<ClassifierRecommendation, ClassifierError> {
            let cheapest = descriptors
                .iter()
                .min_by_key(|descriptor| descriptor.total_price)
                .ok_or_else(|| ClassifierError::Malformed("empty group".to_string()))?;
            Ok(ClassifierRecommendation {
                list_item_id: cheapest.list_item_id.clone(),
                price_saving: Decimal::ZERO,
                reason: "Cheapest in its category".to_string(),
            })
        }
    }

    struct Unavailable;

    #[async_trait]
    impl Classifier for Unavailable {
        async fn categorize(&self, _: &str, _: &str) -> Result<String, ClassifierError> {
            Err(ClassifierError::Timeout)
        }

        async fn group_similar(&self, _: &[String]) -> Result<Vec<Vec<String>>, ClassifierError> {
            Err(ClassifierError::Timeout)
        }

        async fn recommend(
            &self,
            _: &[ProductDescriptor],
        ) -> Result<ClassifierRecommendation, ClassifierError> {
            Err(ClassifierError::Timeout)
        }
    }

    #[tokio::test]
    async fn uncategorized_items_group_together_and_get_a_winner() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        seed_priced_item(
            &pool,
            &user,
            &list.id,
            product_spec_named("Sysco", "700001", "Acme", "Crushed tomatoes", &[("CS", "12.00")]),
            1,
        )
        .await;
        let cheaper = seed_priced_item(
            &pool,
            &user,
            &list.id,
            product_spec_named("US Foods", "700002", "Best", "Crushed tomatoes", &[("CS", "9.00")]),
            1,
        )
        .await;

        let store = AnalysisStore::new(pool.clone());
        let classifier: Arc<dyn cartwise_core::Classifier> = Arc::new(GroupEverything);
        let groups = store.category_view(&user, &list.id, &classifier).await.expect("analysis");

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, "Uncategorized");
        assert_eq!(groups[0].items.len(), 2);
        let winner = groups[0]
            .items
            .iter()
            .find(|analyzed| analyzed.recommended)
            .expect("one recommended item");
        assert_eq!(winner.item.id, cheaper.id);
        assert!(winner.recommended_reason.is_some());

        pool.close().await;
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_plain_grouping() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        seed_priced_item(
            &pool,
            &user,
            &list.id,
            product_spec_named("Sysco", "700003", "Acme", "Green beans", &[("CS", "12.00")]),
            1,
        )
        .await;
        seed_priced_item(
            &pool,
            &user,
            &list.id,
            product_spec_named("US Foods", "700004", "Best", "Green beans", &[("CS", "9.00")]),
            1,
        )
        .await;

        let store = AnalysisStore::new(pool.clone());
        let classifier: Arc<dyn cartwise_core::Classifier> = Arc::new(Unavailable);
        let groups = store.category_view(&user, &list.id, &classifier).await.expect("analysis");

        assert_eq!(groups.len(), 1);
        assert!(groups[0].items.iter().all(|analyzed| !analyzed.recommended));

        pool.close().await;
    }

    #[tokio::test]
    async fn singleton_categories_skip_the_classifier() {
        let pool = setup_pool().await;
        let user = test_user();
        let list = seed_list(&pool, &user).await;
        seed_priced_item(
            &pool,
            &user,
            &list.id,
            product_spec_named("Sysco", "700005", "Acme", "Olive oil", &[("CS", "30.00")]),
            1,
        )
        .await;

        let store = AnalysisStore::new(pool.clone());
        let classifier: Arc<dyn cartwise_core::Classifier> = Arc::new(Unavailable);
        let groups = store.category_view(&user, &list.id, &classifier).await.expect("analysis");

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 1);
        assert!(!groups[0].items[0].recommended);

        pool.close().await;
    }
}
