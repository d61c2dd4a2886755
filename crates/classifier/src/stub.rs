//! Deterministic classifier doubles. `StubClassifier` gives tests and
//! local runs predictable output; `DisabledClassifier` is wired when no
//! API key is configured, and every caller degrades gracefully.

use async_trait::async_trait;
use rust_decimal::Decimal;

use cartwise_core::{Classifier, ClassifierError, ClassifierRecommendation, ProductDescriptor};

const KEYWORD_CATEGORIES: &[(&str, &str)] = &[
    ("chicken", "Meat and Poultry"),
    ("beef", "Meat and Poultry"),
    ("pork", "Meat and Poultry"),
    ("shrimp", "Seafood"),
    ("salmon", "Seafood"),
    ("lettuce", "Produce"),
    ("tomato", "Produce"),
    ("cheese", "Dairy and Cheese"),
    ("milk", "Dairy and Cheese"),
    ("bread", "Bakery"),
    ("rice", "Grains and Staples"),
    ("flour", "Grains and Staples"),
    ("canned", "Canned and Jarred Goods"),
    ("oil", "Cooking Essentials (oil, lard, fats)"),
    ("coffee", "Coffee varieties"),
];

#[derive(Default)]
pub struct StubClassifier;

#[async_trait]
impl Classifier for StubClassifier {
    async fn categorize(&self, brand: &str, description: &str) -> Result<String, ClassifierError> {
        let haystack = format!("{brand} {description}").to_ascii_lowercase();
        let category = KEYWORD_CATEGORIES
            .iter()
            .find(|(keyword, _)| haystack.contains(keyword))
            .map(|(_, category)| *category)
            .unwrap_or("Grains and Staples");
        Ok(category.to_string())
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
            .ok_or_else(|| ClassifierError::Malformed("empty descriptor set".to_string()))?;
        let most_expensive = descriptors
            .iter()
            .map(|descriptor| descriptor.total_price)
            .max()
            .unwrap_or(Decimal::ZERO);

        Ok(ClassifierRecommendation {
            list_item_id: cheapest.list_item_id.clone(),
            price_saving: most_expensive - cheapest.total_price,
            reason: format!(
                "{} is the lowest total in the group, saving {}",
                cheapest.vendor,
                most_expensive - cheapest.total_price
            ),
        })
    }
}

/// Wired when `classifier.enabled` is false. Every call errs, and every
/// consumer treats that as "no enrichment".
#[derive(Default)]
pub struct DisabledClassifier;

#[async_trait]
impl Classifier for DisabledClassifier {
    async fn categorize(&self, _brand: &str, _description: &str) -> Result<String, ClassifierError> {
        Err(ClassifierError::Disabled)
    }

    async fn group_similar(
        &self,
        _product_numbers: &[String],
    ) -> Result<Vec<Vec<String>>, ClassifierError> {
        Err(ClassifierError::Disabled)
    }

    async fn recommend(
        &self,
        _descriptors: &[ProductDescriptor],
    ) -> Result<ClassifierRecommendation, ClassifierError> {
        Err(ClassifierError::Disabled)
    }
}
