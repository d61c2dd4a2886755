//! Capability interface for the external classifier/recommender service.
//!
//! The engines only depend on this trait; the HTTP-backed implementation
//! lives in `cartwise-classifier` alongside a deterministic stub, so core
//! correctness never depends on actual model output.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::list_item::ListItemId;

/// Flattened view of one comparison-group member, formatted for the
/// recommender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub list_item_id: ListItemId,
    pub vendor: String,
    pub brand: String,
    pub description: String,
    pub pack_size: String,
    /// (unit label, active price) pairs.
    pub unit_prices: Vec<(String, Decimal)>,
    pub quantity: i64,
    pub total_price: Decimal,
}

impl ProductDescriptor {
    pub fn from_list_item(item: &crate::domain::list_item::ListItem) -> Self {
        Self {
            list_item_id: item.id.clone(),
            vendor: item.vendor.name.clone(),
            brand: item.product.brand.clone(),
            description: item.product.description.clone(),
            pack_size: item.product.pack_size.clone(),
            unit_prices: item
                .sale_unit_quantities
                .iter()
                .filter_map(|row| {
                    row.price.as_ref().map(|price| (row.sale_unit.unit.clone(), price.amount))
                })
                .collect(),
            quantity: item.sale_unit_quantities.iter().map(|row| row.quantity).sum(),
            total_price: item.total_price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRecommendation {
    pub list_item_id: ListItemId,
    pub price_saving: Decimal,
    pub reason: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Http(String),
    #[error("classifier request timed out")]
    Timeout,
    #[error("classifier returned a malformed response: {0}")]
    Malformed(String),
    #[error("classifier is disabled")]
    Disabled,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Assign a category label to a product.
    async fn categorize(&self, brand: &str, description: &str)
        -> Result<String, ClassifierError>;

    /// Partition product numbers into groups of near-duplicates for
    /// side-by-side comparison.
    async fn group_similar(
        &self,
        product_numbers: &[String],
    ) -> Result<Vec<Vec<String>>, ClassifierError>;

    /// Pick a winner among competing products and explain the savings.
    async fn recommend(
        &self,
        descriptors: &[ProductDescriptor],
    ) -> Result<ClassifierRecommendation, ClassifierError>;
}
