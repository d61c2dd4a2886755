use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use cartwise_core::DomainError;

pub mod analysis;
pub mod catalog;
pub mod comparison;
mod hydrate;
pub mod list;
pub mod list_item;
pub mod pricing;
pub mod purchase_list;

pub use analysis::{AnalysisStore, AnalyzedItem, CategoryGroup};
pub use catalog::CatalogStore;
pub use comparison::{ComparisonEngine, ComparisonOutcome};
pub use list::ListStore;
pub use list_item::{ListItemStore, UnitPriceUpdate};
pub use pricing::PricingLedger;
pub use purchase_list::PurchaseListStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: &'static str },
    #[error("{0}")]
    Validation(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", sqlx::types::Uuid::new_v4())
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(value)
        .map_err(|error| StoreError::Decode(format!("invalid decimal value for {field}: {error}")))
}

pub(crate) fn parse_decimal_opt(
    field: &str,
    value: Option<String>,
) -> Result<Option<Decimal>, StoreError> {
    value.map(|value| parse_decimal(field, &value)).transpose()
}
