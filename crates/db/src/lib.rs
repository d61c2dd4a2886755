pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod pagination;
pub mod stores;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use pagination::{Page, PageParams};
pub use stores::{
    AnalysisStore, AnalyzedItem, CatalogStore, CategoryGroup, ComparisonEngine, ComparisonOutcome,
    ListItemStore, ListStore, PricingLedger, PurchaseListStore, StoreError, UnitPriceUpdate,
};
