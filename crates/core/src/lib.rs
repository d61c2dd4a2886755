pub mod classifier;
pub mod comparison;
pub mod config;
pub mod consolidation;
pub mod domain;
pub mod errors;
pub mod money;

pub use classifier::{Classifier, ClassifierError, ClassifierRecommendation, ProductDescriptor};
pub use comparison::{ItemState, MemberStatus};
pub use consolidation::{aggregate, resolve_entries, Aggregates, ResolvedEntry};
pub use domain::list::{List, ListId};
pub use domain::list_item::{ListItem, ListItemId, Recommendation, SaleUnitQuantity};
pub use domain::product::{
    Price, PriceId, Product, ProductId, ProductSpec, SaleUnit, SaleUnitId, UnitPrice, Vendor,
    VendorId,
};
pub use domain::purchase_list::{
    PriceAtOrder, PurchaseList, PurchaseListId, PurchaseListItem, PurchaseListItemId, VendorCost,
};
pub use domain::UserId;
pub use errors::DomainError;
