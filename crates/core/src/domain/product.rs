use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleUnitId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
}

/// Immutable price row. Multiple rows exist per (line item, sale unit)
/// pair; exactly one is active at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    pub product_id: ProductId,
    pub sale_unit_id: SaleUnitId,
    pub list_item_id: Option<super::list_item::ListItemId>,
    pub amount: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleUnit {
    pub id: SaleUnitId,
    pub product_id: ProductId,
    pub unit: String,
    /// Active catalog-level price, when one exists.
    pub price: Option<Price>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor: Vendor,
    pub brand: String,
    pub description: String,
    pub product_number: String,
    pub pack_size: String,
    pub category: Option<String>,
    pub img_src: Option<String>,
    pub sale_units: Vec<SaleUnit>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied product payload for the list-building flow. Re-adding an
/// existing product number reuses the product and applies price deltas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub vendor: String,
    pub brand: String,
    pub description: String,
    pub product_number: String,
    pub pack_size: String,
    pub img_src: Option<String>,
    pub prices: Vec<UnitPrice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub unit: String,
    pub amount: Decimal,
}
