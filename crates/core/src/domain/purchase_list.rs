use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::list::ListId;
use crate::domain::list_item::{ListItem, ListItemId, Recommendation};
use crate::domain::product::{SaleUnitId, Vendor};
use crate::domain::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseListId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseListItemId(pub String);

/// Frozen copy of one sale-unit row taken at consolidation time. Later
/// price changes on the line item do not touch this snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAtOrder {
    pub sale_unit_id: SaleUnitId,
    pub unit: String,
    pub quantity: i64,
    pub amount: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseListItem {
    pub id: PurchaseListItemId,
    pub purchase_list_id: PurchaseListId,
    pub user_id: UserId,
    pub selected_item_id: ListItemId,
    pub unselected_item_id: Option<ListItemId>,
    /// Hydrated live line items. `None` when the referenced item has since
    /// been removed from its list; the snapshot stays readable either way.
    pub selected_item: Option<ListItem>,
    pub unselected_item: Option<ListItem>,
    pub is_anchored: bool,
    pub price_at_order: Vec<PriceAtOrder>,
    pub recommendation: Option<Recommendation>,
    pub created_at: DateTime<Utc>,
}

/// Per-vendor running cost bucket. `price_saving` is filled by the
/// savings annotation pass, relative to the purchase list total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCost {
    pub vendor: Vendor,
    pub total_amount: Decimal,
    pub price_saving: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseList {
    pub id: PurchaseListId,
    pub list_id: ListId,
    pub user_id: UserId,
    pub name: String,
    pub total_amount: Decimal,
    pub unselected_total_amount: Decimal,
    pub price_saving: Option<Decimal>,
    pub items_count: i64,
    pub additional_cost: Vec<VendorCost>,
    pub items: Vec<PurchaseListItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseListItem {
    /// Snapshot builder used at consolidation time.
    pub fn freeze_prices(item: &ListItem) -> Vec<PriceAtOrder> {
        item.sale_unit_quantities
            .iter()
            .map(|row| PriceAtOrder {
                sale_unit_id: row.sale_unit.id.clone(),
                unit: row.sale_unit.unit.clone(),
                quantity: row.quantity,
                amount: row.price.as_ref().map(|price| price.amount),
            })
            .collect()
    }
}

pub fn vendor_bucket_add(buckets: &mut Vec<VendorCost>, vendor: &Vendor, amount: Decimal) {
    use crate::money::sum_fixed;

    match buckets.iter_mut().find(|bucket| bucket.vendor.id == vendor.id) {
        Some(bucket) => bucket.total_amount = sum_fixed(bucket.total_amount, amount),
        None => buckets.push(VendorCost {
            vendor: vendor.clone(),
            total_amount: crate::money::round2(amount),
            price_saving: None,
        }),
    }
}
