use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::list::ListId;
use crate::domain::product::{Price, Product, SaleUnit, Vendor};
use crate::domain::UserId;
use crate::money::round2;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListItemId(pub String);

/// One sale-unit row on a line item: how many of this unit the user wants,
/// priced at the currently-active price for the (item, unit) pair. `price`
/// is `None` when the product payload carried no price for this unit, in
/// which case the row contributes 0 to the total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleUnitQuantity {
    pub sale_unit: SaleUnit,
    pub quantity: i64,
    pub price: Option<Price>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub list_item_id: ListItemId,
    pub price_saving: Decimal,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: ListItemId,
    pub list_id: ListId,
    pub user_id: UserId,
    pub product: Product,
    pub vendor: Vendor,
    pub sale_unit_quantities: Vec<SaleUnitQuantity>,
    pub is_base_product: bool,
    pub is_anchored: bool,
    pub is_selected: bool,
    pub is_rejected: bool,
    /// Hydrated one level deep; members carry an empty vec themselves.
    pub comparison_products: Vec<ListItem>,
    pub recommendation: Option<Recommendation>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListItem {
    /// Total from current quantities and active prices, 2-dp rounded.
    /// The persisted `total_price` is a cache of this value.
    pub fn computed_total(&self) -> Decimal {
        let sum: Decimal = self
            .sale_unit_quantities
            .iter()
            .map(|row| match &row.price {
                Some(price) => price.amount * Decimal::from(row.quantity),
                None => Decimal::ZERO,
            })
            .sum();
        round2(sum)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::list::ListId;
    use crate::domain::product::{
        Price, PriceId, Product, ProductId, SaleUnit, SaleUnitId, Vendor, VendorId,
    };
    use crate::domain::UserId;

    use super::{ListItem, ListItemId, SaleUnitQuantity};

    fn sale_unit_row(unit: &str, quantity: i64, amount: Option<Decimal>) -> SaleUnitQuantity {
        let sale_unit = SaleUnit {
            id: SaleUnitId(format!("su-{unit}")),
            product_id: ProductId("prod-1".to_string()),
            unit: unit.to_string(),
            price: None,
        };
        SaleUnitQuantity {
            price: amount.map(|amount| Price {
                id: PriceId(format!("price-{unit}")),
                product_id: ProductId("prod-1".to_string()),
                sale_unit_id: sale_unit.id.clone(),
                list_item_id: Some(ListItemId("item-1".to_string())),
                amount,
                active: true,
                created_at: Utc::now(),
            }),
            sale_unit,
            quantity,
        }
    }

    fn item(rows: Vec<SaleUnitQuantity>) -> ListItem {
        let vendor = Vendor { id: VendorId("ven-1".to_string()), name: "Acme Foods".to_string() };
        ListItem {
            id: ListItemId("item-1".to_string()),
            list_id: ListId("list-1".to_string()),
            user_id: UserId("user-1".to_string()),
            product: Product {
                id: ProductId("prod-1".to_string()),
                vendor: vendor.clone(),
                brand: "Acme".to_string(),
                description: "Whole peeled tomatoes".to_string(),
                product_number: "100001".to_string(),
                pack_size: "6/10 LB".to_string(),
                category: None,
                img_src: None,
                sale_units: vec![],
                created_at: Utc::now(),
            },
            vendor,
            sale_unit_quantities: rows,
            is_base_product: false,
            is_anchored: false,
            is_selected: false,
            is_rejected: false,
            comparison_products: vec![],
            recommendation: None,
            total_price: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn total_sums_quantity_times_active_price() {
        let item = item(vec![
            sale_unit_row("CS", 2, Some(Decimal::new(1050, 2))),
            sale_unit_row("EA", 3, Some(Decimal::new(199, 2))),
        ]);
        assert_eq!(item.computed_total(), Decimal::new(2697, 2));
    }

    #[test]
    fn units_without_a_price_contribute_zero() {
        let item = item(vec![
            sale_unit_row("CS", 2, Some(Decimal::new(1050, 2))),
            sale_unit_row("EA", 5, None),
        ]);
        assert_eq!(item.computed_total(), Decimal::new(2100, 2));
    }

    #[test]
    fn total_is_rounded_to_two_decimals() {
        let item = item(vec![sale_unit_row("LB", 3, Some(Decimal::new(3333, 3)))]);
        assert_eq!(item.computed_total(), Decimal::new(1000, 2));
    }
}
