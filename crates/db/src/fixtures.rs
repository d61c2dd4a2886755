//! Seed helpers shared by the test suites across crates.

use std::str::FromStr;

use rust_decimal::Decimal;

use cartwise_core::{List, ListId, ListItem, ProductSpec, UnitPrice, UserId};

use crate::stores::{ListItemStore, ListStore};
use crate::{connect_with_settings, migrations, DbPool};

pub fn test_user() -> UserId {
    UserId("user-test".to_string())
}

pub async fn setup_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
        .await
        .expect("connect test pool");
    migrations::run_pending(&pool).await.expect("run migrations");
    pool
}

pub fn product_spec(vendor: &str, product_number: &str, prices: &[(&str, &str)]) -> ProductSpec {
    product_spec_named(vendor, product_number, "Acme", &format!("Item {product_number}"), prices)
}

pub fn product_spec_named(
    vendor: &str,
    product_number: &str,
    brand: &str,
    description: &str,
    prices: &[(&str, &str)],
) -> ProductSpec {
    ProductSpec {
        vendor: vendor.to_string(),
        brand: brand.to_string(),
        description: description.to_string(),
        product_number: product_number.to_string(),
        pack_size: "6/10 LB".to_string(),
        img_src: None,
        prices: prices
            .iter()
            .map(|(unit, amount)| UnitPrice {
                unit: unit.to_string(),
                amount: Decimal::from_str(amount).expect("fixture amount"),
            })
            .collect(),
    }
}

pub async fn seed_list(pool: &DbPool, user: &UserId) -> List {
    ListStore::new(pool.clone()).create(user).await.expect("seed list")
}

pub async fn seed_line_item(
    pool: &DbPool,
    user: &UserId,
    list_id: &ListId,
    spec: ProductSpec,
) -> ListItem {
    ListItemStore::new(pool.clone()).add_line_item(user, list_id, &spec).await.expect("seed item")
}

/// Seed a line item and set the quantity on its first sale unit, the common
/// shape most scenarios need.
pub async fn seed_priced_item(
    pool: &DbPool,
    user: &UserId,
    list_id: &ListId,
    spec: ProductSpec,
    quantity: i64,
) -> ListItem {
    let store = ListItemStore::new(pool.clone());
    let item = store.add_line_item(user, list_id, &spec).await.expect("seed item");
    let sale_unit = item.sale_unit_quantities[0].sale_unit.id.clone();
    store.set_quantity(user, &item.id, &sale_unit, quantity).await.expect("seed quantity");
    store.get(&item.id).await.expect("reload").expect("item present")
}
