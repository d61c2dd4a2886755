use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use cartwise_core::{ListItemId, SaleUnitId, UnitPrice};
use cartwise_db::{ComparisonEngine, ListItemStore, UnitPriceUpdate};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};

use super::{AppState, UnitPricePayload};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list-items", get(find_list_items).patch(update_prices_by_product_number))
        .route("/list-items/quantity", patch(update_quantity))
        .route("/list-items/price", patch(update_price))
        .route("/list-items/{id}", get(get_list_item))
        .route("/list-items/{id}/anchor", post(toggle_anchor))
        .route("/list-items/{id}/selected", post(toggle_selected))
        .route("/list-items/{id}/rejected", post(toggle_rejected))
        .route("/list-items/{id}/comparison", post(seed_group).delete(dissolve_group))
        .route(
            "/list-items/{id}/comparison/{comparison_id}",
            post(add_comparison).delete(remove_comparison),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNumberQuery {
    product_number: String,
}

async fn find_list_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ProductNumberQuery>,
) -> ApiResult<Json<Value>> {
    let list_items = ListItemStore::new(state.db_pool)
        .find_by_product_number(&user, &query.product_number)
        .await?;
    Ok(Json(json!({ "listItems": list_items })))
}

#[derive(Debug, Deserialize)]
struct PricesBody {
    prices: Vec<UnitPricePayload>,
}

async fn update_prices_by_product_number(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ProductNumberQuery>,
    Json(body): Json<PricesBody>,
) -> ApiResult<Json<Value>> {
    let prices: Vec<UnitPrice> = body
        .prices
        .into_iter()
        .map(|price| UnitPrice { unit: price.unit, amount: price.price })
        .collect();
    let list_items = ListItemStore::new(state.db_pool)
        .set_prices_by_product_number(&user, &query.product_number, &prices)
        .await?;
    Ok(Json(json!({ "listItems": list_items })))
}

async fn get_list_item(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let list_item = ListItemStore::new(state.db_pool)
        .get(&ListItemId(id))
        .await?
        .ok_or_else(|| ApiError::not_found("List item not found"))?;
    Ok(Json(json!({ "listItem": list_item })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuantityBody {
    list_item_id: String,
    sale_unit_id: String,
    quantity: i64,
}

async fn update_quantity(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<QuantityBody>,
) -> ApiResult<Json<Value>> {
    ListItemStore::new(state.db_pool)
        .set_quantity(
            &user,
            &ListItemId(body.list_item_id),
            &SaleUnitId(body.sale_unit_id),
            body.quantity,
        )
        .await?;
    Ok(Json(json!({ "message": "Quantity updated" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceBody {
    list_item_id: String,
    prices: Vec<SaleUnitPricePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleUnitPricePayload {
    sale_unit_id: String,
    price: Decimal,
}

async fn update_price(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<PriceBody>,
) -> ApiResult<Json<Value>> {
    let updates: Vec<UnitPriceUpdate> = body
        .prices
        .into_iter()
        .map(|price| UnitPriceUpdate {
            sale_unit_id: SaleUnitId(price.sale_unit_id),
            amount: price.price,
        })
        .collect();
    let list_item = ListItemStore::new(state.db_pool)
        .set_prices(&user, &ListItemId(body.list_item_id), &updates)
        .await?;
    Ok(Json(json!({ "listItem": list_item, "message": "Price updated" })))
}

async fn toggle_anchor(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let list_item =
        ComparisonEngine::new(state.db_pool).toggle_anchor(&user, &ListItemId(id)).await?;
    Ok(Json(json!({ "listItem": list_item, "message": "List item anchored" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseQuery {
    base_list_item_id: String,
}

async fn toggle_selected(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(query): Query<BaseQuery>,
) -> ApiResult<Json<Value>> {
    let list_item = ComparisonEngine::new(state.db_pool)
        .toggle_selected(&user, &ListItemId(id), &ListItemId(query.base_list_item_id))
        .await?;
    Ok(Json(json!({ "listItem": list_item, "message": "List item selected" })))
}

async fn toggle_rejected(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(query): Query<BaseQuery>,
) -> ApiResult<Json<Value>> {
    let list_item = ComparisonEngine::new(state.db_pool)
        .toggle_rejected(&user, &ListItemId(id), &ListItemId(query.base_list_item_id))
        .await?;
    Ok(Json(json!({ "listItem": list_item, "message": "List item rejected" })))
}

async fn seed_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(base_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let outcome = ComparisonEngine::new(state.db_pool)
        .add_comparison_product(&user, &ListItemId(base_id), None)
        .await?;
    Ok(Json(json!({ "productAddedToComparison": outcome.item, "message": outcome.message })))
}

async fn add_comparison(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((base_id, comparison_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let outcome = ComparisonEngine::new(state.db_pool)
        .add_comparison_product(&user, &ListItemId(base_id), Some(&ListItemId(comparison_id)))
        .await?;
    Ok(Json(json!({ "productAddedToComparison": outcome.item, "message": outcome.message })))
}

async fn dissolve_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(base_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let outcome = ComparisonEngine::new(state.db_pool)
        .remove_comparison_product(&user, &ListItemId(base_id), None)
        .await?;
    Ok(Json(json!({ "productRemovedFromComparison": outcome.item, "message": outcome.message })))
}

async fn remove_comparison(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((base_id, comparison_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let outcome = ComparisonEngine::new(state.db_pool)
        .remove_comparison_product(&user, &ListItemId(base_id), Some(&ListItemId(comparison_id)))
        .await?;
    Ok(Json(json!({ "productRemovedFromComparison": outcome.item, "message": outcome.message })))
}
