use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use cartwise_core::{ListId, ListItemId, PurchaseListId, PurchaseListItemId};
use cartwise_db::PurchaseListStore;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};

use super::{AppState, PageQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchase-lists", post(create_purchase_list).get(get_purchase_lists))
        .route("/purchase-lists/upsert/{list_id}", post(upsert_purchase_list))
        .route("/purchase-lists/items/{purchase_list_item_id}", delete(remove_purchase_list_item))
        .route("/purchase-lists/{id}", get(get_purchase_list).delete(delete_purchase_list))
        .route("/purchase-lists/{id}/name", patch(update_purchase_list_name))
        .route("/purchase-lists/{id}/items", post(add_purchase_list_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    list_id: String,
    name: Option<String>,
}

async fn create_purchase_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let purchase_list = PurchaseListStore::new(state.db_pool)
        .create(&user, &ListId(body.list_id), body.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "purchaseList": purchase_list }))))
}

async fn get_purchase_lists(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let result = PurchaseListStore::new(state.db_pool).query(&user, &query.into_params()).await?;
    Ok(Json(json!({ "result": result })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetQuery {
    with_savings: Option<bool>,
}

async fn get_purchase_list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    Query(query): Query<GetQuery>,
) -> ApiResult<Json<Value>> {
    let store = PurchaseListStore::new(state.db_pool);
    let id = PurchaseListId(id);
    let purchase_list = if query.with_savings.unwrap_or(false) {
        store.get_with_savings(&id).await?
    } else {
        store.get(&id).await?.ok_or_else(|| ApiError::not_found("Purchase list not found"))?
    };
    Ok(Json(json!({ "purchaseList": purchase_list })))
}

async fn upsert_purchase_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let purchase_list =
        PurchaseListStore::new(state.db_pool).upsert(&user, &ListId(list_id)).await?;
    Ok(Json(json!({ "purchaseList": purchase_list })))
}

#[derive(Debug, Deserialize)]
struct UpdateNameBody {
    name: String,
}

async fn update_purchase_list_name(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateNameBody>,
) -> ApiResult<Json<Value>> {
    let purchase_list = PurchaseListStore::new(state.db_pool)
        .update_name(&user, &PurchaseListId(id), &body.name)
        .await?;
    Ok(Json(json!({ "purchaseList": purchase_list })))
}

async fn delete_purchase_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    PurchaseListStore::new(state.db_pool).delete(&user, &PurchaseListId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    selected_list_item_id: String,
    unselected_list_item_id: String,
}

async fn add_purchase_list_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AddItemBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let purchase_list_item = PurchaseListStore::new(state.db_pool)
        .add_item(
            &user,
            &PurchaseListId(id),
            &ListItemId(body.selected_list_item_id),
            &ListItemId(body.unselected_list_item_id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "purchaseListItem": purchase_list_item }))))
}

async fn remove_purchase_list_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(purchase_list_item_id): Path<String>,
) -> ApiResult<StatusCode> {
    PurchaseListStore::new(state.db_pool)
        .remove_item(&user, &PurchaseListItemId(purchase_list_item_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
