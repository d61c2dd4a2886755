use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use cartwise_core::{ListId, ListItemId, ProductSpec};
use cartwise_db::{AnalysisStore, CatalogStore, ComparisonEngine, ListItemStore, ListStore};

use crate::auth::AuthUser;
use crate::error::ApiResult;

use super::{AppState, PageQuery, ProductPayload};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lists", post(create_list).get(get_lists))
        .route("/lists/{list_id}", get(get_list).delete(delete_list))
        .route("/lists/{list_id}/name", patch(update_list_name))
        .route("/lists/{list_id}/items", post(add_list_item))
        .route("/lists/{list_id}/items/{list_item_id}", axum::routing::delete(remove_list_item))
        .route("/lists/{list_id}/analysis", get(get_list_analysis))
}

async fn create_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let list = ListStore::new(state.db_pool).create(&user).await?;
    Ok((StatusCode::CREATED, Json(json!({ "list": list }))))
}

async fn get_lists(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let result = ListStore::new(state.db_pool).query(&user, &query.into_params()).await?;
    Ok(Json(json!({ "result": result })))
}

async fn get_list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(list_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let list = ListStore::new(state.db_pool)
        .get(&ListId(list_id))
        .await?
        .ok_or_else(|| crate::error::ApiError::not_found("List not found"))?;
    Ok(Json(json!({ "list": list })))
}

#[derive(Debug, Deserialize)]
struct UpdateNameBody {
    name: String,
}

async fn update_list_name(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Json(body): Json<UpdateNameBody>,
) -> ApiResult<Json<Value>> {
    let list = ListStore::new(state.db_pool).update_name(&user, &ListId(list_id), &body.name).await?;
    Ok(Json(json!({ "list": list })))
}

async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
) -> ApiResult<StatusCode> {
    ListStore::new(state.db_pool).delete(&user, &ListId(list_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AddItemBody {
    product: ProductPayload,
}

async fn add_list_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Json(body): Json<AddItemBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let spec = ProductSpec::from(body.product);
    let item =
        ListItemStore::new(state.db_pool.clone()).add_line_item(&user, &ListId(list_id), &spec).await?;

    // Category assignment is asynchronous enrichment; the add must succeed
    // whether or not the classifier does.
    let catalog = CatalogStore::new(state.db_pool);
    let classifier = state.classifier.clone();
    let product_id = item.product.id.clone();
    tokio::spawn(async move {
        catalog.assign_category(&product_id, classifier).await;
    });

    Ok((StatusCode::CREATED, Json(json!({ "listItem": item }))))
}

async fn remove_list_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((list_id, list_item_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    ListItemStore::new(state.db_pool)
        .remove(&user, &ListId(list_id), &ListItemId(list_item_id))
        .await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisQuery {
    view: Option<String>,
}

async fn get_list_analysis(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> ApiResult<Json<Value>> {
    let list_id = ListId(list_id);
    match query.view.as_deref() {
        Some("categories") => {
            let analysis = AnalysisStore::new(state.db_pool)
                .category_view(&user, &list_id, &state.classifier)
                .await?;
            Ok(Json(json!({ "analysis": analysis })))
        }
        _ => {
            let list_items = ComparisonEngine::new(state.db_pool)
                .get_list_analysis(&user, &list_id, &state.classifier)
                .await?;
            Ok(Json(json!({ "listItems": list_items })))
        }
    }
}
