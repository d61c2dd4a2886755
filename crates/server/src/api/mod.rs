//! REST surface under `/v1`. Routes are a thin adapter: every handler
//! resolves the caller, delegates to a store, and wraps the result in the
//! `{ <entity>, message? }` envelope.

use std::sync::Arc;

use axum::Router;
use rust_decimal::Decimal;
use serde::Deserialize;

use cartwise_core::{Classifier, ProductSpec, UnitPrice};
use cartwise_db::{DbPool, PageParams};

mod list_items;
mod lists;
mod purchase_lists;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(db_pool: DbPool, classifier: Arc<dyn Classifier>) -> Self {
        Self { db_pool, classifier }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(lists::router())
        .merge(list_items::router())
        .merge(purchase_lists::router())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn into_params(self) -> PageParams {
        let defaults = PageParams::default();
        PageParams {
            sort_by: self.sort_by,
            limit: self.limit.unwrap_or(defaults.limit),
            page: self.page.unwrap_or(defaults.page),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub vendor: String,
    pub brand: String,
    pub description: String,
    pub product_number: String,
    pub pack_size: String,
    pub img_src: Option<String>,
    #[serde(default)]
    pub prices: Vec<UnitPricePayload>,
}

#[derive(Debug, Deserialize)]
pub struct UnitPricePayload {
    pub unit: String,
    pub price: Decimal,
}

impl From<ProductPayload> for ProductSpec {
    fn from(payload: ProductPayload) -> Self {
        ProductSpec {
            vendor: payload.vendor,
            brand: payload.brand,
            description: payload.description,
            product_number: payload.product_number,
            pack_size: payload.pack_size,
            img_src: payload.img_src,
            prices: payload
                .prices
                .into_iter()
                .map(|price| UnitPrice { unit: price.unit, amount: price.price })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use cartwise_classifier::StubClassifier;
    use cartwise_db::{connect_with_settings, migrations};

    use super::{router, AppState};

    async fn test_router() -> axum::Router {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        router(AppState::new(pool, Arc::new(StubClassifier)))
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", "user-test")
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn requests_without_a_principal_are_unauthorized() {
        let app = test_router().await;

        let response = app
            .oneshot(Request::builder().uri("/lists").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_list_then_add_item_round_trips() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/lists", None))
            .await
            .expect("create list");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let list_id = body["list"]["id"].as_str().expect("list id").to_string();

        let payload = json!({
            "product": {
                "vendor": "Sysco",
                "brand": "Acme",
                "description": "Crushed tomatoes",
                "productNumber": "900001",
                "packSize": "6/10 LB",
                "prices": [{ "unit": "CS", "price": "24.99" }]
            }
        });
        let response = app
            .clone()
            .oneshot(request(Method::POST, &format!("/lists/{list_id}/items"), Some(payload.clone())))
            .await
            .expect("add item");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["listItem"]["list_id"].as_str(), Some(list_id.as_str()));

        // Same product twice is a conflict with a single-message envelope.
        let response = app
            .oneshot(request(Method::POST, &format!("/lists/{list_id}/items"), Some(payload)))
            .await
            .expect("duplicate add");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"].as_str(), Some("Product already in list"));
    }

    #[tokio::test]
    async fn unknown_list_is_a_not_found_envelope() {
        let app = test_router().await;

        let response = app
            .oneshot(request(Method::GET, "/lists/list-missing", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"].as_str(), Some("List not found"));
    }
}
