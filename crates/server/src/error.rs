use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use cartwise_db::StoreError;

/// Uniform error envelope: every failed request answers with a status code
/// and `{ "message": ... }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized(message: &str) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: message.to_string() }
    }

    pub fn not_found(message: &str) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.to_string() }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        let status = match &error {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Validation(_) | StoreError::Conflict(_) | StoreError::Domain(_) => {
                StatusCode::BAD_REQUEST
            }
            StoreError::Forbidden => StatusCode::FORBIDDEN,
            StoreError::Database(_) | StoreError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %error, "request failed");
            "Internal server error".to_string()
        } else {
            error.to_string()
        };

        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use cartwise_core::DomainError;
    use cartwise_db::StoreError;

    use super::ApiError;

    #[test]
    fn store_errors_map_to_the_documented_statuses() {
        let not_found = ApiError::from(StoreError::not_found("List"));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "List not found");

        let conflict = ApiError::from(StoreError::Conflict("Product already in list".to_string()));
        assert_eq!(conflict.status, StatusCode::BAD_REQUEST);
        assert_eq!(conflict.message, "Product already in list");

        let forbidden = ApiError::from(StoreError::Forbidden);
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let domain = ApiError::from(StoreError::Domain(DomainError::BaseIsAnchored));
        assert_eq!(domain.status, StatusCode::BAD_REQUEST);
        assert_eq!(domain.message, "Base list item is anchored");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let internal = ApiError::from(StoreError::Decode("column mismatch".to_string()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "Internal server error");
    }
}
