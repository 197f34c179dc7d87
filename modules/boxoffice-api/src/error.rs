use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use boxoffice_core::BoxofficeError;

/// Wrapper so core errors can be returned straight out of handlers with `?`.
pub struct ApiError(pub BoxofficeError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<BoxofficeError> for ApiError {
    fn from(e: BoxofficeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use BoxofficeError::*;

        let status = match &self.0 {
            EventNotFound | OrderNotFound => StatusCode::NOT_FOUND,
            SoldOut | NotCancellable | NotDeletable => StatusCode::CONFLICT,
            InvalidQuantity(_) | InvalidStock(_) => StatusCode::BAD_REQUEST,
            Forbidden => StatusCode::FORBIDDEN,
            Database(_) | Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Infrastructure detail stays in the logs, not the response.
            error!(error = %self.0, "request failed");
            return (
                status,
                Json(serde_json::json!({"error": "internal error"})),
            )
                .into_response();
        }

        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}
