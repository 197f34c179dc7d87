//! Caller identity resolved by the upstream gateway.
//!
//! Authentication and role resolution happen before requests reach this
//! service; this extractor only consumes the already-resolved pair from
//! trusted headers and never verifies credentials itself.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use boxoffice_common::{Identity, Role};

pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, "x-user-id")
            .and_then(|v| v.parse::<Uuid>().ok())
            .ok_or_else(|| reject("missing or invalid x-user-id header"))?;
        let role = header(parts, "x-user-role")
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or_else(|| reject("missing or invalid x-user-role header"))?;

        Ok(Caller(Identity { user_id, role }))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn reject(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}
