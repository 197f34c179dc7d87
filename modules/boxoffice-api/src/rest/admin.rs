use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use boxoffice_core::events::{EventDraft, EventStatus};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    name: String,
    description: Option<String>,
    city: String,
    category: String,
    venue: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    price: Decimal,
    status: EventStatus,
    /// Honored on create only; afterwards stock moves through the ledger.
    stock: Option<i32>,
}

impl EventPayload {
    fn draft(&self) -> EventDraft {
        EventDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            city: self.city.clone(),
            category: self.category.clone(),
            venue: self.venue.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            price: self.price,
            status: self.status,
        }
    }
}

// The gateway already authorized the caller; this is a final assertion on
// the resolved role, not a gating framework.
fn forbid_non_admin(caller: &Caller) -> Option<Response> {
    if caller.0.role.is_admin() {
        None
    } else {
        Some(
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "admin role required"})),
            )
                .into_response(),
        )
    }
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<EventPayload>,
) -> Response {
    if let Some(rejection) = forbid_non_admin(&caller) {
        return rejection;
    }

    let initial_stock = body.stock.unwrap_or(0);
    match state
        .catalog
        .create_event(&body.draft(), initial_stock, caller.0.user_id)
        .await
    {
        Ok(event_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"eventId": event_id})),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
    Json(body): Json<EventPayload>,
) -> Response {
    if let Some(rejection) = forbid_non_admin(&caller) {
        return rejection;
    }

    match state
        .catalog
        .update_event(event_id, &body.draft(), caller.0.user_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Response {
    if let Some(rejection) = forbid_non_admin(&caller) {
        return rejection;
    }

    match state.catalog.delete_event(event_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// Full event row including the literal stock count.
pub async fn event_detail(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> Response {
    if let Some(rejection) = forbid_non_admin(&caller) {
        return rejection;
    }

    match state.catalog.admin_event_detail(event_id).await {
        Ok(event) => Json(event).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Response {
    if let Some(rejection) = forbid_non_admin(&caller) {
        return rejection;
    }

    match state
        .purchases
        .cancel_order_as_admin(order_id, caller.0.user_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
