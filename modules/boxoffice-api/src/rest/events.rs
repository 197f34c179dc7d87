use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use boxoffice_core::{EventDetail, EventSummary};

use crate::error::ApiResult;
use crate::identity::Caller;
use crate::AppState;

const DEFAULT_CITY: &str = "Beijing";

#[derive(Deserialize)]
pub struct HomeQuery {
    city: Option<String>,
}

pub async fn home_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HomeQuery>,
) -> ApiResult<Json<Vec<EventSummary>>> {
    let city = query.city.unwrap_or_else(|| DEFAULT_CITY.to_string());
    Ok(Json(state.catalog.home_events(&city).await?))
}

pub async fn event_detail(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<EventDetail>> {
    Ok(Json(state.catalog.event_detail(event_id).await?))
}

/// Customers learn whether tickets remain; administrators get the literal
/// count.
pub async fn availability(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if caller.0.role.is_admin() {
        let stock = state.purchases.stock_level(event_id).await?;
        Ok(Json(serde_json::json!({"stock": stock})))
    } else {
        let has_stock = state.purchases.availability(event_id).await?;
        Ok(Json(serde_json::json!({"hasStock": has_stock})))
    }
}
