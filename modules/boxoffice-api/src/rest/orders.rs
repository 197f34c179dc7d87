use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use boxoffice_core::orders::Order;

use crate::error::ApiResult;
use crate::identity::Caller;
use crate::AppState;

/// Purchase request. Carries no price field: the total is always computed
/// server-side from the event's current price.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    event_id: Uuid,
    quantity: i32,
}

pub async fn place_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let order_id = state
        .purchases
        .place_order(caller.0.user_id, body.event_id, body.quantity)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"orderId": order_id})),
    ))
}

pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.purchases.orders_for_user(caller.0.user_id).await?))
}

pub async fn order_detail(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(
        state
            .purchases
            .order_detail(order_id, caller.0.user_id)
            .await?,
    ))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .purchases
        .cancel_order(order_id, caller.0.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .purchases
        .delete_order(order_id, caller.0.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
