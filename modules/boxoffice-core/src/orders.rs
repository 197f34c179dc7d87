//! Order store: durable purchase intent and its status machine.
//!
//! PENDING → PAID and PENDING → CANCELLED; both targets are terminal.
//! Transitions go through one conditional UPDATE so that concurrent
//! callers race on the store, and exactly one wins.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

/// A row from the orders table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Parameters for inserting a new order. `total_price` is always computed
/// server-side by the orchestrator.
pub struct NewOrder {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// Another transition already changed the status; the precondition no
    /// longer holds.
    Conflict,
    NotFound,
}

/// Insert a new order in PENDING status. Only the orchestrator calls this,
/// and only after a successful reservation.
pub async fn create(pool: &PgPool, order: &NewOrder) -> sqlx::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO orders (user_id, event_id, quantity, total_price)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(order.user_id)
    .bind(order.event_id)
    .bind(order.quantity)
    .bind(order.total_price)
    .fetch_one(pool)
    .await
}

/// Conditionally move an order from `expected` to `new_status`. The
/// optimistic check and the write are one statement; at most one of any
/// set of concurrent callers gets `Applied`.
pub async fn transition_status(
    pool: &PgPool,
    order_id: Uuid,
    expected: OrderStatus,
    new_status: OrderStatus,
    actor_id: Uuid,
) -> sqlx::Result<TransitionOutcome> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = $3, updated_at = now(), updated_by = $4
        WHERE id = $1 AND status = $2
        "#,
    )
    .bind(order_id)
    .bind(expected)
    .bind(new_status)
    .bind(actor_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(TransitionOutcome::Applied);
    }

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
        .bind(order_id)
        .fetch_one(pool)
        .await?;

    Ok(if exists {
        TransitionOutcome::Conflict
    } else {
        TransitionOutcome::NotFound
    })
}

pub async fn get(pool: &PgPool, order_id: Uuid) -> sqlx::Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

/// Most recent orders of one user. Ownership checks live in the
/// orchestration layer, not here.
pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Order>> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Hard delete. The orchestrator only issues this for CANCELLED orders,
/// whose reservation has already been released.
pub async fn delete(pool: &PgPool, order_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Total quantity currently held by live (PENDING or PAID) orders of one
/// event. Together with the event's stock and timestamps this is the data
/// a reconciliation sweep needs.
pub async fn reserved_total(pool: &PgPool, event_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(quantity), 0)::BIGINT
        FROM orders
        WHERE event_id = $1 AND status IN ('PENDING', 'PAID')
        "#,
    )
    .bind(event_id)
    .fetch_one(pool)
    .await
}
