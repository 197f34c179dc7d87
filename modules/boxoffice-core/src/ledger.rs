//! Inventory ledger: the only writer of `events.stock`.
//!
//! Both operations are single conditional statements against the store of
//! record. There is no in-process locking; the database serializes
//! concurrent callers on the row, and losers of a reserve race observe
//! `InsufficientStock` rather than a corrupted count.

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved,
    /// The condition failed: fewer than `quantity` tickets remain. An
    /// expected outcome under contention, not a fault.
    InsufficientStock,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotFound,
}

/// Atomically decrement stock by `quantity` if at least that much remains.
/// The check and the write are one statement, never a read-then-write pair.
pub async fn reserve(pool: &PgPool, event_id: Uuid, quantity: i32) -> sqlx::Result<ReserveOutcome> {
    let result = sqlx::query(
        "UPDATE events SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2",
    )
    .bind(event_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(ReserveOutcome::Reserved);
    }

    // Zero rows: either the event is gone or the condition failed.
    if event_exists(pool, event_id).await? {
        Ok(ReserveOutcome::InsufficientStock)
    } else {
        Ok(ReserveOutcome::NotFound)
    }
}

/// Atomically credit `quantity` back. Unconditional: a release only ever
/// reverses a prior successful reservation of the same quantity.
pub async fn release(pool: &PgPool, event_id: Uuid, quantity: i32) -> sqlx::Result<ReleaseOutcome> {
    let result = sqlx::query(
        "UPDATE events SET stock = stock + $2, updated_at = now() WHERE id = $1",
    )
    .bind(event_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        Ok(ReleaseOutcome::Released)
    } else {
        Ok(ReleaseOutcome::NotFound)
    }
}

async fn event_exists(pool: &PgPool, event_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
        .bind(event_id)
        .fetch_one(pool)
        .await
}
