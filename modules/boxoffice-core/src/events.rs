// Event rows and point queries. `stock` is read here but never written;
// the ledger owns every stock mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Published,
    Unpublished,
}

/// A row from the events table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub city: String,
    pub category: String,
    pub venue: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub stock: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Catalog fields for inserting or updating an event. Deliberately has no
/// stock field: initial stock is passed once at insert, and afterwards the
/// count moves only through ledger operations.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub name: String,
    pub description: Option<String>,
    pub city: String,
    pub category: String,
    pub venue: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub status: EventStatus,
}

pub async fn get(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Event>> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Current stock count without loading the whole row.
pub async fn stock(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<i32>> {
    sqlx::query_scalar::<_, i32>("SELECT stock FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    draft: &EventDraft,
    initial_stock: i32,
    created_by: Uuid,
) -> sqlx::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO events
            (name, description, city, category, venue, start_time, end_time,
             price, stock, status, created_by, updated_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        RETURNING id
        "#,
    )
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(&draft.city)
    .bind(&draft.category)
    .bind(&draft.venue)
    .bind(draft.start_time)
    .bind(draft.end_time)
    .bind(draft.price)
    .bind(initial_stock)
    .bind(draft.status)
    .bind(created_by)
    .fetch_one(pool)
    .await
}

/// Replace the catalog fields of an event. Returns false if the event no
/// longer exists. Stock is untouched.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    draft: &EventDraft,
    updated_by: Uuid,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET name = $2, description = $3, city = $4, category = $5, venue = $6,
            start_time = $7, end_time = $8, price = $9, status = $10,
            updated_at = now(), updated_by = $11
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(&draft.city)
    .bind(&draft.category)
    .bind(&draft.venue)
    .bind(draft.start_time)
    .bind(draft.end_time)
    .bind(draft.price)
    .bind(draft.status)
    .bind(updated_by)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Published events for the home listing of one city.
pub async fn published_by_city(pool: &PgPool, city: &str) -> sqlx::Result<Vec<Event>> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT * FROM events
        WHERE city = $1 AND status = 'PUBLISHED'
        ORDER BY start_time ASC NULLS LAST, created_at DESC
        "#,
    )
    .bind(city)
    .fetch_all(pool)
    .await
}
