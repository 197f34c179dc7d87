//! Cached read projections of the event catalog, plus the administrative
//! mutations that must keep them honest.
//!
//! Customers only ever see `has_stock`; the raw count stays on the admin
//! surface. Slightly stale projections are acceptable, so reads go through
//! the cache with a TTL, and every mutation that could change a projection
//! invalidates the keys it can influence.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{self, ReadCache};
use crate::error::{BoxofficeError, Result};
use crate::events::{self, Event, EventDraft, EventStatus};

const DETAIL_TTL: Duration = Duration::from_secs(10 * 60);
const HOME_TTL: Duration = Duration::from_secs(5 * 60);

/// Public projection of one event. Deliberately has no stock field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub city: String,
    pub category: String,
    pub venue: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub has_stock: bool,
    pub published: bool,
}

impl EventDetail {
    fn from_event(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            description: event.description.clone(),
            city: event.city.clone(),
            category: event.category.clone(),
            venue: event.venue.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            price: event.price,
            has_stock: event.stock > 0,
            published: event.status == EventStatus::Published,
        }
    }
}

/// One entry of a home listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub category: String,
    pub venue: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub has_stock: bool,
}

impl EventSummary {
    fn from_event(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            city: event.city.clone(),
            category: event.category.clone(),
            venue: event.venue.clone(),
            start_time: event.start_time,
            price: event.price,
            has_stock: event.stock > 0,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    cache: Arc<dyn ReadCache>,
}

impl CatalogService {
    pub fn new(pool: PgPool, cache: Arc<dyn ReadCache>) -> Self {
        Self { pool, cache }
    }

    /// Read-through cached detail projection.
    pub async fn event_detail(&self, event_id: Uuid) -> Result<EventDetail> {
        let key = cache::event_detail_key(event_id);
        if let Some(hit) = self.cached::<EventDetail>(&key).await {
            return Ok(hit);
        }

        let event = events::get(&self.pool, event_id)
            .await?
            .ok_or(BoxofficeError::EventNotFound)?;
        let detail = EventDetail::from_event(&event);
        self.store(&key, &detail, DETAIL_TTL).await;

        Ok(detail)
    }

    /// Read-through cached home listing for one city.
    pub async fn home_events(&self, city: &str) -> Result<Vec<EventSummary>> {
        let key = cache::home_events_key(city);
        if let Some(hit) = self.cached::<Vec<EventSummary>>(&key).await {
            return Ok(hit);
        }

        let listing: Vec<EventSummary> = events::published_by_city(&self.pool, city)
            .await?
            .iter()
            .map(EventSummary::from_event)
            .collect();
        self.store(&key, &listing, HOME_TTL).await;

        Ok(listing)
    }

    /// Full row including the literal stock count. Never cached: admins
    /// reading stock expect the ledger's current value.
    pub async fn admin_event_detail(&self, event_id: Uuid) -> Result<Event> {
        events::get(&self.pool, event_id)
            .await?
            .ok_or(BoxofficeError::EventNotFound)
    }

    pub async fn create_event(
        &self,
        draft: &EventDraft,
        initial_stock: i32,
        actor_id: Uuid,
    ) -> Result<Uuid> {
        if initial_stock < 0 {
            return Err(BoxofficeError::InvalidStock(initial_stock));
        }

        let event_id = events::insert(&self.pool, draft, initial_stock, actor_id).await?;
        info!(%event_id, city = %draft.city, "event created");
        self.cache.invalidate(&cache::home_events_key(&draft.city)).await;
        Ok(event_id)
    }

    /// Replace the catalog fields of an event (stock excluded). Clears the
    /// detail key and both city listings when the event moved cities.
    pub async fn update_event(&self, event_id: Uuid, draft: &EventDraft, actor_id: Uuid) -> Result<()> {
        let existing = events::get(&self.pool, event_id)
            .await?
            .ok_or(BoxofficeError::EventNotFound)?;

        if !events::update(&self.pool, event_id, draft, actor_id).await? {
            return Err(BoxofficeError::EventNotFound);
        }

        info!(%event_id, "event updated");
        self.cache.invalidate(&cache::event_detail_key(event_id)).await;
        self.cache.invalidate(&cache::home_events_key(&existing.city)).await;
        if draft.city != existing.city {
            self.cache.invalidate(&cache::home_events_key(&draft.city)).await;
        }
        Ok(())
    }

    pub async fn delete_event(&self, event_id: Uuid) -> Result<()> {
        let existing = events::get(&self.pool, event_id)
            .await?
            .ok_or(BoxofficeError::EventNotFound)?;

        if !events::delete(&self.pool, event_id).await? {
            return Err(BoxofficeError::EventNotFound);
        }

        info!(%event_id, "event deleted");
        self.cache.invalidate(&cache::event_detail_key(event_id)).await;
        self.cache.invalidate(&cache::home_events_key(&existing.city)).await;
        Ok(())
    }

    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.cache.get(key).await?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                // Stale or foreign payload under our key; drop it and fall
                // through to the source of truth.
                warn!(key, error = %e, "discarding undecodable cache entry");
                self.cache.invalidate(key).await;
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(json) => self.cache.set(key, &json, ttl).await,
            Err(e) => warn!(key, error = %e, "failed to serialize cache entry"),
        }
    }
}
