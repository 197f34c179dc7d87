//! Best-effort read cache for event projections.
//!
//! The cache is an optimization, never a source of truth: a broken or
//! absent backend degrades to a miss on reads and a no-op on writes, and
//! no caller ever sees an error from it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

#[async_trait]
pub trait ReadCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str, ttl: Duration);
    async fn invalidate(&self, key: &str);
}

pub fn event_detail_key(event_id: Uuid) -> String {
    format!("event:detail:{event_id}")
}

pub fn home_events_key(city: &str) -> String {
    format!("home:events:{city}")
}

/// Redis-backed cache over one multiplexed connection.
pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ReadCache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache get failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await {
            warn!(key, error = %e, "cache set failed");
        }
    }

    async fn invalidate(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(key, error = %e, "cache invalidate failed");
        }
    }
}

/// In-process TTL map. Used by the integration tests and good enough for
/// a single-node deployment without Redis.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let (value, deadline) = match entries.get(key) {
            Some(entry) => entry.clone(),
            None => return None,
        };
        if deadline <= Instant::now() {
            entries.remove(key);
            return None;
        }
        Some(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }

    async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }
}

/// Cache-less deployments: every read is a miss.
pub struct NoopCache;

#[async_trait]
impl ReadCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) {}

    async fn invalidate(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        let id = Uuid::nil();
        assert_eq!(
            event_detail_key(id),
            "event:detail:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(home_events_key("Shanghai"), "home:events:Shanghai");
    }

    #[tokio::test]
    async fn memory_cache_round_trip_and_invalidate() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));

        cache.invalidate("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn memory_cache_honors_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::ZERO).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn noop_cache_never_hits() {
        let cache = NoopCache;
        cache.set("k", "v", Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, None);
    }
}
