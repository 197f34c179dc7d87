//! Integration tests for the cached catalog projections and their
//! invalidation by order and admin write paths.
//!
//! Requirements: Docker (for Postgres via testcontainers)
//!
//! Run with: cargo test -p boxoffice-core --features test-utils --test catalog_cache_test

#![cfg(feature = "test-utils")]

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use boxoffice_core::events::{EventDraft, EventStatus};
use boxoffice_core::testutil::{postgres_container, seed_event};
use boxoffice_core::{
    BoxofficeError, CatalogService, MemoryCache, NoopCache, PurchaseService, ReadCache,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn services(pool: &PgPool) -> (PurchaseService, CatalogService, Arc<dyn ReadCache>) {
    let cache: Arc<dyn ReadCache> = Arc::new(MemoryCache::new());
    (
        PurchaseService::new(pool.clone(), cache.clone()),
        CatalogService::new(pool.clone(), cache.clone()),
        cache,
    )
}

fn draft(name: &str, city: &str, price: Decimal) -> EventDraft {
    EventDraft {
        name: name.to_string(),
        description: None,
        city: city.to_string(),
        category: "concert".to_string(),
        venue: None,
        start_time: None,
        end_time: None,
        price,
        status: EventStatus::Published,
    }
}

#[tokio::test]
async fn detail_is_cached_until_a_purchase_invalidates_it() {
    let (_pg, pool) = postgres_container().await;
    let event_id = seed_event(&pool, "Cached show", "Beijing", dec("50.00"), 1).await;
    let (purchases, catalog, _cache) = services(&pool);

    let before = catalog.event_detail(event_id).await.unwrap();
    assert!(before.has_stock);

    // Served from cache: a direct DB write is not visible yet.
    sqlx::query("UPDATE events SET name = 'Renamed' WHERE id = $1")
        .bind(event_id)
        .execute(&pool)
        .await
        .unwrap();
    let cached = catalog.event_detail(event_id).await.unwrap();
    assert_eq!(cached.name, "Cached show");

    // Buying the last ticket invalidates the projection.
    purchases
        .place_order(Uuid::new_v4(), event_id, 1)
        .await
        .unwrap();
    let after = catalog.event_detail(event_id).await.unwrap();
    assert_eq!(after.name, "Renamed");
    assert!(!after.has_stock);
}

#[tokio::test]
async fn cancel_invalidates_the_projection_too() {
    let (_pg, pool) = postgres_container().await;
    let event_id = seed_event(&pool, "Round trip", "Beijing", dec("50.00"), 1).await;
    let (purchases, catalog, _cache) = services(&pool);
    let user_id = Uuid::new_v4();

    let order_id = purchases.place_order(user_id, event_id, 1).await.unwrap();
    assert!(!catalog.event_detail(event_id).await.unwrap().has_stock);

    purchases.cancel_order(order_id, user_id).await.unwrap();
    assert!(catalog.event_detail(event_id).await.unwrap().has_stock);
}

#[tokio::test]
async fn home_listing_is_cached_and_cleared_by_admin_writes() {
    let (_pg, pool) = postgres_container().await;
    let admin = Uuid::new_v4();
    let (_purchases, catalog, _cache) = services(&pool);

    let first = catalog
        .create_event(&draft("First", "Chengdu", dec("30.00")), 10, admin)
        .await
        .unwrap();
    let listing = catalog.home_events("Chengdu").await.unwrap();
    assert_eq!(listing.len(), 1);

    // Creating another event in the city clears the listing bucket.
    catalog
        .create_event(&draft("Second", "Chengdu", dec("40.00")), 5, admin)
        .await
        .unwrap();
    let listing = catalog.home_events("Chengdu").await.unwrap();
    assert_eq!(listing.len(), 2);

    // Deleting does as well.
    catalog.delete_event(first).await.unwrap();
    let listing = catalog.home_events("Chengdu").await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "Second");
}

#[tokio::test]
async fn negative_initial_stock_is_rejected_before_insert() {
    let (_pg, pool) = postgres_container().await;
    let admin = Uuid::new_v4();
    let (_purchases, catalog, _cache) = services(&pool);

    let err = catalog
        .create_event(&draft("Phantom show", "Shenzhen", dec("30.00")), -5, admin)
        .await
        .unwrap_err();
    assert!(matches!(err, BoxofficeError::InvalidStock(-5)));

    // Nothing reached the table.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn moving_an_event_between_cities_clears_both_listings() {
    let (_pg, pool) = postgres_container().await;
    let admin = Uuid::new_v4();
    let (_purchases, catalog, _cache) = services(&pool);

    let event_id = catalog
        .create_event(&draft("Touring show", "Wuhan", dec("30.00")), 10, admin)
        .await
        .unwrap();
    assert_eq!(catalog.home_events("Wuhan").await.unwrap().len(), 1);
    assert!(catalog.home_events("Xi'an").await.unwrap().is_empty());

    catalog
        .update_event(event_id, &draft("Touring show", "Xi'an", dec("30.00")), admin)
        .await
        .unwrap();

    assert!(catalog.home_events("Wuhan").await.unwrap().is_empty());
    assert_eq!(catalog.home_events("Xi'an").await.unwrap().len(), 1);
}

#[tokio::test]
async fn unpublished_events_stay_off_the_home_listing() {
    let (_pg, pool) = postgres_container().await;
    let admin = Uuid::new_v4();
    let (_purchases, catalog, _cache) = services(&pool);

    let mut hidden = draft("Hidden show", "Hangzhou", dec("30.00"));
    hidden.status = EventStatus::Unpublished;
    let event_id = catalog.create_event(&hidden, 10, admin).await.unwrap();

    assert!(catalog.home_events("Hangzhou").await.unwrap().is_empty());
    // Detail access still works and reports the unpublished state.
    let detail = catalog.event_detail(event_id).await.unwrap();
    assert!(!detail.published);
}

#[tokio::test]
async fn public_detail_never_carries_the_raw_count() {
    let (_pg, pool) = postgres_container().await;
    let event_id = seed_event(&pool, "Opaque show", "Beijing", dec("50.00"), 42).await;
    let (_purchases, catalog, _cache) = services(&pool);

    let detail = catalog.event_detail(event_id).await.unwrap();
    let json = serde_json::to_value(&detail).unwrap();
    assert!(json.get("stock").is_none(), "raw stock must stay hidden");
    assert_eq!(json.get("hasStock"), Some(&serde_json::Value::Bool(true)));

    // The admin surface gets the literal integer.
    let row = catalog.admin_event_detail(event_id).await.unwrap();
    assert_eq!(row.stock, 42);
}

#[tokio::test]
async fn a_missing_cache_backend_degrades_to_plain_reads() {
    let (_pg, pool) = postgres_container().await;
    let event_id = seed_event(&pool, "Uncached show", "Beijing", dec("50.00"), 3).await;
    let catalog = CatalogService::new(pool.clone(), Arc::new(NoopCache));

    // Every read hits the source of truth; writes are immediately visible.
    assert!(catalog.event_detail(event_id).await.unwrap().has_stock);
    sqlx::query("UPDATE events SET name = 'Fresh' WHERE id = $1")
        .bind(event_id)
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(catalog.event_detail(event_id).await.unwrap().name, "Fresh");

    let missing = catalog.event_detail(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, BoxofficeError::EventNotFound));
}
