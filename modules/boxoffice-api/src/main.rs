use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use boxoffice_common::Config;
use boxoffice_core::{CatalogService, NoopCache, PurchaseService, ReadCache, RedisCache};

mod error;
mod identity;
mod rest;

pub struct AppState {
    pub purchases: PurchaseService,
    pub catalog: CatalogService,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("boxoffice_core=info".parse()?)
                .add_directive("boxoffice_api=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await?;
    boxoffice_core::migrate(&pool).await?;

    // The cache is best-effort: an unreachable Redis downgrades to
    // cache-less operation instead of failing startup.
    let cache: Arc<dyn ReadCache> = match &config.redis_url {
        Some(url) => match RedisCache::connect(url).await {
            Ok(redis) => {
                info!("read cache: redis");
                Arc::new(redis)
            }
            Err(e) => {
                warn!(error = %e, "redis unreachable, running cache-less");
                Arc::new(NoopCache)
            }
        },
        None => {
            info!("read cache: disabled");
            Arc::new(NoopCache)
        }
    };

    let state = Arc::new(AppState {
        purchases: PurchaseService::new(pool.clone(), cache.clone()),
        catalog: CatalogService::new(pool, cache),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Public catalog
        .route("/events", get(rest::events::home_events))
        .route("/events/{id}", get(rest::events::event_detail))
        .route("/events/{id}/availability", get(rest::events::availability))
        // Orders
        .route(
            "/orders",
            post(rest::orders::place_order).get(rest::orders::my_orders),
        )
        .route(
            "/orders/{id}",
            get(rest::orders::order_detail).delete(rest::orders::delete_order),
        )
        .route("/orders/{id}/cancel", post(rest::orders::cancel_order))
        // Admin
        .route("/admin/events", post(rest::admin::create_event))
        .route(
            "/admin/events/{id}",
            get(rest::admin::event_detail)
                .put(rest::admin::update_event)
                .delete(rest::admin::delete_event),
        )
        .route("/admin/orders/{id}/cancel", post(rest::admin::cancel_order))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!(%addr, "boxoffice api listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
