//! Ticket inventory and order lifecycle subsystem.
//!
//! The store of record is a single Postgres database; every contended
//! mutation (stock, order status) is one conditional UPDATE, never a
//! read-modify-write pair. The [`purchase::PurchaseService`] is the only
//! component that spans the inventory ledger and the order store.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod events;
pub mod ledger;
pub mod orders;
pub mod purchase;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use cache::{MemoryCache, NoopCache, ReadCache, RedisCache};
pub use catalog::{CatalogService, EventDetail, EventSummary};
pub use error::{BoxofficeError, Result};
pub use orders::OrderStatus;
pub use purchase::PurchaseService;

/// Run the embedded SQL migrations against a pool.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| BoxofficeError::Database(e.into()))?;
    Ok(())
}
