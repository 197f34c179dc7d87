//! Purchase orchestration: the only component that spans the inventory
//! ledger and the order store.
//!
//! Placing an order is reserve-then-record with mandatory compensation:
//! any failure after a successful reservation releases the stock before
//! the error surfaces. Cancelling is the reverse, and the order of the
//! two steps matters — the status flips to CANCELLED first, the stock is
//! credited second. A crash in between leaves stock under-released, which
//! a reconciliation sweep can repair; releasing first could double-credit,
//! which nothing can repair.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::{self, ReadCache};
use crate::error::{BoxofficeError, Result};
use crate::events;
use crate::ledger::{self, ReleaseOutcome, ReserveOutcome};
use crate::orders::{self, NewOrder, Order, OrderStatus, TransitionOutcome};

#[derive(Clone)]
pub struct PurchaseService {
    pool: PgPool,
    cache: Arc<dyn ReadCache>,
}

impl PurchaseService {
    pub fn new(pool: PgPool, cache: Arc<dyn ReadCache>) -> Self {
        Self { pool, cache }
    }

    /// Place an order for `quantity` tickets. Returns the new order id, or
    /// `SoldOut` when the reservation loses the race for remaining stock.
    ///
    /// The price is re-read server-side after the reservation; client
    /// supplied price fields never reach this layer.
    pub async fn place_order(&self, user_id: Uuid, event_id: Uuid, quantity: i32) -> Result<Uuid> {
        if quantity <= 0 {
            return Err(BoxofficeError::InvalidQuantity(quantity));
        }

        match ledger::reserve(&self.pool, event_id, quantity).await? {
            ReserveOutcome::Reserved => {}
            ReserveOutcome::InsufficientStock => return Err(BoxofficeError::SoldOut),
            ReserveOutcome::NotFound => return Err(BoxofficeError::EventNotFound),
        }

        // From here on the reservation is live; every early exit must
        // compensate.
        let event = match events::get(&self.pool, event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                self.compensate(event_id, quantity).await;
                return Err(BoxofficeError::EventNotFound);
            }
            Err(e) => {
                self.compensate(event_id, quantity).await;
                return Err(e.into());
            }
        };

        let total_price = event.price * Decimal::from(quantity);
        let new_order = NewOrder {
            user_id,
            event_id,
            quantity,
            total_price,
        };
        let order_id = match orders::create(&self.pool, &new_order).await {
            Ok(id) => id,
            Err(e) => {
                self.compensate(event_id, quantity).await;
                return Err(e.into());
            }
        };

        info!(%order_id, %event_id, %user_id, quantity, %total_price, "order placed");
        self.invalidate_event(event_id, &event.city).await;

        Ok(order_id)
    }

    /// Cancel a PENDING order owned by `user_id` and release its tickets.
    pub async fn cancel_order(&self, order_id: Uuid, user_id: Uuid) -> Result<()> {
        let order = orders::get(&self.pool, order_id)
            .await?
            .ok_or(BoxofficeError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(BoxofficeError::Forbidden);
        }

        self.cancel_inner(order, user_id).await
    }

    /// Administrative cancel: same sequence, no ownership check.
    pub async fn cancel_order_as_admin(&self, order_id: Uuid, actor_id: Uuid) -> Result<()> {
        let order = orders::get(&self.pool, order_id)
            .await?
            .ok_or(BoxofficeError::OrderNotFound)?;

        self.cancel_inner(order, actor_id).await
    }

    async fn cancel_inner(&self, order: Order, actor_id: Uuid) -> Result<()> {
        // The conditional transition is the winner-picking point: of any
        // number of concurrent cancels, exactly one gets Applied, and only
        // that one releases stock.
        match orders::transition_status(
            &self.pool,
            order.id,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            actor_id,
        )
        .await?
        {
            TransitionOutcome::Applied => {}
            TransitionOutcome::Conflict => return Err(BoxofficeError::NotCancellable),
            TransitionOutcome::NotFound => return Err(BoxofficeError::OrderNotFound),
        }

        if let ReleaseOutcome::NotFound =
            ledger::release(&self.pool, order.event_id, order.quantity).await?
        {
            // The transition already won and the order is terminal; a
            // vanished event has nothing left to credit.
            warn!(order_id = %order.id, event_id = %order.event_id, "release skipped: event no longer exists");
        }

        info!(order_id = %order.id, event_id = %order.event_id, quantity = order.quantity, "order cancelled");
        self.invalidate_event_by_id(order.event_id).await;

        Ok(())
    }

    /// Load one order, enforcing ownership.
    pub async fn order_detail(&self, order_id: Uuid, user_id: Uuid) -> Result<Order> {
        let order = orders::get(&self.pool, order_id)
            .await?
            .ok_or(BoxofficeError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(BoxofficeError::Forbidden);
        }
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        Ok(orders::list_by_user(&self.pool, user_id).await?)
    }

    /// Delete a CANCELLED order. CANCELLED is terminal and its reservation
    /// is already released, so deletion has no inventory effect.
    pub async fn delete_order(&self, order_id: Uuid, user_id: Uuid) -> Result<()> {
        let order = orders::get(&self.pool, order_id)
            .await?
            .ok_or(BoxofficeError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(BoxofficeError::Forbidden);
        }
        if order.status != OrderStatus::Cancelled {
            return Err(BoxofficeError::NotDeletable);
        }

        if !orders::delete(&self.pool, order_id).await? {
            return Err(BoxofficeError::OrderNotFound);
        }
        Ok(())
    }

    /// Whether any tickets remain. This is all a customer ever learns
    /// about stock.
    pub async fn availability(&self, event_id: Uuid) -> Result<bool> {
        Ok(self.stock_level(event_id).await? > 0)
    }

    /// Literal stock count, for administrative callers only.
    pub async fn stock_level(&self, event_id: Uuid) -> Result<i32> {
        events::stock(&self.pool, event_id)
            .await?
            .ok_or(BoxofficeError::EventNotFound)
    }

    /// Release a reservation that will never become an order.
    async fn compensate(&self, event_id: Uuid, quantity: i32) {
        match ledger::release(&self.pool, event_id, quantity).await {
            Ok(ReleaseOutcome::Released) => {}
            Ok(ReleaseOutcome::NotFound) => {
                warn!(%event_id, quantity, "event vanished before compensating release")
            }
            Err(e) => {
                // Stock stays reserved with no order. Recoverable, but only
                // by an out-of-band reconciliation sweep.
                error!(%event_id, quantity, error = %e, "compensating release failed; reconciliation required");
            }
        }
    }

    async fn invalidate_event(&self, event_id: Uuid, city: &str) {
        self.cache.invalidate(&cache::event_detail_key(event_id)).await;
        self.cache.invalidate(&cache::home_events_key(city)).await;
    }

    /// Invalidation for paths that only hold the event id. If the event is
    /// gone there is no listing bucket left to clear.
    async fn invalidate_event_by_id(&self, event_id: Uuid) {
        self.cache.invalidate(&cache::event_detail_key(event_id)).await;
        if let Ok(Some(event)) = events::get(&self.pool, event_id).await {
            self.cache.invalidate(&cache::home_events_key(&event.city)).await;
        }
    }
}
