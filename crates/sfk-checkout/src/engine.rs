//! `place_order`: validate, lock, materialize, delete, commit, notify.

use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use sfk_db::{customer, order, StoreError};
use sfk_schemas::{OrderCreatedEvent, OrderView};

use crate::sink::OrderEventSink;
use crate::snapshot::snapshot_unit_price;

/// Where to inject a synthetic storage fault mid-conversion. Reachable only
/// through [`place_order_with_fault`] in testkit builds; used to prove the
/// rollback contract in scenario tests.
#[cfg(feature = "testkit")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Fail after the first order item has been written, before the second.
    BeforeSecondOrderItem,
    /// Fail after all order items have been written, before cart deletion.
    BeforeCartDelete,
}

#[cfg(not(feature = "testkit"))]
type FaultPoint = std::convert::Infallible;

/// Convert a cart into an order with exactly-once, all-or-nothing semantics.
///
/// Fails fast with `NotFound` (cart or customer absent) or
/// `Validation` (empty cart) before any mutation. Storage faults after the
/// order insert roll everything back and surface as `Dependency`; retrying
/// with the same cart id is safe: a successful prior conversion deleted
/// the cart, so the retry fails with `NotFound` instead of double-converting.
pub async fn place_order(
    pool: &PgPool,
    cart_id: Uuid,
    user_id: i64,
    sink: &dyn OrderEventSink,
) -> Result<OrderView, StoreError> {
    convert(pool, cart_id, user_id, sink, None).await
}

/// [`place_order`] with a synthetic fault injected at `fault`. Testkit only.
#[cfg(feature = "testkit")]
pub async fn place_order_with_fault(
    pool: &PgPool,
    cart_id: Uuid,
    user_id: i64,
    sink: &dyn OrderEventSink,
    fault: FaultPoint,
) -> Result<OrderView, StoreError> {
    convert(pool, cart_id, user_id, sink, Some(fault)).await
}

async fn convert(
    pool: &PgPool,
    cart_id: Uuid,
    user_id: i64,
    sink: &dyn OrderEventSink,
    fault: Option<FaultPoint>,
) -> Result<OrderView, StoreError> {
    let customer = customer::resolve_by_user(pool, user_id).await?;

    let mut tx = pool.begin().await?;

    // Lock the cart row. A concurrent conversion of the same cart blocks
    // here until this transaction commits, then sees the row gone.
    let locked = sqlx::query("select cart_id from carts where cart_id = $1 for update")
        .bind(cart_id)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        return Err(StoreError::NotFound("cart"));
    }

    let item_rows = sqlx::query(
        r#"
        select product_id, quantity
        from cart_items
        where cart_id = $1
        order by cart_item_id
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *tx)
    .await?;

    if item_rows.is_empty() {
        return Err(StoreError::validation("cart is empty"));
    }

    let order_row = sqlx::query(
        r#"
        insert into orders (customer_id)
        values ($1)
        returning order_id, placed_at
        "#,
    )
    .bind(customer.customer_id)
    .fetch_one(&mut *tx)
    .await?;
    let order_id: i64 = order_row.try_get("order_id")?;
    let placed_at = order_row.try_get("placed_at")?;

    for (idx, row) in item_rows.iter().enumerate() {
        #[cfg(feature = "testkit")]
        if idx == 1 && fault == Some(FaultPoint::BeforeSecondOrderItem) {
            return Err(StoreError::Dependency(sqlx::Error::PoolClosed));
        }
        let _ = idx;

        let product_id: i64 = row.try_get("product_id")?;
        let quantity: i32 = row.try_get("quantity")?;

        // Fresh catalog read inside the transaction; this is the price the
        // customer is charged, frozen into the order item.
        let unit_price = snapshot_unit_price(&mut *tx, product_id).await?;

        sqlx::query(
            r#"
            insert into order_items (order_id, product_id, quantity, unit_price)
            values ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(&mut *tx)
        .await?;
    }

    #[cfg(feature = "testkit")]
    if fault == Some(FaultPoint::BeforeCartDelete) {
        return Err(StoreError::Dependency(sqlx::Error::PoolClosed));
    }
    let _ = fault;

    // Cascade removes the cart items with the cart.
    sqlx::query("delete from carts where cart_id = $1")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(order_id, customer_id = customer.customer_id, %cart_id, "order created");

    // Post-commit only. The order is durable; a sink failure is the
    // consumer's problem, never the caller's.
    sink.publish(&OrderCreatedEvent {
        order_id,
        customer_id: customer.customer_id,
        placed_at,
    });

    match order::fetch_order(pool, order_id).await {
        Ok(view) => Ok(view),
        Err(e) => {
            warn!(order_id, "order committed but read-back failed: {e}");
            Err(e)
        }
    }
}
