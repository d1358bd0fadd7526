//! Order store: post-creation lifecycle and access-scoped querying.
//!
//! Orders are only ever created by the conversion engine (sfk-checkout);
//! nothing here inserts one. `placed_at` is set once at conversion and the
//! item unit prices are snapshots, both immutable. Payment status is the
//! only mutable field.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, PgPool, Row};

use sfk_schemas::{Order, OrderLine, OrderView, PaymentStatus};

use crate::error::StoreError;

/// Fetch one order with its items and total (sum of snapshotted prices).
pub async fn fetch_order(pool: &PgPool, order_id: i64) -> Result<OrderView, StoreError> {
    let row = sqlx::query(
        r#"
        select order_id, customer_id, placed_at, payment_status
        from orders
        where order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("order"))?;

    let order = order_from_row(&row)?;
    let mut lines = lines_for_orders(pool, &[order.order_id]).await?;
    let items = lines.remove(&order.order_id).unwrap_or_default();

    Ok(into_view(order, items))
}

/// Scoped fetch: only returns the order if it belongs to `customer_id`.
/// Another customer's order is indistinguishable from a missing one.
pub async fn fetch_order_for_customer(
    pool: &PgPool,
    order_id: i64,
    customer_id: i64,
) -> Result<OrderView, StoreError> {
    let row = sqlx::query(
        r#"
        select order_id, customer_id, placed_at, payment_status
        from orders
        where order_id = $1 and customer_id = $2
        "#,
    )
    .bind(order_id)
    .bind(customer_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("order"))?;

    let order = order_from_row(&row)?;
    let mut lines = lines_for_orders(pool, &[order.order_id]).await?;
    let items = lines.remove(&order.order_id).unwrap_or_default();

    Ok(into_view(order, items))
}

/// Privileged listing: every order in the store.
pub async fn list_orders_all(pool: &PgPool) -> Result<Vec<OrderView>, StoreError> {
    let rows = sqlx::query(
        r#"
        select order_id, customer_id, placed_at, payment_status
        from orders
        order by order_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    collect_views(pool, rows).await
}

/// Non-privileged listing: only the caller's own orders.
pub async fn list_orders_for_customer(
    pool: &PgPool,
    customer_id: i64,
) -> Result<Vec<OrderView>, StoreError> {
    let rows = sqlx::query(
        r#"
        select order_id, customer_id, placed_at, payment_status
        from orders
        where customer_id = $1
        order by order_id
        "#,
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    collect_views(pool, rows).await
}

/// Set the payment status. No transition graph is enforced; any status can
/// follow any other (privilege is checked at the HTTP boundary).
pub async fn update_order_status(
    pool: &PgPool,
    order_id: i64,
    status: PaymentStatus,
) -> Result<Order, StoreError> {
    let row = sqlx::query(
        r#"
        update orders
        set payment_status = $2
        where order_id = $1
        returning order_id, customer_id, placed_at, payment_status
        "#,
    )
    .bind(order_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("order"))?;

    order_from_row(&row)
}

/// Delete an order and its items (cascade). Privileged callers only; the
/// HTTP boundary enforces that.
pub async fn delete_order(pool: &PgPool, order_id: i64) -> Result<(), StoreError> {
    let res = sqlx::query("delete from orders where order_id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("order"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.try_get("payment_status")?;
    let payment_status = PaymentStatus::parse(status.trim())
        .ok_or_else(|| StoreError::corrupt("invalid payment status code"))?;

    Ok(Order {
        order_id: row.try_get("order_id")?,
        customer_id: row.try_get("customer_id")?,
        placed_at: row.try_get("placed_at")?,
        payment_status,
    })
}

/// Load the item lines for a set of orders in one query, keyed by order id.
async fn lines_for_orders(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<OrderLine>>, StoreError> {
    let rows = sqlx::query(
        r#"
        select oi.order_id, oi.product_id, p.title, oi.quantity, oi.unit_price
        from order_items oi
        join products p on p.product_id = oi.product_id
        where oi.order_id = any($1)
        order by oi.order_item_id
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for row in &rows {
        let order_id: i64 = row.try_get("order_id")?;
        let unit_price: Decimal = row.try_get("unit_price")?;
        let quantity: i32 = row.try_get("quantity")?;
        by_order.entry(order_id).or_default().push(OrderLine {
            product_id: row.try_get("product_id")?,
            title: row.try_get("title")?,
            quantity,
            unit_price,
            total_price: unit_price * Decimal::from(quantity),
        });
    }

    Ok(by_order)
}

async fn collect_views(pool: &PgPool, rows: Vec<PgRow>) -> Result<Vec<OrderView>, StoreError> {
    let orders = rows
        .iter()
        .map(order_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
    let mut lines = lines_for_orders(pool, &ids).await?;

    Ok(orders
        .into_iter()
        .map(|o| {
            let items = lines.remove(&o.order_id).unwrap_or_default();
            into_view(o, items)
        })
        .collect())
}

fn into_view(order: Order, items: Vec<OrderLine>) -> OrderView {
    let total_price = items.iter().map(|l| l.total_price).sum();
    OrderView {
        order_id: order.order_id,
        customer_id: order.customer_id,
        placed_at: order.placed_at,
        payment_status: order.payment_status,
        items,
        total_price,
    }
}
