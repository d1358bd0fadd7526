//! Pricing snapshot: the one place an order-item price comes from.

use rust_decimal::Decimal;
use sqlx::{PgConnection, Row};

use sfk_db::StoreError;

/// Read the current catalog unit price for `product_id`.
///
/// Pure read, no caching: called inside the conversion transaction so the
/// value copied into the order item is the price at the conversion instant.
pub async fn snapshot_unit_price(
    conn: &mut PgConnection,
    product_id: i64,
) -> Result<Decimal, StoreError> {
    let row = sqlx::query("select unit_price from products where product_id = $1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("product"))?;

    Ok(row.try_get("unit_price")?)
}
