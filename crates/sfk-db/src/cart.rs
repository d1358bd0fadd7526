//! Cart store: cart lifecycle and cart-item merge semantics.
//!
//! Carts store no prices. Every total computed here joins the *live*
//! catalog price; prices are only snapshotted when the cart converts to an
//! order (sfk-checkout).

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use sfk_schemas::{Cart, CartItem, CartLine, CartView};

use crate::catalog;
use crate::error::{is_foreign_key_violation, StoreError};

/// Create a new empty cart. The id is a UUIDv7: time-sortable, not
/// sequential, not guessable.
pub async fn create_cart(pool: &PgPool) -> Result<Cart, StoreError> {
    let cart_id = Uuid::now_v7();

    let row = sqlx::query(
        r#"
        insert into carts (cart_id)
        values ($1)
        returning cart_id, created_at
        "#,
    )
    .bind(cart_id)
    .fetch_one(pool)
    .await?;

    Ok(Cart {
        cart_id: row.try_get("cart_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Fetch a cart with its items and the computed total at live prices.
pub async fn fetch_cart(pool: &PgPool, cart_id: Uuid) -> Result<CartView, StoreError> {
    let cart_row = sqlx::query(
        "select cart_id, created_at from carts where cart_id = $1",
    )
    .bind(cart_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("cart"))?;

    let line_rows = sqlx::query(
        r#"
        select ci.product_id, p.title, p.unit_price, ci.quantity
        from cart_items ci
        join products p on p.product_id = ci.product_id
        where ci.cart_id = $1
        order by ci.cart_item_id
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(line_rows.len());
    let mut total_price = Decimal::ZERO;
    for row in &line_rows {
        let unit_price: Decimal = row.try_get("unit_price")?;
        let quantity: i32 = row.try_get("quantity")?;
        let line_total = unit_price * Decimal::from(quantity);
        total_price += line_total;
        items.push(CartLine {
            product_id: row.try_get("product_id")?,
            title: row.try_get("title")?,
            unit_price,
            quantity,
            total_price: line_total,
        });
    }

    Ok(CartView {
        cart_id: cart_row.try_get("cart_id")?,
        created_at: cart_row.try_get("created_at")?,
        items,
        total_price,
    })
}

/// Add a product to a cart, merging into the existing row if one exists.
///
/// The (cart, product) pair is unique; adding a product already in the cart
/// increments its quantity by `quantity` instead of creating a second row.
/// The upsert makes the merge atomic, so two concurrent adds both land.
pub async fn add_cart_item(
    pool: &PgPool,
    cart_id: Uuid,
    product_id: i64,
    quantity: i32,
) -> Result<CartItem, StoreError> {
    if quantity < 1 {
        return Err(StoreError::validation("quantity must be at least 1"));
    }
    if !catalog::product_exists(pool, product_id).await? {
        return Err(StoreError::NotFound("product"));
    }

    let res = sqlx::query(
        r#"
        insert into cart_items (cart_id, product_id, quantity)
        values ($1, $2, $3)
        on conflict (cart_id, product_id)
        do update set quantity = cart_items.quantity + excluded.quantity
        returning cart_item_id, cart_id, product_id, quantity
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await;

    let row = match res {
        Ok(row) => row,
        Err(e) if is_foreign_key_violation(&e, "cart_items_cart_id_fkey") => {
            return Err(StoreError::NotFound("cart"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(CartItem {
        cart_item_id: row.try_get("cart_item_id")?,
        cart_id: row.try_get("cart_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
    })
}

/// Set the absolute quantity of an existing cart item (no merge).
pub async fn update_cart_item(
    pool: &PgPool,
    cart_id: Uuid,
    product_id: i64,
    quantity: i32,
) -> Result<CartItem, StoreError> {
    if quantity < 1 {
        return Err(StoreError::validation("quantity must be at least 1"));
    }

    let row = sqlx::query(
        r#"
        update cart_items
        set quantity = $3
        where cart_id = $1 and product_id = $2
        returning cart_item_id, cart_id, product_id, quantity
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("cart item"))?;

    Ok(CartItem {
        cart_item_id: row.try_get("cart_item_id")?,
        cart_id: row.try_get("cart_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
    })
}

/// Remove one product from a cart. Idempotent: removing an absent item is
/// not an error.
pub async fn remove_cart_item(
    pool: &PgPool,
    cart_id: Uuid,
    product_id: i64,
) -> Result<(), StoreError> {
    sqlx::query("delete from cart_items where cart_id = $1 and product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a cart and all of its items (cascade).
pub async fn delete_cart(pool: &PgPool, cart_id: Uuid) -> Result<(), StoreError> {
    let res = sqlx::query("delete from carts where cart_id = $1")
        .bind(cart_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("cart"));
    }
    Ok(())
}
