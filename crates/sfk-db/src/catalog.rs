//! Read-only catalog lookups. This core never mutates product price or
//! inventory; catalog CRUD belongs to an external collaborator.

use sqlx::{PgPool, Row};

use sfk_schemas::Product;

use crate::error::StoreError;

pub async fn product_exists(pool: &PgPool, product_id: i64) -> Result<bool, StoreError> {
    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        "select exists (select 1 from products where product_id = $1)",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn fetch_product(pool: &PgPool, product_id: i64) -> Result<Product, StoreError> {
    let row = sqlx::query(
        r#"
        select product_id, title, slug, description, unit_price, inventory, last_update
        from products
        where product_id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("product"))?;

    Ok(Product {
        product_id: row.try_get("product_id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        unit_price: row.try_get("unit_price")?,
        inventory: row.try_get("inventory")?,
        last_update: row.try_get("last_update")?,
    })
}
