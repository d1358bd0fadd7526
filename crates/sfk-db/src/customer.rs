//! Customer resolution. Identity itself (users, tokens) lives with the
//! external auth collaborator; this module only maps its `user_id` onto the
//! customer record.

use sqlx::{postgres::PgRow, PgPool, Row};

use sfk_schemas::{Customer, Membership};

use crate::error::StoreError;

/// Resolve the caller's customer record by the externally-issued user id.
pub async fn resolve_by_user(pool: &PgPool, user_id: i64) -> Result<Customer, StoreError> {
    let row = sqlx::query(
        r#"
        select customer_id, user_id, phone, birth_date, membership
        from customers
        where user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("customer"))?;

    customer_from_row(&row)
}

pub async fn fetch_customer(pool: &PgPool, customer_id: i64) -> Result<Customer, StoreError> {
    let row = sqlx::query(
        r#"
        select customer_id, user_id, phone, birth_date, membership
        from customers
        where customer_id = $1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("customer"))?;

    customer_from_row(&row)
}

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    let membership: String = row.try_get("membership")?;
    let membership = Membership::parse(membership.trim())
        .ok_or_else(|| StoreError::corrupt("invalid membership code"))?;

    Ok(Customer {
        customer_id: row.try_get("customer_id")?,
        user_id: row.try_get("user_id")?,
        phone: row.try_get("phone")?,
        birth_date: row.try_get("birth_date")?,
        membership,
    })
}
