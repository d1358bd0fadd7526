use thiserror::Error;

/// Error taxonomy shared by the storage layer, the conversion engine, and
/// the HTTP surface. Every variant maps to one stable status class; storage
/// detail never reaches the client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named record does not exist. A cart that was already converted
    /// surfaces here too; the row is gone.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request rejected before any mutation (bad quantity, empty cart, ...).
    #[error("{0}")]
    Validation(String),

    /// Caller identity is missing or unresolvable.
    #[error("caller is not authenticated")]
    Unauthorized,

    /// Caller is authenticated but not allowed to perform this operation.
    #[error("caller is not permitted to perform this operation")]
    Forbidden,

    /// Storage fault. Mid-transaction faults roll back fully before
    /// surfacing here; callers may retry.
    #[error("storage dependency failed")]
    Dependency(#[from] sqlx::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    /// A row decoded from the database holds a value the schema CHECKs
    /// should have made impossible.
    pub fn corrupt(msg: &str) -> Self {
        StoreError::Dependency(sqlx::Error::Decode(msg.to_string().into()))
    }
}

/// Detect a Postgres foreign-key violation (SQLSTATE 23503) by constraint name.
pub fn is_foreign_key_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.constraint() == Some(constraint)
                && db_err.code().as_deref() == Some("23503")
        }
        _ => false,
    }
}

/// Detect a Postgres unique constraint violation (SQLSTATE 23505) by name.
pub fn is_unique_constraint_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.constraint() == Some(constraint)
                || db_err.code().as_deref() == Some("23505")
                    && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
