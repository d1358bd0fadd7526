//! Caller identity extraction.
//!
//! Authentication itself is an external collaborator: an upstream gateway
//! validates the session and injects trusted identity headers. This daemon
//! only reads them: a missing or malformed header is a 401, and "staff"
//! role is what makes a caller privileged.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api_types::ErrorResponse;

pub const HDR_USER_ID: &str = "x-user-id";
pub const HDR_USER_ROLE: &str = "x-user-role";

/// The resolved caller of an authenticated route.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    /// Identity token issued by the external auth collaborator.
    pub user_id: i64,
    /// Privileged callers may list all orders, override payment status,
    /// and delete orders.
    pub staff: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(HDR_USER_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());

        let Some(user_id) = user_id else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "caller is not authenticated".to_string(),
                }),
            )
                .into_response());
        };

        let staff = parts
            .headers
            .get(HDR_USER_ROLE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("staff"))
            .unwrap_or(false);

        Ok(Caller { user_id, staff })
    }
}
