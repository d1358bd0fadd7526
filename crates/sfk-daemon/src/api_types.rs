//! Request and response types for all sfk-daemon HTTP endpoints.
//!
//! One tagged struct per operation; no shared request "shape" varying by
//! verb. These are `Serialize + Deserialize` so they can be JSON-encoded by
//! Axum and decoded by tests. No business logic lives here.

use serde::{Deserialize, Serialize};
use sfk_schemas::PaymentStatus;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// Stable error body for every non-2xx response. The message names the
/// taxonomy kind only; storage detail never leaks here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Cart item requests
// ---------------------------------------------------------------------------

/// POST /v1/carts/{cart_id}/items (merge-on-add).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// PATCH /v1/carts/{cart_id}/items/{product_id} (absolute quantity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// Order requests
// ---------------------------------------------------------------------------

/// POST /v1/orders: convert the referenced cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub cart_id: Uuid,
}

/// PATCH /v1/orders/{order_id}: privileged payment-status override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub payment_status: PaymentStatus,
}
