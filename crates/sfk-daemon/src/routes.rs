//! Axum router and all HTTP handlers for sfk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.  All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;
use uuid::Uuid;

use sfk_db::{cart, customer, order, StoreError};
use sfk_schemas::CartView;

use crate::{
    api_types::{
        AddCartItemRequest, CreateOrderRequest, ErrorResponse, HealthResponse,
        UpdateCartItemRequest, UpdateOrderRequest,
    },
    caller::Caller,
    state::{AppState, BusMsg, BusSink},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        .route("/v1/carts", post(cart_create))
        .route("/v1/carts/:cart_id", get(cart_get).delete(cart_delete))
        .route("/v1/carts/:cart_id/items", post(cart_item_add))
        .route(
            "/v1/carts/:cart_id/items/:product_id",
            axum::routing::patch(cart_item_update).delete(cart_item_remove),
        )
        .route("/v1/orders", post(order_create).get(orders_list))
        .route(
            "/v1/orders/:order_id",
            get(order_get).patch(order_update).delete(order_delete),
        )
        .with_state(state)
}

/// Map a [`StoreError`] onto its stable status class and body.
fn store_error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Unauthorized => StatusCode::UNAUTHORIZED,
        StoreError::Forbidden => StatusCode::FORBIDDEN,
        StoreError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // The client body stays generic; the detail goes to the log only.
    if let StoreError::Dependency(source) = &err {
        tracing::error!("storage dependency failed: {source}");
    }

    (status, Json(ErrorResponse { error: err.to_string() })).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/carts
// ---------------------------------------------------------------------------

/// Create a new empty cart. Anonymous; carts carry no owner.
pub(crate) async fn cart_create(State(st): State<Arc<AppState>>) -> Response {
    match cart::create_cart(&st.pool).await {
        Ok(c) => {
            info!(cart_id = %c.cart_id, "cart created");
            let view = CartView {
                cart_id: c.cart_id,
                created_at: c.created_at,
                items: Vec::new(),
                total_price: Decimal::ZERO,
            };
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/carts/{cart_id}
// ---------------------------------------------------------------------------

pub(crate) async fn cart_get(
    State(st): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
) -> Response {
    match cart::fetch_cart(&st.pool, cart_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /v1/carts/{cart_id}
// ---------------------------------------------------------------------------

pub(crate) async fn cart_delete(
    State(st): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
) -> Response {
    match cart::delete_cart(&st.pool, cart_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/carts/{cart_id}/items
// ---------------------------------------------------------------------------

/// Add a product to the cart; merges into an existing row for the same
/// product instead of duplicating it.
pub(crate) async fn cart_item_add(
    State(st): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
    Json(req): Json<AddCartItemRequest>,
) -> Response {
    match cart::add_cart_item(&st.pool, cart_id, req.product_id, req.quantity).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// PATCH /v1/carts/{cart_id}/items/{product_id}
// ---------------------------------------------------------------------------

pub(crate) async fn cart_item_update(
    State(st): State<Arc<AppState>>,
    Path((cart_id, product_id)): Path<(Uuid, i64)>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Response {
    match cart::update_cart_item(&st.pool, cart_id, product_id, req.quantity).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /v1/carts/{cart_id}/items/{product_id}
// ---------------------------------------------------------------------------

pub(crate) async fn cart_item_remove(
    State(st): State<Arc<AppState>>,
    Path((cart_id, product_id)): Path<(Uuid, i64)>,
) -> Response {
    match cart::remove_cart_item(&st.pool, cart_id, product_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

/// Convert the caller's cart into an order.
///
/// The conversion itself is `sfk_checkout::place_order`; this handler only
/// resolves identity and wires the bus-backed event sink in.
pub(crate) async fn order_create(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Json(req): Json<CreateOrderRequest>,
) -> Response {
    let sink = BusSink(st.bus.clone());
    match sfk_checkout::place_order(&st.pool, req.cart_id, caller.user_id, &sink).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        // An authenticated user with no customer record is an identity
        // problem, not a missing-resource problem.
        Err(StoreError::NotFound("customer")) => store_error_response(StoreError::Unauthorized),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/orders
// ---------------------------------------------------------------------------

/// Scoped listing: staff see every order, everyone else only their own.
/// Enforced here at the query boundary: the non-privileged path never
/// executes the unscoped query.
pub(crate) async fn orders_list(State(st): State<Arc<AppState>>, caller: Caller) -> Response {
    if caller.staff {
        return match order::list_orders_all(&st.pool).await {
            Ok(views) => (StatusCode::OK, Json(views)).into_response(),
            Err(e) => store_error_response(e),
        };
    }

    let cust = match customer::resolve_by_user(&st.pool, caller.user_id).await {
        Ok(c) => c,
        Err(StoreError::NotFound("customer")) => {
            return store_error_response(StoreError::Unauthorized)
        }
        Err(e) => return store_error_response(e),
    };

    match order::list_orders_for_customer(&st.pool, cust.customer_id).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/orders/{order_id}
// ---------------------------------------------------------------------------

pub(crate) async fn order_get(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<i64>,
) -> Response {
    if caller.staff {
        return match order::fetch_order(&st.pool, order_id).await {
            Ok(view) => (StatusCode::OK, Json(view)).into_response(),
            Err(e) => store_error_response(e),
        };
    }

    let cust = match customer::resolve_by_user(&st.pool, caller.user_id).await {
        Ok(c) => c,
        Err(StoreError::NotFound("customer")) => {
            return store_error_response(StoreError::Unauthorized)
        }
        Err(e) => return store_error_response(e),
    };

    // Another customer's order deliberately reads as 404, not 403.
    match order::fetch_order_for_customer(&st.pool, order_id, cust.customer_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/{order_id}
// ---------------------------------------------------------------------------

/// Privileged payment-status override. Any status may follow any other;
/// there is no transition graph.
pub(crate) async fn order_update(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<i64>,
    Json(req): Json<UpdateOrderRequest>,
) -> Response {
    if !caller.staff {
        return store_error_response(StoreError::Forbidden);
    }

    match order::update_order_status(&st.pool, order_id, req.payment_status).await {
        Ok(updated) => {
            info!(order_id, status = updated.payment_status.as_str(), "payment status updated");
            let _ = st.bus.send(BusMsg::LogLine {
                level: "INFO".to_string(),
                msg: format!("order {order_id} payment status -> {}", updated.payment_status.as_str()),
            });
            (StatusCode::OK, Json(updated)).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /v1/orders/{order_id}
// ---------------------------------------------------------------------------

pub(crate) async fn order_delete(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<i64>,
) -> Response {
    if !caller.staff {
        return store_error_response(StoreError::Forbidden);
    }

    match order::delete_order(&st.pool, order_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::OrderCreated(_) => "order_created",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_stable_status_classes() {
        let cases: Vec<(StoreError, StatusCode)> = vec![
            (StoreError::NotFound("cart"), StatusCode::NOT_FOUND),
            (
                StoreError::validation("quantity must be at least 1"),
                StatusCode::BAD_REQUEST,
            ),
            (StoreError::Unauthorized, StatusCode::UNAUTHORIZED),
            (StoreError::Forbidden, StatusCode::FORBIDDEN),
            (
                StoreError::Dependency(sqlx::Error::PoolClosed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let resp = store_error_response(err);
            assert_eq!(resp.status(), expected);
        }
    }

    #[test]
    fn dependency_error_body_does_not_leak_storage_detail() {
        let err = StoreError::Dependency(sqlx::Error::PoolClosed);
        assert_eq!(err.to_string(), "storage dependency failed");
    }
}
