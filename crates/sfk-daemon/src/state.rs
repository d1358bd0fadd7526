//! Shared runtime state for sfk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. All durable state is
//! in Postgres behind the pool; the only in-process state is the broadcast
//! bus that fans `order_created` events out to SSE subscribers.

use serde::{Deserialize, Serialize};
use sfk_checkout::OrderEventSink;
use sfk_schemas::OrderCreatedEvent;
use sqlx::PgPool;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    OrderCreated(OrderCreatedEvent),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in the health response.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Postgres pool; all cart/order state lives behind this.
    pub pool: PgPool,
    /// Broadcast bus for SSE notification consumers.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            pool,
            bus,
            build: BuildInfo {
                service: "sfk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// BusSink — OrderEventSink over the broadcast bus
// ---------------------------------------------------------------------------

/// Forwards committed `order_created` events onto the SSE bus.
///
/// Best-effort: with no live subscriber the send fails, which is fine; the
/// order is already durable and listing it remains the source of truth.
pub struct BusSink(pub broadcast::Sender<BusMsg>);

impl OrderEventSink for BusSink {
    fn publish(&self, event: &OrderCreatedEvent) {
        if self.0.send(BusMsg::OrderCreated(event.clone())).is_err() {
            tracing::debug!(order_id = event.order_id, "no subscribers; order_created dropped");
        }
    }
}
