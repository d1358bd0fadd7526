use sfk_schemas::OrderCreatedEvent;

/// Where `order_created` events go after a conversion commits.
///
/// Injected into [`crate::place_order`] by the caller; the engine holds no
/// ambient dispatch state. Delivery is fire-and-forget, at-least-once:
/// implementations must swallow (and log) their own failures, and consumers
/// must be idempotent. A failed publish never un-creates the order.
pub trait OrderEventSink: Send + Sync {
    fn publish(&self, event: &OrderCreatedEvent);
}
