//! Order conversion engine: the single path from cart to order.
//!
//! # Invariants
//!
//! **All-or-nothing:** order creation, order-item creation, and cart
//! deletion happen inside one database transaction. A cart is never left
//! deleted without its order; an order never exists with items missing
//! relative to the cart at conversion time.
//!
//! **Exactly-once:** the cart row is locked (`SELECT .. FOR UPDATE`) before
//! any mutation. Of two concurrent conversions of the same cart, exactly
//! one commits; the other serializes after it, observes the cart gone, and
//! fails with `NotFound`.
//!
//! **Price snapshot:** each order item copies the catalog unit price read
//! inside the conversion transaction. After commit the stored price is
//! decoupled from any later catalog change.
//!
//! **Post-commit notification:** the `order_created` event is published
//! only after the transaction commits, through an [`OrderEventSink`]
//! injected by the caller. Publication is best-effort and never rolls back
//! or fails the conversion.

mod engine;
mod sink;
mod snapshot;

pub use engine::place_order;
#[cfg(feature = "testkit")]
pub use engine::{place_order_with_fault, FaultPoint};
pub use sink::OrderEventSink;
pub use snapshot::snapshot_unit_price;
