//! Observer contract
//!
//! Callbacks run synchronously on the submitting thread while the
//! book lock is held: implementations must be fast, must not panic,
//! and must not re-enter the exchange for the same instrument (a
//! real deployment would hand events to a bounded queue).

use types::order::OrderSnapshot;
use types::trade::TradeSnapshot;

/// Receives every order state transition and execution.
pub trait ExchangeListener: Send + Sync {
    /// Called when an order's observable state changes: admission to
    /// the book, each fill, and cancellation.
    fn on_order(&self, _order: &OrderSnapshot) {}

    /// Called once per execution.
    fn on_trade(&self, _trade: &TradeSnapshot) {}
}

/// Listener that ignores every event. The default when no observer
/// is registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ExchangeListener for NoopListener {}
