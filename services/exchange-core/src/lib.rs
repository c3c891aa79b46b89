//! Matching Engine Core
//!
//! Multi-instrument, multi-session limit-order-book engine
//! implementing strict price-time-priority matching.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced (FIFO within a level)
//! - Trades execute at the passive (resting) order's price
//! - `filled + remaining == quantity` for every order
//! - Market orders never rest; unfilled remainders are cancelled
//! - Operations on one instrument are linearized by the book lock;
//!   listener callbacks for one operation never interleave with
//!   another operation on the same book
//!
//! The [`Exchange`] façade admits order intents, routes them to
//! per-instrument [`book::OrderBook`]s resolved through a lock-free
//! directory, and publishes every order-state change and trade to a
//! registered [`ExchangeListener`] synchronously under the book
//! lock.

pub mod book;
pub mod directory;
pub mod exchange;
pub mod listener;

pub use exchange::Exchange;
pub use listener::{ExchangeListener, NoopListener};
