//! Order book infrastructure module
//!
//! Price-level FIFO queues, the per-side price ladder, crossing
//! rules and the per-instrument order book.

pub mod crossing;
pub mod ladder;
pub mod order_book;
pub mod price_level;

pub use ladder::PriceLadder;
pub use order_book::{BookGuard, OrderBook};
pub use price_level::PriceLevel;
