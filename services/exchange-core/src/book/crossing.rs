//! Crossing rules
//!
//! A bid and an ask cross when the bid price is at or above the ask
//! price; a market price crosses any finite opposite price. A
//! crossing pair executes at the passive (resting) order's price —
//! the aggressor crossed into it.

use types::order::Side;
use types::price::{FixedPrice, Price};

/// Check whether the two book fronts can trade.
pub fn crosses(bid: Price, ask: Price) -> bool {
    match (bid, ask) {
        (Price::Market, _) | (_, Price::Market) => true,
        (Price::Limit(bid), Price::Limit(ask)) => bid >= ask,
    }
}

/// The price a crossing pair executes at: the price of the front
/// opposite the aggressor.
///
/// # Panics
/// Panics if the passive front is a market order: market orders
/// never rest, so one sitting opposite an aggressor means the book
/// state is corrupt.
pub fn execution_price(aggressor_side: Side, bid: Price, ask: Price) -> FixedPrice {
    let passive = match aggressor_side {
        Side::Buy => ask,
        Side::Sell => bid,
    };
    match passive.limit() {
        Some(price) => price,
        None => panic!("resting market order at the book front; ladder state is corrupt"),
    }
}
