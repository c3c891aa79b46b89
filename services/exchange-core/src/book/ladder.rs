//! Per-side price ladder
//!
//! Ordered collection of non-empty price levels for one side of the
//! book. Levels are keyed by a side-aware sort key so that ascending
//! map order is always best-to-worst: ask keys are the raw price
//! (lowest first), bid keys are the negated raw price (highest
//! first), and a market price keys below every finite price on
//! either side. Empty levels are removed immediately.

use super::price_level::PriceLevel;
use std::collections::BTreeMap;
use std::sync::Arc;
use types::order::{Order, Side};
use types::price::Price;

/// Best-to-worst sort key for a price on the given side.
///
/// `i64::MIN` is reserved for `Price::Market`: negating a bid raw of
/// `i64::MIN` would otherwise overflow onto the market key, so the
/// lowest representable bid saturates to `i64::MAX` (the worst rank)
/// instead.
fn sort_key(side: Side, price: Price) -> i64 {
    match price {
        Price::Market => i64::MIN,
        Price::Limit(price) => match side {
            Side::Sell => price.raw(),
            Side::Buy => price.raw().checked_neg().unwrap_or(i64::MAX),
        },
    }
}

/// One side of an instrument's book.
#[derive(Debug)]
pub struct PriceLadder {
    side: Side,
    levels: BTreeMap<i64, PriceLevel>,
}

impl PriceLadder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Queue an order at its price level, creating the level in
    /// sorted position if it does not exist.
    pub fn insert(&mut self, order: Arc<Order>) {
        let price = order.price();
        self.levels
            .entry(sort_key(self.side, price))
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(order);
    }

    /// Detach an order from its level, collapsing the level if it
    /// empties.
    ///
    /// # Panics
    /// Panics if no level exists for the order's price; the book is
    /// unrecoverable at that point.
    pub fn remove(&mut self, order: &Order) {
        let key = sort_key(self.side, order.price());
        match self.levels.get_mut(&key) {
            Some(level) => {
                level.remove(order);
                if level.is_empty() {
                    self.levels.remove(&key);
                }
            }
            None => panic!(
                "price level {} missing for order {}",
                order.price(),
                order.exchange_id()
            ),
        }
    }

    /// The FIFO head of the best price level, or `None`.
    pub fn front(&self) -> Option<Arc<Order>> {
        self.levels
            .values()
            .next()
            .and_then(|level| level.front().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of non-empty price levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Iterate levels best-to-worst.
    pub fn levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }
}
