//! Aggregated order-book snapshots

use crate::ids::ExchangeId;
use crate::price::FixedPrice;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One price level: the price and the sum of resting remaining
/// quantity at that price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: FixedPrice,
    pub quantity: u64,
}

/// Point-in-time aggregation of one instrument's book.
///
/// Levels are ordered best-to-worst (bids descending, asks
/// ascending); order ids follow the same level order with FIFO order
/// within a level. Market orders never appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<BookLevel>,
    pub bid_order_ids: Vec<ExchangeId>,
    pub asks: Vec<BookLevel>,
    pub ask_order_ids: Vec<ExchangeId>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

impl fmt::Display for BookSnapshot {
    /// Ladder dump: asks first, then a separator, then bids.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.asks {
            writeln!(f, "{} {}", level.price, level.quantity)?;
        }
        writeln!(f, "----------")?;
        for level in &self.bids {
            writeln!(f, "{} {}", level.price, level.quantity)?;
        }
        Ok(())
    }
}
