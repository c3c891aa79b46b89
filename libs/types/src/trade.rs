//! Trade execution snapshots

use crate::ids::ExchangeId;
use crate::price::FixedPrice;
use serde::{Deserialize, Serialize};

/// An execution between an incoming (aggressor) order and a resting
/// (passive) order.
///
/// The price is always the passive order's resting price. `exec_id`
/// is derived from the wall clock and monotonized: it never
/// decreases, but ties are permitted across instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSnapshot {
    pub price: FixedPrice,
    pub quantity: u64,
    pub aggressor_id: ExchangeId,
    pub passive_id: ExchangeId,
    pub exec_id: i64,
}

impl TradeSnapshot {
    /// Notional value of the trade (price × quantity).
    ///
    /// # Panics
    /// Panics if the notional overflows the fixed-point range.
    pub fn notional(&self) -> FixedPrice {
        self.price * FixedPrice::from_int(self.quantity as i64)
    }
}
