//! Order identity, lifecycle counters and snapshots
//!
//! An [`Order`] is shared between the price ladder it rests on, the
//! order directory and any observer that holds a snapshot reference.
//! Identity fields are immutable; lifecycle counters live in atomics
//! and are mutated only by the owning book while it holds its lock.
//! Readers that do not hold the book lock (the order directory's
//! full enumeration) observe stale-but-well-formed values.

use crate::ids::ExchangeId;
use crate::price::{FixedPrice, Price};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Ladder slot handle value meaning "not attached to any level".
const DETACHED: u64 = u64::MAX;

/// A live order.
///
/// Created by the exchange on admission and retained for the process
/// lifetime. The lifecycle mutators ([`fill`](Order::fill),
/// [`cancel`](Order::cancel), [`relist_as`](Order::relist_as)) and
/// the ladder handle must only be touched by the owning book under
/// its lock.
#[derive(Debug)]
pub struct Order {
    exchange_id: ExchangeId,
    session_id: String,
    client_order_id: String,
    instrument: String,
    side: Side,
    is_quote: bool,
    market: bool,
    submitted_at: i64,

    price_raw: AtomicI64,
    quantity: AtomicU64,
    remaining: AtomicU64,
    filled: AtomicU64,
    cum_qty: AtomicU64,
    avg_price_raw: AtomicI64,
    slot: AtomicU64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exchange_id: ExchangeId,
        session_id: impl Into<String>,
        client_order_id: impl Into<String>,
        instrument: impl Into<String>,
        side: Side,
        price: Price,
        quantity: u64,
        is_quote: bool,
        submitted_at: i64,
    ) -> Self {
        Self {
            exchange_id,
            session_id: session_id.into(),
            client_order_id: client_order_id.into(),
            instrument: instrument.into(),
            side,
            is_quote,
            market: price.is_market(),
            submitted_at,
            price_raw: AtomicI64::new(price.limit().unwrap_or(FixedPrice::ZERO).raw()),
            quantity: AtomicU64::new(quantity),
            remaining: AtomicU64::new(quantity),
            filled: AtomicU64::new(0),
            cum_qty: AtomicU64::new(0),
            avg_price_raw: AtomicI64::new(0),
            slot: AtomicU64::new(DETACHED),
        }
    }

    pub fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn client_order_id(&self) -> &str {
        &self.client_order_id
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_quote(&self) -> bool {
        self.is_quote
    }

    pub fn is_market(&self) -> bool {
        self.market
    }

    /// Submission timestamp, unix nanoseconds.
    pub fn submitted_at(&self) -> i64 {
        self.submitted_at
    }

    pub fn price(&self) -> Price {
        if self.market {
            Price::Market
        } else {
            Price::Limit(FixedPrice::from_raw(self.price_raw.load(Ordering::Relaxed)))
        }
    }

    /// Current order quantity (the original size, or the size of the
    /// latest quote replacement).
    pub fn quantity(&self) -> u64 {
        self.quantity.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn filled(&self) -> u64 {
        self.filled.load(Ordering::Relaxed)
    }

    /// Total quantity filled over the order's lifetime, across quote
    /// replacements.
    pub fn cumulative_filled(&self) -> u64 {
        self.cum_qty.load(Ordering::Relaxed)
    }

    /// Volume-weighted average price over all fills.
    pub fn average_fill_price(&self) -> FixedPrice {
        FixedPrice::from_raw(self.avg_price_raw.load(Ordering::Relaxed))
    }

    pub fn is_active(&self) -> bool {
        self.remaining() > 0
    }

    pub fn is_filled(&self) -> bool {
        self.remaining() == 0 && self.filled() == self.quantity()
    }

    pub fn is_cancelled(&self) -> bool {
        self.remaining() == 0 && self.filled() != self.quantity()
    }

    /// Terminal with at least one fill.
    pub fn is_partially_filled(&self) -> bool {
        self.remaining() == 0 && self.filled() > 0
    }

    /// Whether the order is currently attached to a price level.
    pub fn is_listed(&self) -> bool {
        self.slot.load(Ordering::Relaxed) != DETACHED
    }

    /// Record a fill. Owning-book lock required.
    ///
    /// Updates `remaining`, `filled` and the running volume-weighted
    /// average fill price.
    pub fn fill(&self, quantity: u64, price: FixedPrice) {
        let remaining = self.remaining.load(Ordering::Relaxed);
        debug_assert!(quantity > 0, "fill of zero quantity");
        debug_assert!(quantity <= remaining, "fill exceeds remaining quantity");
        let cum = self.cum_qty.load(Ordering::Relaxed);
        let avg = self.average_fill_price().weighted_avg(cum, price, quantity);

        self.remaining.store(remaining - quantity, Ordering::Relaxed);
        self.filled.fetch_add(quantity, Ordering::Relaxed);
        self.avg_price_raw.store(avg.raw(), Ordering::Relaxed);
        self.cum_qty.store(cum + quantity, Ordering::Relaxed);
    }

    /// Cancel: zero the remaining quantity, leaving `filled` as-is.
    /// Owning-book lock required.
    pub fn cancel(&self) {
        self.remaining.store(0, Ordering::Relaxed);
    }

    /// Reset price and size for a quote replacement. Only valid while
    /// the order is detached from any ladder. Cumulative fill
    /// statistics survive the replacement. Owning-book lock required.
    pub fn relist_as(&self, price: FixedPrice, quantity: u64) {
        debug_assert!(!self.is_listed(), "relist of a listed order");
        debug_assert!(!self.market, "relist of a market order");
        self.price_raw.store(price.raw(), Ordering::Relaxed);
        self.quantity.store(quantity, Ordering::Relaxed);
        self.remaining.store(quantity, Ordering::Relaxed);
        self.filled.store(0, Ordering::Relaxed);
    }

    /// Attach the ladder slot handle. Called by the price level that
    /// now holds the order. Owning-book lock required.
    pub fn attach(&self, slot: u64) {
        debug_assert!(slot != DETACHED, "reserved slot handle");
        self.slot.store(slot, Ordering::Relaxed);
    }

    /// Clear the ladder slot handle. Owning-book lock required.
    pub fn detach(&self) {
        self.slot.store(DETACHED, Ordering::Relaxed);
    }

    /// Current ladder slot handle, or `None` when detached.
    pub fn list_slot(&self) -> Option<u64> {
        match self.slot.load(Ordering::Relaxed) {
            DETACHED => None,
            slot => Some(slot),
        }
    }

    /// Point-in-time copy of identity and lifecycle state.
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            exchange_id: self.exchange_id,
            session_id: self.session_id.clone(),
            client_order_id: self.client_order_id.clone(),
            instrument: self.instrument.clone(),
            side: self.side,
            price: self.price(),
            quantity: self.quantity(),
            remaining: self.remaining(),
            filled: self.filled(),
            cumulative_filled: self.cumulative_filled(),
            average_fill_price: self.average_fill_price(),
            is_quote: self.is_quote,
            submitted_at: self.submitted_at,
        }
    }
}

/// Observer-facing copy of an order's state.
///
/// Snapshots taken outside the owning book's lock may be stale; the
/// quantity invariant `filled + remaining == quantity` always holds
/// within one snapshot taken under the lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub exchange_id: ExchangeId,
    pub session_id: String,
    pub client_order_id: String,
    pub instrument: String,
    pub side: Side,
    pub price: Price,
    pub quantity: u64,
    pub remaining: u64,
    pub filled: u64,
    pub cumulative_filled: u64,
    pub average_fill_price: FixedPrice,
    pub is_quote: bool,
    pub submitted_at: i64,
}

impl OrderSnapshot {
    pub fn is_market(&self) -> bool {
        self.price.is_market()
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn is_filled(&self) -> bool {
        self.remaining == 0 && self.filled == self.quantity
    }

    pub fn is_cancelled(&self) -> bool {
        self.remaining == 0 && self.filled != self.quantity
    }

    /// Terminal with at least one fill.
    pub fn is_partially_filled(&self) -> bool {
        self.remaining == 0 && self.filled > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(s: &str) -> FixedPrice {
        s.parse().unwrap()
    }

    fn order(side: Side, price: Price, qty: u64) -> Order {
        Order::new(
            ExchangeId::new(1),
            "s1",
            "c1",
            "ACME",
            side,
            price,
            qty,
            false,
            1_700_000_000_000_000_000,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_new_order_is_active() {
        let o = order(Side::Buy, Price::Limit(px("1.00")), 10);
        assert!(o.is_active());
        assert!(!o.is_filled());
        assert!(!o.is_cancelled());
        assert!(!o.is_listed());
        assert_eq!(o.remaining(), 10);
        assert_eq!(o.filled(), 0);
    }

    #[test]
    fn test_fill_accounting() {
        let o = order(Side::Buy, Price::Limit(px("2.00")), 30);
        o.fill(10, px("1.00"));
        assert_eq!(o.remaining(), 20);
        assert_eq!(o.filled(), 10);
        assert_eq!(o.cumulative_filled(), 10);
        assert_eq!(o.average_fill_price(), px("1.00"));

        o.fill(20, px("2.50"));
        assert!(o.is_filled());
        assert_eq!(o.filled(), 30);
        // (10 * 1.00 + 20 * 2.50) / 30 = 2.00
        assert_eq!(o.average_fill_price(), px("2.00"));
    }

    #[test]
    fn test_invariant_filled_plus_remaining() {
        let o = order(Side::Sell, Price::Limit(px("5")), 100);
        o.fill(33, px("5"));
        assert_eq!(o.filled() + o.remaining(), o.quantity());
        o.fill(67, px("5"));
        assert_eq!(o.filled() + o.remaining(), o.quantity());
    }

    #[test]
    fn test_cancel_keeps_filled() {
        let o = order(Side::Buy, Price::Limit(px("1")), 10);
        o.fill(4, px("1"));
        o.cancel();
        assert!(o.is_cancelled());
        assert!(o.is_partially_filled());
        assert!(!o.is_filled());
        assert_eq!(o.filled(), 4);
        assert_eq!(o.remaining(), 0);
    }

    #[test]
    fn test_market_order_price() {
        let o = order(Side::Buy, Price::Market, 10);
        assert!(o.is_market());
        assert_eq!(o.price(), Price::Market);
    }

    #[test]
    fn test_relist_keeps_cumulative_stats() {
        let o = order(Side::Sell, Price::Limit(px("1.10")), 10);
        o.fill(10, px("1.10"));
        assert!(o.is_filled());

        o.relist_as(px("1.20"), 25);
        assert_eq!(o.price(), Price::Limit(px("1.20")));
        assert_eq!(o.quantity(), 25);
        assert_eq!(o.remaining(), 25);
        assert_eq!(o.filled(), 0);
        assert_eq!(o.cumulative_filled(), 10);
        assert_eq!(o.average_fill_price(), px("1.10"));
    }

    #[test]
    fn test_slot_handle() {
        let o = order(Side::Buy, Price::Limit(px("1")), 10);
        assert_eq!(o.list_slot(), None);
        o.attach(3);
        assert!(o.is_listed());
        assert_eq!(o.list_slot(), Some(3));
        o.detach();
        assert!(!o.is_listed());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let o = order(Side::Buy, Price::Limit(px("1.25")), 10);
        o.fill(3, px("1.25"));
        let snap = o.snapshot();
        assert_eq!(snap.remaining, 7);
        assert_eq!(snap.filled + snap.remaining, snap.quantity);
        assert!(snap.is_active());

        let json = serde_json::to_string(&snap).unwrap();
        let back: OrderSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
