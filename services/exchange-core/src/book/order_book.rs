//! Per-instrument order book
//!
//! Two price ladders, the matching loop, the quote-pair registry and
//! the listener fan-out, all guarded by one lock. Every operation —
//! insert, cancel, quote, snapshot — runs start-to-finish under the
//! lock, so operations on one instrument are linearizable and
//! listener callbacks for one operation never interleave with
//! another operation on the same book.

use crate::book::crossing;
use crate::book::ladder::PriceLadder;
use crate::exchange::ExecIds;
use crate::listener::ExchangeListener;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;
use types::book::{BookLevel, BookSnapshot};
use types::errors::CancelRejection;
use types::ids::ExchangeId;
use types::order::{Order, OrderSnapshot, Side};
use types::price::{FixedPrice, Price};
use types::trade::TradeSnapshot;

/// The two orders of a two-sided quote, keyed by (session, quote id).
///
/// A side is absent until the first nonzero quantity arrives for it.
/// Detached sides (quoted down to zero) keep their order alive for
/// revival by a later quote.
#[derive(Debug, Default)]
struct QuotePair {
    bid: Option<Arc<Order>>,
    ask: Option<Arc<Order>>,
}

#[derive(Debug)]
struct BookInner {
    bids: PriceLadder,
    asks: PriceLadder,
    quotes: HashMap<(String, String), QuotePair>,
}

/// One instrument's book. Shared via `Arc`; all mutation goes
/// through [`OrderBook::lock`].
pub struct OrderBook {
    instrument: String,
    listener: Arc<dyn ExchangeListener>,
    exec_ids: Arc<ExecIds>,
    inner: Mutex<BookInner>,
}

impl OrderBook {
    pub(crate) fn new(
        instrument: impl Into<String>,
        listener: Arc<dyn ExchangeListener>,
        exec_ids: Arc<ExecIds>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            listener,
            exec_ids,
            inner: Mutex::new(BookInner {
                bids: PriceLadder::new(Side::Buy),
                asks: PriceLadder::new(Side::Sell),
                quotes: HashMap::new(),
            }),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Acquire the book lock.
    pub fn lock(&self) -> BookGuard<'_> {
        BookGuard {
            book: self,
            inner: self.inner.lock(),
        }
    }
}

/// Exclusive access to one book for the duration of an operation.
pub struct BookGuard<'a> {
    book: &'a OrderBook,
    inner: MutexGuard<'a, BookInner>,
}

impl BookGuard<'_> {
    /// Admit an order to the book: queue it on its side's ladder,
    /// announce it, then run the matching loop with the order as the
    /// aggressor. Orders with nothing remaining are ignored.
    pub fn insert_order(&mut self, order: Arc<Order>) {
        if order.remaining() == 0 {
            return;
        }
        match order.side() {
            Side::Buy => self.inner.bids.insert(order.clone()),
            Side::Sell => self.inner.asks.insert(order.clone()),
        }
        self.book.listener.on_order(&order.snapshot());
        self.match_orders(order.side());
    }

    /// Cancel a resting order: zero its remaining quantity, detach
    /// it from its ladder and announce the change.
    ///
    /// Orders that are already terminal, or active but not currently
    /// listed (an in-flight market order or a detached quote side),
    /// are not cancelable.
    pub fn cancel_order(&mut self, order: &Arc<Order>) -> Result<(), CancelRejection> {
        if order.remaining() == 0 || !order.is_listed() {
            return Err(CancelRejection::NotCancelable(order.exchange_id()));
        }
        order.cancel();
        match order.side() {
            Side::Buy => self.inner.bids.remove(order),
            Side::Sell => self.inner.asks.remove(order),
        }
        self.book.listener.on_order(&order.snapshot());
        Ok(())
    }

    /// Replace the two-sided quote identified by (session, quote id).
    ///
    /// Currently listed sides are detached without a cancel event;
    /// sides quoted with nonzero quantity are re-priced, re-queued at
    /// the back of their level and matched. Sides quoted at zero stay
    /// detached until a later quote revives them. `mint` allocates a
    /// quote-side order on its first nonzero quantity.
    #[allow(clippy::too_many_arguments)]
    pub fn quote(
        &mut self,
        session_id: &str,
        quote_id: &str,
        bid_price: FixedPrice,
        bid_quantity: u64,
        ask_price: FixedPrice,
        ask_quantity: u64,
        mut mint: impl FnMut(Side, FixedPrice, u64) -> Arc<Order>,
    ) {
        let (bid, ask) = {
            let pair = self
                .inner
                .quotes
                .entry((session_id.to_string(), quote_id.to_string()))
                .or_default();
            if bid_quantity > 0 && pair.bid.is_none() {
                pair.bid = Some(mint(Side::Buy, bid_price, bid_quantity));
            }
            if ask_quantity > 0 && pair.ask.is_none() {
                pair.ask = Some(mint(Side::Sell, ask_price, ask_quantity));
            }
            (pair.bid.clone(), pair.ask.clone())
        };

        if let Some(bid) = &bid {
            if bid.is_listed() {
                self.inner.bids.remove(bid);
            }
        }
        if let Some(ask) = &ask {
            if ask.is_listed() {
                self.inner.asks.remove(ask);
            }
        }

        if bid_quantity > 0 {
            if let Some(bid) = bid {
                bid.relist_as(bid_price, bid_quantity);
                self.inner.bids.insert(bid.clone());
                self.book.listener.on_order(&bid.snapshot());
                self.match_orders(Side::Buy);
            }
        }
        if ask_quantity > 0 {
            if let Some(ask) = ask {
                ask.relist_as(ask_price, ask_quantity);
                self.inner.asks.insert(ask.clone());
                self.book.listener.on_order(&ask.snapshot());
                self.match_orders(Side::Sell);
            }
        }
    }

    /// Match the book fronts while they cross.
    ///
    /// The aggressor-side front is the order whose arrival triggered
    /// the loop: the book is uncrossed between operations, so only
    /// the newcomer can cross. Per trade the listener sees the
    /// passive order, then the aggressor, then the trade.
    fn match_orders(&mut self, aggressor_side: Side) {
        loop {
            let (bid, ask) = match (self.inner.bids.front(), self.inner.asks.front()) {
                (Some(bid), Some(ask)) => (bid, ask),
                _ => break,
            };
            if !crossing::crosses(bid.price(), ask.price()) {
                break;
            }

            let quantity = bid.remaining().min(ask.remaining());
            let price = crossing::execution_price(aggressor_side, bid.price(), ask.price());
            bid.fill(quantity, price);
            ask.fill(quantity, price);

            let (aggressor, passive) = match aggressor_side {
                Side::Buy => (&bid, &ask),
                Side::Sell => (&ask, &bid),
            };
            let trade = TradeSnapshot {
                price,
                quantity,
                aggressor_id: aggressor.exchange_id(),
                passive_id: passive.exchange_id(),
                exec_id: self.book.exec_ids.next(),
            };
            trace!(
                instrument = %self.book.instrument,
                price = %trade.price,
                quantity = trade.quantity,
                aggressor = trade.aggressor_id.raw(),
                passive = trade.passive_id.raw(),
                "trade"
            );

            if bid.remaining() == 0 {
                self.inner.bids.remove(&bid);
            }
            if ask.remaining() == 0 {
                self.inner.asks.remove(&ask);
            }

            let listener = &self.book.listener;
            listener.on_order(&passive.snapshot());
            listener.on_order(&aggressor.snapshot());
            listener.on_trade(&trade);
        }

        // a market order never rests: cancel any unfilled remainder
        let ladder = match aggressor_side {
            Side::Buy => &mut self.inner.bids,
            Side::Sell => &mut self.inner.asks,
        };
        if let Some(front) = ladder.front() {
            if front.is_market() && front.remaining() > 0 {
                front.cancel();
                ladder.remove(&front);
                self.book.listener.on_order(&front.snapshot());
            }
        }
    }

    /// Point-in-time aggregation of the book, best-to-worst, FIFO
    /// within a level.
    pub fn snapshot(&self) -> BookSnapshot {
        let mut snapshot = BookSnapshot::default();
        Self::snap_side(
            &self.inner.bids,
            &mut snapshot.bids,
            &mut snapshot.bid_order_ids,
        );
        Self::snap_side(
            &self.inner.asks,
            &mut snapshot.asks,
            &mut snapshot.ask_order_ids,
        );
        snapshot
    }

    fn snap_side(
        ladder: &PriceLadder,
        levels: &mut Vec<BookLevel>,
        order_ids: &mut Vec<ExchangeId>,
    ) {
        for level in ladder.levels() {
            let price = match level.price() {
                Price::Limit(price) => price,
                Price::Market => continue,
            };
            let mut quantity = 0u64;
            for order in level.iter() {
                quantity += order.remaining();
                order_ids.push(order.exchange_id());
            }
            levels.push(BookLevel { price, quantity });
        }
    }

    /// Read an order's state while holding the book lock.
    pub fn order_snapshot(&self, order: &Order) -> OrderSnapshot {
        order.snapshot()
    }

    #[cfg(test)]
    fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.inner.bids.len(),
            Side::Sell => self.inner.asks.len(),
        }
    }
}
