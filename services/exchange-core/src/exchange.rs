//! Exchange façade
//!
//! Admits order intents from sessions, mints exchange ids, resolves
//! the instrument's book through the lock-free directory, records
//! every order in the cross-instrument order directory and runs the
//! book operation under the book's lock. Fully re-entrant across
//! instruments; operations on one instrument linearize at the point
//! the book lock is acquired.

use crate::book::OrderBook;
use crate::directory::{BookDirectory, OrderDirectory};
use crate::listener::{ExchangeListener, NoopListener};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use types::book::BookSnapshot;
use types::errors::{CancelRejection, Rejection};
use types::ids::ExchangeId;
use types::order::{Order, OrderSnapshot, Side};
use types::price::{FixedPrice, Price};

/// Wall-clock time as unix nanoseconds.
fn unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or(0)
}

/// Execution-id source shared by every book.
///
/// Ids are wall-clock nanoseconds monotonized with `fetch_max`, so
/// they never decrease; ties are permitted across instruments.
#[derive(Debug, Default)]
pub struct ExecIds {
    last: AtomicI64,
}

impl ExecIds {
    pub fn next(&self) -> i64 {
        let now = unix_nanos();
        let last = self.last.fetch_max(now, Ordering::AcqRel);
        last.max(now)
    }
}

/// The venue: multi-instrument, multi-session order entry.
///
/// All methods take `&self` and may be called from any number of
/// threads. The registered listener receives callbacks synchronously
/// under the relevant book's lock and must not re-enter the exchange
/// for the same instrument on the same thread.
pub struct Exchange {
    books: BookDirectory,
    orders: OrderDirectory,
    next_id: AtomicI64,
    exec_ids: Arc<ExecIds>,
    listener: Arc<dyn ExchangeListener>,
}

impl Exchange {
    /// An exchange that discards all events.
    pub fn new() -> Self {
        Self::with_listener(Arc::new(NoopListener))
    }

    /// An exchange publishing every order-state change and trade to
    /// `listener`.
    pub fn with_listener(listener: Arc<dyn ExchangeListener>) -> Self {
        Self {
            books: BookDirectory::new(),
            orders: OrderDirectory::new(),
            next_id: AtomicI64::new(1),
            exec_ids: Arc::new(ExecIds::default()),
            listener,
        }
    }

    fn mint_id(&self) -> ExchangeId {
        ExchangeId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn book_for(&self, instrument: &str) -> Result<Arc<OrderBook>, Rejection> {
        self.books.get_or_create(instrument, || {
            Arc::new(OrderBook::new(
                instrument,
                self.listener.clone(),
                self.exec_ids.clone(),
            ))
        })
    }

    /// Submit a limit buy.
    pub fn buy(
        &self,
        session_id: &str,
        instrument: &str,
        price: FixedPrice,
        quantity: u64,
        client_order_id: &str,
    ) -> Result<ExchangeId, Rejection> {
        self.insert_order(
            session_id,
            instrument,
            Price::Limit(price),
            quantity,
            Side::Buy,
            client_order_id,
        )
    }

    /// Submit a limit sell.
    pub fn sell(
        &self,
        session_id: &str,
        instrument: &str,
        price: FixedPrice,
        quantity: u64,
        client_order_id: &str,
    ) -> Result<ExchangeId, Rejection> {
        self.insert_order(
            session_id,
            instrument,
            Price::Limit(price),
            quantity,
            Side::Sell,
            client_order_id,
        )
    }

    /// Submit a market buy. Any quantity not filled by the end of
    /// the matching loop is cancelled: market orders never rest.
    pub fn market_buy(
        &self,
        session_id: &str,
        instrument: &str,
        quantity: u64,
        client_order_id: &str,
    ) -> Result<ExchangeId, Rejection> {
        self.insert_order(
            session_id,
            instrument,
            Price::Market,
            quantity,
            Side::Buy,
            client_order_id,
        )
    }

    /// Submit a market sell. See [`market_buy`](Exchange::market_buy).
    pub fn market_sell(
        &self,
        session_id: &str,
        instrument: &str,
        quantity: u64,
        client_order_id: &str,
    ) -> Result<ExchangeId, Rejection> {
        self.insert_order(
            session_id,
            instrument,
            Price::Market,
            quantity,
            Side::Sell,
            client_order_id,
        )
    }

    fn insert_order(
        &self,
        session_id: &str,
        instrument: &str,
        price: Price,
        quantity: u64,
        side: Side,
        client_order_id: &str,
    ) -> Result<ExchangeId, Rejection> {
        if quantity == 0 {
            return Err(Rejection::InvalidQuantity(quantity));
        }
        let book = self.book_for(instrument)?;
        let mut guard = book.lock();
        let exchange_id = self.mint_id();
        let order = Arc::new(Order::new(
            exchange_id,
            session_id,
            client_order_id,
            book.instrument(),
            side,
            price,
            quantity,
            false,
            unix_nanos(),
        ));
        self.orders.insert(order.clone());
        debug!(
            exchange_id = exchange_id.raw(),
            session_id,
            instrument,
            %price,
            quantity,
            ?side,
            "order admitted"
        );
        guard.insert_order(order);
        Ok(exchange_id)
    }

    /// Replace the two-sided quote keyed by (session, quote id).
    ///
    /// A side with nonzero quantity is re-priced and re-queued,
    /// losing time priority; a side quoted at zero is detached
    /// without a cancel event and revived by a later quote. Quote
    /// orders keep their exchange ids across replacements.
    #[allow(clippy::too_many_arguments)]
    pub fn quote(
        &self,
        session_id: &str,
        instrument: &str,
        bid_price: FixedPrice,
        bid_quantity: u64,
        ask_price: FixedPrice,
        ask_quantity: u64,
        quote_id: &str,
    ) -> Result<(), Rejection> {
        let book = self.book_for(instrument)?;
        let mut guard = book.lock();
        guard.quote(
            session_id,
            quote_id,
            bid_price,
            bid_quantity,
            ask_price,
            ask_quantity,
            |side, price, quantity| {
                let order = Arc::new(Order::new(
                    self.mint_id(),
                    session_id,
                    quote_id,
                    instrument,
                    side,
                    Price::Limit(price),
                    quantity,
                    true,
                    unix_nanos(),
                ));
                self.orders.insert(order.clone());
                order
            },
        );
        Ok(())
    }

    /// Cancel an order on behalf of the session that submitted it.
    pub fn cancel(
        &self,
        exchange_id: ExchangeId,
        session_id: &str,
    ) -> Result<(), CancelRejection> {
        let order = self
            .orders
            .get(exchange_id)
            .ok_or(CancelRejection::UnknownOrder(exchange_id))?;
        if order.session_id() != session_id {
            return Err(CancelRejection::SessionMismatch(exchange_id));
        }
        let book = self
            .books
            .get(order.instrument())
            .ok_or(CancelRejection::UnknownOrder(exchange_id))?;
        let outcome = book.lock().cancel_order(&order);
        debug!(
            exchange_id = exchange_id.raw(),
            session_id,
            ok = outcome.is_ok(),
            "cancel"
        );
        outcome
    }

    /// Read one order's state under its book's lock.
    pub fn order(&self, exchange_id: ExchangeId) -> Option<OrderSnapshot> {
        let order = self.orders.get(exchange_id)?;
        let book = self.books.get(order.instrument())?;
        let guard = book.lock();
        Some(guard.order_snapshot(&order))
    }

    /// Aggregated book snapshot for an instrument, or `None` if no
    /// order was ever admitted for it.
    pub fn book(&self, instrument: &str) -> Option<BookSnapshot> {
        self.books.get(instrument).map(|book| book.lock().snapshot())
    }

    /// Every instrument with a book.
    pub fn instruments(&self) -> Vec<String> {
        self.books.instruments()
    }

    /// Every order ever admitted, unordered. Taken without book
    /// locks: counters of in-flight orders may be stale.
    pub fn all_orders(&self) -> Vec<OrderSnapshot> {
        self.orders
            .all()
            .iter()
            .map(|order| order.snapshot())
            .collect()
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
