//! Multi-threaded submission storm
//!
//! Seeded random order flow across several instruments from parallel
//! sessions, then a full consistency audit: per-order conservation,
//! trade-quantity attribution, directory stability and uncrossed
//! books.

use exchange_core::{Exchange, ExchangeListener};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use types::ids::ExchangeId;
use types::price::{FixedPrice, SCALE};
use types::trade::TradeSnapshot;

const INSTRUMENTS: [&str; 4] = ["AAA", "BBB", "CCC", "DDD"];
const THREADS: i64 = 8;
const OPS_PER_THREAD: usize = 200;

#[derive(Default)]
struct TradeTape {
    trades: Mutex<Vec<TradeSnapshot>>,
}

impl ExchangeListener for TradeTape {
    fn on_trade(&self, trade: &TradeSnapshot) {
        self.trades.lock().unwrap().push(*trade);
    }
}

/// Price on a small grid around 1.00 so orders actually cross.
fn grid_price(rng: &mut ChaCha8Rng) -> FixedPrice {
    let cents = rng.gen_range(90..=110);
    FixedPrice::from_raw(cents * SCALE / 100)
}

#[test]
fn storm_preserves_invariants() {
    let tape = Arc::new(TradeTape::default());
    let exchange = Arc::new(Exchange::with_listener(tape.clone()));

    let mut handles = Vec::new();
    for thread_id in 0..THREADS {
        let exchange = exchange.clone();
        handles.push(std::thread::spawn(move || {
            let mut rng = ChaCha8Rng::seed_from_u64(thread_id as u64);
            let session = format!("session-{thread_id}");
            let mut submitted: Vec<ExchangeId> = Vec::new();

            for _ in 0..OPS_PER_THREAD {
                let instrument = INSTRUMENTS[rng.gen_range(0..INSTRUMENTS.len())];
                let quantity = rng.gen_range(1..=50);
                match rng.gen_range(0..10) {
                    0 => {
                        let id = exchange
                            .market_buy(&session, instrument, quantity, "")
                            .unwrap();
                        submitted.push(id);
                    }
                    1 => {
                        let id = exchange
                            .market_sell(&session, instrument, quantity, "")
                            .unwrap();
                        submitted.push(id);
                    }
                    2 if !submitted.is_empty() => {
                        let victim = submitted[rng.gen_range(0..submitted.len())];
                        // may legitimately be terminal already
                        let _ = exchange.cancel(victim, &session);
                    }
                    n => {
                        let price = grid_price(&mut rng);
                        let id = if n % 2 == 0 {
                            exchange.buy(&session, instrument, price, quantity, "").unwrap()
                        } else {
                            exchange.sell(&session, instrument, price, quantity, "").unwrap()
                        };
                        submitted.push(id);
                    }
                }
            }
            submitted
        }));
    }

    let mut submitted: Vec<ExchangeId> = Vec::new();
    for handle in handles {
        submitted.extend(handle.join().unwrap());
    }

    // every admitted order is retained and internally consistent:
    // cancellation zeroes `remaining` and keeps `filled`, everything
    // else conserves quantity
    for &id in &submitted {
        let snap = exchange.order(id).expect("order lost from directory");
        assert_eq!(snap.exchange_id, id);
        assert!(snap.filled <= snap.quantity);
        if snap.is_cancelled() {
            assert_eq!(snap.remaining, 0, "cancelled order {id} still has remaining");
        } else {
            assert_eq!(
                snap.filled + snap.remaining,
                snap.quantity,
                "conservation violated for order {id}"
            );
        }
    }
    assert_eq!(exchange.all_orders().len(), submitted.len());

    // traded quantity per order equals its filled counter
    let mut traded: HashMap<ExchangeId, u64> = HashMap::new();
    for trade in tape.trades.lock().unwrap().iter() {
        *traded.entry(trade.aggressor_id).or_default() += trade.quantity;
        *traded.entry(trade.passive_id).or_default() += trade.quantity;
    }
    for &id in &submitted {
        let snap = exchange.order(id).unwrap();
        assert_eq!(
            traded.get(&id).copied().unwrap_or(0),
            snap.filled,
            "trade attribution mismatch for order {id}"
        );
    }

    // no book is left crossed, and market orders never rest
    let mut names = exchange.instruments();
    names.sort();
    assert_eq!(names, INSTRUMENTS);
    for instrument in INSTRUMENTS {
        let book = exchange.book(instrument).unwrap();
        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            assert!(bid.price < ask.price, "{instrument} crossed:\n{book}");
        }
        let resting: u64 = book.bids.iter().chain(book.asks.iter()).map(|l| l.quantity).sum();
        let listed = book.bid_order_ids.len() + book.ask_order_ids.len();
        assert!(resting > 0 || listed == 0);
    }

    // identity is stable across observations
    for &id in submitted.iter().take(20) {
        assert_eq!(exchange.order(id), exchange.order(id));
    }
}
