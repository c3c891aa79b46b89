//! Instrument → book directory
//!
//! Fixed-capacity open-addressed table with linear probing. Slots
//! are `OnceLock`s: installation is a one-shot compare-and-set, so
//! get-or-create needs no lock and an installed book never moves or
//! frees for the process lifetime. When the probe wraps all the way
//! around, the venue is out of book slots and admission fails.

use crate::book::OrderBook;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use tracing::warn;
use types::errors::Rejection;

/// Maximum number of distinct instruments. Power of two.
pub const MAX_INSTRUMENTS: usize = 1024;

/// Lock-free map of instrument → [`OrderBook`].
pub struct BookDirectory {
    slots: Box<[OnceLock<Arc<OrderBook>>]>,
}

impl BookDirectory {
    pub fn new() -> Self {
        Self {
            slots: (0..MAX_INSTRUMENTS).map(|_| OnceLock::new()).collect(),
        }
    }

    fn start_slot(instrument: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        instrument.hash(&mut hasher);
        hasher.finish() as usize & (MAX_INSTRUMENTS - 1)
    }

    /// Return the instrument's book, installing a freshly built one
    /// if none exists yet. `make` is invoked at most once; when an
    /// install race is lost to another thread creating the same
    /// instrument, that thread's book wins.
    pub fn get_or_create(
        &self,
        instrument: &str,
        make: impl Fn() -> Arc<OrderBook>,
    ) -> Result<Arc<OrderBook>, Rejection> {
        let start = Self::start_slot(instrument);
        let mut index = start;
        let mut pending: Option<Arc<OrderBook>> = None;
        loop {
            match self.slots[index].get() {
                Some(book) if book.instrument() == instrument => return Ok(book.clone()),
                Some(_) => {
                    index = (index + 1) & (MAX_INSTRUMENTS - 1);
                    if index == start {
                        warn!(instrument, capacity = MAX_INSTRUMENTS, "book directory full");
                        return Err(Rejection::DirectoryFull);
                    }
                }
                None => {
                    let book = match pending.take() {
                        Some(book) => book,
                        None => make(),
                    };
                    if self.slots[index].set(book.clone()).is_ok() {
                        return Ok(book);
                    }
                    // lost the install race; re-inspect the same slot
                    pending = Some(book);
                }
            }
        }
    }

    /// Look up without creating.
    pub fn get(&self, instrument: &str) -> Option<Arc<OrderBook>> {
        let start = Self::start_slot(instrument);
        let mut index = start;
        loop {
            match self.slots[index].get() {
                Some(book) if book.instrument() == instrument => return Some(book.clone()),
                Some(_) => {
                    index = (index + 1) & (MAX_INSTRUMENTS - 1);
                    if index == start {
                        return None;
                    }
                }
                // installs fill the probe path contiguously, so an
                // empty slot ends the search
                None => return None,
            }
        }
    }

    /// Enumerate the installed instruments, in slot order.
    pub fn instruments(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(|slot| slot.get())
            .map(|book| book.instrument().to_string())
            .collect()
    }
}

impl Default for BookDirectory {
    fn default() -> Self {
        Self::new()
    }
}
