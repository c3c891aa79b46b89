//! Exchange-assigned identifier types
//!
//! Exchange ids are minted from an atomic counter and are globally
//! unique and monotonically increasing for the process lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier an order receives on admission.
///
/// Assigned by the exchange, never reused. The value doubles as the
/// order-directory bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(i64);

impl ExchangeId {
    /// Wrap a raw id value.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
