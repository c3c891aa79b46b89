//! Rejection taxonomy
//!
//! Every admission, lookup and mutation returns an outcome; nothing
//! crosses the API boundary as a panic except unrecoverable internal
//! invariant violations. Rejected operations leave the book exactly
//! as it was.

use crate::ids::ExchangeId;
use thiserror::Error;

/// Price text that could not be parsed into the fixed-point
/// representation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("empty price")]
    Empty,

    #[error("invalid character in price: {0:?}")]
    InvalidDigit(char),

    #[error("too many fractional digits (max {max}, got {got})")]
    TooManyFractionalDigits { max: u32, got: usize },

    #[error("price overflows the fixed-point range")]
    Overflow,
}

/// Why an order intent was not admitted.
///
/// Malformed price text never reaches admission: prices enter the
/// API already parsed, so a bad price surfaces as a
/// [`PriceParseError`] at the `FixedPrice::from_str` boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The instrument directory is at capacity; no further books can
    /// be created for the process lifetime.
    #[error("instrument directory is full")]
    DirectoryFull,

    #[error("invalid quantity: {0}")]
    InvalidQuantity(u64),
}

/// Why a cancel request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CancelRejection {
    #[error("unknown order: {0}")]
    UnknownOrder(ExchangeId),

    #[error("order {0} belongs to another session")]
    SessionMismatch(ExchangeId),

    /// The order is already terminal (filled or cancelled) or is not
    /// currently resting on a ladder.
    #[error("order {0} is not cancelable")]
    NotCancelable(ExchangeId),
}
