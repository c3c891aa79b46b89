//! Concurrent directories
//!
//! Lock-free instrument → book and exchange-id → order lookup,
//! shared by every submitting thread.

pub mod books;
pub mod orders;

pub use books::BookDirectory;
pub use orders::OrderDirectory;
