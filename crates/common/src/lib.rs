//! Shared error helpers used across the chatbridge crates.

pub mod error;

pub use error::FromMessage;
