//! Bidirectional relay between a bound source channel and destination chat.
//!
//! One [`RelayEngine`] runs per direction. Both share the [`BindingStore`]
//! (who is bound to whom) and the [`Correlations`] (which relayed message
//! corresponds to which original), so replies on either side thread against
//! the right message.
//!
//! [`BindingStore`]: chatbridge_config::BindingStore

pub mod bridge;
pub mod command;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod format;
pub mod names;
pub mod side;

pub use {
    bridge::{Bridge, Endpoint},
    correlation::{CorrelationTable, Correlations, SourceKey},
    engine::{Disposition, RelayEngine, RelayOptions},
    error::{RelayError, Result},
    side::Side,
};
