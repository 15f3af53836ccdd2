use std::error::Error as StdError;

use chatbridge_common::FromMessage;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors shared by every platform adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },

    /// Operation is currently unavailable (not configured/started).
    #[error("channel operation unavailable: {message}")]
    Unavailable { message: String },

    /// An outbound message could not be delivered.
    #[error("send to {target} failed: {source}")]
    Send {
        target: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Channel metadata could not be fetched.
    #[error("metadata lookup for {channel_id} failed: {source}")]
    Lookup {
        channel_id: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Wrapped source error from an external dependency.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn send(target: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Send {
            target: target.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn lookup(
        channel_id: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Lookup {
            channel_id: channel_id.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

chatbridge_common::impl_context!();
