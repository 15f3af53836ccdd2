/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Why a single inbound event did not make it across.
///
/// None of these are fatal: the engine logs them and moves on to the next
/// event.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The binding document could not be written.
    #[error("binding persistence failed: {0}")]
    ConfigIo(#[source] chatbridge_config::Error),

    /// The outbound platform rejected the message.
    #[error("outbound send failed: {0}")]
    TransportSend(#[source] chatbridge_channels::Error),

    /// Channel metadata was needed for scoping but could not be fetched.
    #[error("metadata lookup failed: {0}")]
    MetadataLookup(#[source] chatbridge_channels::Error),

    /// Relay attempted before both sides were bound.
    #[error("binding is not fully established")]
    BindingNotReady,

    /// A destination bind command came from a chat whose id is not an integer.
    #[error("chat id {id:?} is not a valid destination id")]
    InvalidChatId { id: String },
}
