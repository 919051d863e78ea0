use cabana_core::StoreError;

/// Error taxonomy of the booking engine. Every core operation fails with one
/// of these; the form controller and the HTTP layer are the only places that
/// translate them into user-facing responses.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Malformed request shape. Recovered locally, never reaches storage.
    #[error("{0}")]
    Validation(String),

    /// Availability was lost between quote and creation, or the cabin cannot
    /// take bookings right now.
    #[error("{0}")]
    Conflict(String),

    /// Illegal lifecycle transition. Defensive; logged and shown generically.
    #[error("invalid reservation state: {0}")]
    InvalidState(String),

    /// The payment processor could not create a checkout session. Retryable.
    #[error("payment session could not be created: {0}")]
    PaymentInit(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Storage or transport failure. Callers fail closed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
