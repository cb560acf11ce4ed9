use thiserror::Error;

/// Result type for registry and operator calls.
pub type TplotResult<T> = Result<T, TplotError>;

/// Error kinds surfaced by the data core.
///
/// Every failure here is a programmer or data error; nothing is transient,
/// so callers are expected to fail fast rather than retry.
#[derive(Error, Debug)]
pub enum TplotError {
    /// An operation referenced a variable name absent from the store.
    #[error("no tplot variable named '{0}'")]
    NotFound(String),

    /// A time units/reference string could not be parsed.
    #[error("malformed time specification: {0}")]
    MalformedTimeSpec(String),

    /// An operator needed more samples than the variable holds.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Time length and value dimensions disagree on write.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
