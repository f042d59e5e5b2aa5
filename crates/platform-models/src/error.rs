//! Error types for the `platform-models` crate.

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A local tenant identifier was not a decimal millisecond timestamp.
    #[error("invalid local tenant id \"{value}\": {reason}")]
    InvalidLocalTenantId {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },
}
