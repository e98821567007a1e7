//! Error types for media providers.

use thiserror::Error;

/// Why a provider produced no snapshot. These never escape the arbiter;
/// they exist for logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider did not answer within its timeout.
    #[error("provider '{provider}' timed out")]
    Timeout { provider: String },

    /// Source unavailable, permission denied, or unparsable output.
    #[error("provider '{provider}' failed: {reason}")]
    Failure { provider: String, reason: String },
}
