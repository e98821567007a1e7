//! Error types for activation.

use thiserror::Error;

/// Conditions that suspend activation evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// No display is available to host the activation zone. Not fatal:
    /// evaluation resumes once a display appears.
    #[error("no target display available for the activation zone")]
    NoTargetDisplay,
}
