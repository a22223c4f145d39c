//! Error types for the mabalgs library.

use thiserror::Error;

/// Result type alias for bandit operations.
pub type Result<T> = std::result::Result<T, BanditError>;

/// Errors that can occur during bandit operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BanditError {
    /// A selector, allocator, schedule or simulation was built with unusable parameters.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Feedback referenced an arm outside `[0, n_arms)` or outside the selected list.
    #[error("invalid arm index: {message}")]
    InvalidArmIndex { message: String },

    /// A schedule row disagrees with the arm layout fixed by round 0.
    #[error("invalid schedule index: {message}")]
    InvalidScheduleIndex { message: String },

    /// An algorithm name that does not map to any known policy.
    #[error("unknown algorithm: {name}")]
    UnknownAlgorithm { name: String },

    /// The run was cancelled through its abort handle.
    #[error("simulation aborted")]
    Aborted,
}

impl BanditError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        BanditError::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub(crate) fn arm_out_of_range(arm: usize, n_arms: usize) -> Self {
        BanditError::InvalidArmIndex {
            message: format!("arm {arm} is outside [0, {n_arms})"),
        }
    }
}
