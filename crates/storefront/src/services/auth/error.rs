//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during (simulated) sign-in.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] kiosk_core::EmailError),

    /// Password shorter than the minimum.
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    /// Registration without a display name.
    #[error("name is required")]
    MissingName,

    /// Another sign-in attempt is still running.
    #[error("a sign-in attempt is already in progress")]
    AttemptInProgress,

    /// Completion without a matching start.
    #[error("no sign-in attempt in progress")]
    NoAttempt,
}
