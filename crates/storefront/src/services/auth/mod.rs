//! Authentication service (simulated).
//!
//! There is no identity provider behind this: any well-formed email with a
//! long-enough password is accepted and a user record is synthesized. Callers
//! drive the attempt in two steps so the simulated latency can be awaited
//! without holding the service lock:
//!
//! ```rust,ignore
//! state.auth().begin_attempt()?;
//! tokio::time::sleep(delay).await;
//! let user = state.auth().complete_login(&email, &password)?;
//! ```

mod error;

pub use error::AuthError;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use kiosk_core::Email;

use crate::models::AuthUser;
use crate::storage::{self, KeyValueStore, keys};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Where the shopper is in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Snapshot of the auth state for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
}

/// Holds the signed-in user, if any.
pub struct AuthService {
    user: Option<AuthUser>,
    authenticating: bool,
    store: Arc<dyn KeyValueStore>,
}

impl AuthService {
    /// Restore the persisted user. A malformed record is discarded.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let user: Option<AuthUser> = storage::load_json(store.as_ref(), keys::USER);
        if let Some(user) = &user {
            tracing::debug!(user_id = %user.id, "Restored signed-in user");
        }

        Self {
            user,
            authenticating: false,
            store,
        }
    }

    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        if self.authenticating {
            AuthStatus::Authenticating
        } else if self.user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }

    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        AuthState {
            status: self.status(),
            user: self.user.clone(),
            is_authenticated: self.user.is_some() && !self.authenticating,
        }
    }

    /// Enter `Authenticating`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AttemptInProgress` if an attempt is already running.
    pub fn begin_attempt(&mut self) -> Result<(), AuthError> {
        if self.authenticating {
            return Err(AuthError::AttemptInProgress);
        }
        self.authenticating = true;
        Ok(())
    }

    /// Finish a login attempt. The display name is the email's local part.
    ///
    /// On failure the shopper ends up signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` when the
    /// input is rejected, `AuthError::NoAttempt` without a prior
    /// [`begin_attempt`](Self::begin_attempt).
    pub fn complete_login(&mut self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.complete(|| {
            let email = Email::parse(email)?;
            validate_password(password)?;
            let name = email.local_part().to_string();
            Ok((email, name))
        })
    }

    /// Finish a registration attempt. The supplied name is used verbatim.
    ///
    /// # Errors
    ///
    /// As [`complete_login`](Self::complete_login), plus
    /// `AuthError::MissingName` for a blank name.
    pub fn complete_register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        self.complete(|| {
            if name.trim().is_empty() {
                return Err(AuthError::MissingName);
            }
            let email = Email::parse(email)?;
            validate_password(password)?;
            Ok((email, name.to_string()))
        })
    }

    /// Abandon an attempt without changing the signed-in user.
    pub const fn cancel_attempt(&mut self) {
        self.authenticating = false;
    }

    /// Sign out and forget the persisted user.
    pub fn logout(&mut self) {
        self.user = None;
        self.authenticating = false;
        storage::forget(self.store.as_ref(), keys::USER);
    }

    fn complete(
        &mut self,
        validate: impl FnOnce() -> Result<(Email, String), AuthError>,
    ) -> Result<AuthUser, AuthError> {
        if !self.authenticating {
            return Err(AuthError::NoAttempt);
        }
        self.authenticating = false;

        match validate() {
            Ok((email, name)) => {
                let now = Utc::now();
                let user = AuthUser {
                    id: now.timestamp_millis().to_string(),
                    email,
                    name,
                    created_at: now,
                };
                storage::mirror_json(self.store.as_ref(), keys::USER, &user);
                tracing::info!(user_id = %user.id, "Shopper signed in");
                self.user = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.user = None;
                storage::forget(self.store.as_ref(), keys::USER);
                tracing::debug!(error = %e, "Sign-in rejected");
                Err(e)
            }
        }
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}
