//! Simulated user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kiosk_core::Email;

/// The signed-in shopper.
///
/// Produced by the simulated sign-in; nothing about it has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Millisecond timestamp of the sign-in, as a string.
    pub id: String,
    pub email: Email,
    /// Display name.
    pub name: String,
    pub created_at: DateTime<Utc>,
}
