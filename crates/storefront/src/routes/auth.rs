//! Authentication route handlers (simulated sign-in).
//!
//! The configured delay stands in for an identity provider round trip. The
//! auth lock is released while waiting.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::services::{AuthError, AuthState};
use crate::state::AppState;

/// Login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Current sign-in state.
pub async fn me(State(state): State<AppState>) -> Json<AuthState> {
    Json(state.auth().state())
}

/// Sign in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthState>> {
    let attempt = PendingAttempt::begin(&state)?;
    simulate_latency(&state).await;

    let result = state
        .auth()
        .complete_login(&request.email, &request.password);
    attempt.settled();
    finish(&state, result)
}

/// Register with name, email, and password.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthState>> {
    let attempt = PendingAttempt::begin(&state)?;
    simulate_latency(&state).await;

    let result = state
        .auth()
        .complete_register(&request.name, &request.email, &request.password);
    attempt.settled();
    finish(&state, result)
}

/// Sign out.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Json<AuthState> {
    let mut auth = state.auth();
    auth.logout();
    clear_sentry_user();
    tracing::info!("Shopper signed out");
    Json(auth.state())
}

/// Cancels the attempt if the request is dropped mid-wait.
struct PendingAttempt<'a> {
    state: &'a AppState,
    settled: bool,
}

impl<'a> PendingAttempt<'a> {
    fn begin(state: &'a AppState) -> std::result::Result<Self, AuthError> {
        state.auth().begin_attempt()?;
        Ok(Self {
            state,
            settled: false,
        })
    }

    fn settled(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.auth().cancel_attempt();
        }
    }
}

async fn simulate_latency(state: &AppState) {
    let delay = state.config().simulation.auth_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn finish(
    state: &AppState,
    result: std::result::Result<crate::models::AuthUser, AuthError>,
) -> Result<Json<AuthState>> {
    match result {
        Ok(user) => {
            set_sentry_user(&user.id, Some(user.email.as_str()));
            Ok(Json(state.auth().state()))
        }
        Err(e) => {
            clear_sentry_user();
            Err(e.into())
        }
    }
}
