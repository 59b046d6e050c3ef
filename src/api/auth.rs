//! Sign-in handling — token storage and auth-result dispatch.
//!
//! DESIGN
//! ======
//! The auth provider is external; it hands us an `AuthResult`. A token moves
//! the app toward a joined account through the injected `Joiner`. Anything
//! else fires the registered failure callbacks and is classified for the log.

use std::sync::{Arc, Mutex};

use crate::event_log::EventLog;
use crate::utils::CallbackList;

use super::types::AuthResult;

/// Error the provider reports when silent sign-in needs user interaction.
pub const IMMEDIATE_FAILED: &str = "immediate_failed";

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Shared OAuth access token read by the HTTP transport.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl TokenStore {
    pub fn set(&self, token: impl Into<String>) {
        *self.slot() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.token.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// =============================================================================
// SIGN-IN
// =============================================================================

/// Joins the signed-in user to the service.
#[async_trait::async_trait]
pub trait Joiner: Send + Sync {
    async fn join(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigninOutcome {
    /// Token stored and join requested.
    SignedIn,
    /// No token and no error from the provider.
    NoError,
    /// Silent sign-in failed; the user needs to click Sign In.
    ImmediateFailed,
    UnexpectedError(String),
}

pub struct SigninHandler {
    tokens: TokenStore,
    joiner: Arc<dyn Joiner>,
    failure_callbacks: CallbackList,
    log: EventLog,
}

impl SigninHandler {
    #[must_use]
    pub fn new(tokens: TokenStore, joiner: Arc<dyn Joiner>, log: EventLog) -> Self {
        Self { tokens, joiner, failure_callbacks: CallbackList::new(), log }
    }

    /// Callbacks fired whenever a sign-in attempt yields no token.
    #[must_use]
    pub fn failure_callbacks(&self) -> &CallbackList {
        &self.failure_callbacks
    }

    pub async fn handle(&self, auth: AuthResult) -> SigninOutcome {
        if let Some(token) = auth.access_token.filter(|t| !t.is_empty()) {
            self.tokens.set(token);
            self.log.info("signin succeeded; joining");
            self.joiner.join().await;
            return SigninOutcome::SignedIn;
        }

        self.failure_callbacks.fire().await;

        match auth.error.as_deref() {
            None | Some("") => {
                self.log.info("signin callback: no error and no token");
                SigninOutcome::NoError
            }
            Some(IMMEDIATE_FAILED) => {
                self.log.info("signin callback: immediate mode failed, user needs to click Sign In");
                SigninOutcome::ImmediateFailed
            }
            Some(other) => {
                self.log.error(format!("signin callback: unexpected error: {other}"));
                SigninOutcome::UnexpectedError(other.to_owned())
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
