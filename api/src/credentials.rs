//! Access token sources.
//!
//! The client reads the token on every authenticated request and never keeps
//! its own copy, so a rotation between two calls is picked up by the second.

use std::sync::{PoisonError, RwLock};

use tether_types::AccessToken;

/// Process-local secret store holding the access token.
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<AccessToken>;

    /// Forget the stored token. Read-only stores ignore this.
    fn clear(&self) {}
}

/// Mutable in-memory store, written by the login flow and cleared on sign-out.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<AccessToken>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: Option<AccessToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: AccessToken) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// Fixed token, typically resolved once from config or the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore(Option<AccessToken>);

impl StaticCredentialStore {
    #[must_use]
    pub fn new(token: Option<AccessToken>) -> Self {
        Self(token)
    }
}

impl CredentialStore for StaticCredentialStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.0.clone()
    }
}
