//! In-memory session state for the running client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owned by a [`crate::manager::SessionContext`] and mutated only by the
//! session manager. Not persisted: a fresh process starts empty and is
//! rebuilt from the token store on the first guarded navigation.

use crate::token::Claims;

/// Current credential and the identity fields derived from it.
///
/// `authenticated` is `true` only when a credential was present and
/// unexpired at the last check. `username` and `role` come from that same
/// decoded credential and are cleared together with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    token: Option<String>,
    username: Option<String>,
    role: Option<String>,
    authenticated: bool,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the raw credential for outgoing requests.
    ///
    /// Does not touch the identity fields; use [`SessionState::establish`]
    /// once the credential has been decoded and checked.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Adopt a decoded, unexpired credential as the current session.
    pub fn establish(&mut self, token: impl Into<String>, claims: &Claims) {
        self.set_token(token);
        self.username = Some(claims.subject.clone());
        self.role.clone_from(&claims.role);
        self.authenticated = true;
    }

    /// Reset every field to the unauthenticated shape.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// `Authorization` header value for the current credential.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token.as_deref().map(|t| format!("Bearer {t}"))
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
