//! Wire shapes for the auth endpoints the session core calls.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const LOGIN_PATH: &str = "/api/login";
pub const REGISTER_PATH: &str = "/api/register";
pub const UPDATE_PASSWORD_PATH: &str = "/api/update-password";
pub const REFRESH_TOKEN_PATH: &str = "/api/refresh-token";

/// Failure message the login endpoint uses to demand a password change.
pub const PASSWORD_RESET_MESSAGE: &str = "require password reset";

/// Username/password pair for login and registration.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/update-password`.
#[derive(Clone, Serialize)]
pub struct PasswordUpdate {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
    pub verify_password: String,
}

impl fmt::Debug for PasswordUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordUpdate")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Success body of login and token refresh: `{code, token, expire}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default)]
    pub expire: Option<String>,
    #[serde(default)]
    pub code: Option<u16>,
}

/// Success body of registration and password update: `{user, message}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
