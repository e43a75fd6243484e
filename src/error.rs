//! Error taxonomy shared by session operations.
//!
//! DESIGN
//! ======
//! Each leaf module owns its error enum (`NetworkError`, `MalformedTokenError`,
//! `StoreError`, `ConfigError`). [`AuthError`] is what manager operations
//! return to the caller. Every variant carries a grepable code so hosts can
//! branch on it without matching on display strings.

use crate::net::NetworkError;
use crate::store::StoreError;
use crate::token::MalformedTokenError;

/// Grepable error code plus an advisory retry hint.
///
/// The session core itself never retries; hosts may use `retryable` to decide
/// whether to offer the user a "try again" affordance.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Failure of a session operation, delivered once to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HTTP collaborator rejected the request.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The backend issued a credential the client cannot decode.
    #[error(transparent)]
    MalformedToken(#[from] MalformedTokenError),

    /// The backend issued a credential that is already past its expiry.
    #[error("issued token is already expired")]
    ExpiredToken,

    /// The durable token slot could not be written or removed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation needs a session but none is established.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(e) => e.error_code(),
            Self::MalformedToken(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::ExpiredToken => "E_TOKEN_EXPIRED",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.retryable(),
            Self::Store(e) => e.retryable(),
            Self::MalformedToken(_) | Self::ExpiredToken | Self::NotAuthenticated => false,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
