//! Credential codec: unverified claim decoding and expiry checks.
//!
//! A credential is the compact `header.payload.signature` form the backend
//! issues on login. The client never holds the signing key, so nothing here
//! verifies the signature: decoded claims drive display and redirect UX only,
//! and the backend re-checks every privileged call.
//!
//! Claim names follow the backend's issuer: `id` carries the subject (`sub`
//! is accepted as a fallback), `role` the display role, `exp` the expiry in
//! Unix seconds and `orig_iat` the first issue time of a refreshed chain.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::ErrorCode;

const SEGMENTS: usize = 3;

const CLAIM_SUBJECT: &str = "id";
const CLAIM_SUBJECT_FALLBACK: &str = "sub";
const CLAIM_ROLE: &str = "role";
const CLAIM_EXPIRY: &str = "exp";
const CLAIM_ISSUED: &str = "orig_iat";

/// Claims of interest decoded from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identifier (the username).
    pub subject: String,
    /// Role hint. Absent when the issuer omitted it.
    pub role: Option<String>,
    /// Instant at and after which the credential is expired.
    pub expires_at: OffsetDateTime,
    /// First issue time, when present.
    pub issued_at: Option<OffsetDateTime>,
}

impl Claims {
    /// `true` iff `now >= expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// The string is not a decodable three-part credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTokenError {
    #[error("malformed token: expected 3 segments, found {0}")]
    SegmentCount(usize),

    #[error("malformed token: {segment} segment is not base64url")]
    Encoding { segment: &'static str },

    #[error("malformed token: {segment} segment is not a JSON object: {reason}")]
    Json { segment: &'static str, reason: String },

    #[error("malformed token: missing claim `{0}`")]
    MissingClaim(&'static str),

    #[error("malformed token: claim `{0}` out of range")]
    ClaimRange(&'static str),
}

impl ErrorCode for MalformedTokenError {
    fn error_code(&self) -> &'static str {
        "E_MALFORMED_TOKEN"
    }
}

/// Decode a credential's claims without verifying its signature.
///
/// # Errors
///
/// Returns [`MalformedTokenError`] if the string is not three `.`-separated
/// segments, if the header or payload is not base64url-encoded JSON, or if
/// the subject or expiry claim is missing or out of range.
pub fn decode(token: &str) -> Result<Claims, MalformedTokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != SEGMENTS {
        return Err(MalformedTokenError::SegmentCount(segments.len()));
    }

    decode_segment(segments[0], "header")?;
    let payload = decode_segment(segments[1], "payload")?;

    let subject = payload
        .get(CLAIM_SUBJECT)
        .or_else(|| payload.get(CLAIM_SUBJECT_FALLBACK))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(MalformedTokenError::MissingClaim(CLAIM_SUBJECT))?
        .to_owned();

    let role = payload
        .get(CLAIM_ROLE)
        .and_then(Value::as_str)
        .map(str::to_owned);

    let expires_at =
        numeric_date(&payload, CLAIM_EXPIRY)?.ok_or(MalformedTokenError::MissingClaim(CLAIM_EXPIRY))?;
    let issued_at = numeric_date(&payload, CLAIM_ISSUED)?;

    Ok(Claims { subject, role, expires_at, issued_at })
}

/// `true` iff the credential is expired at `now`. Malformed credentials are
/// treated as expired.
#[must_use]
pub fn is_expired(token: &str, now: OffsetDateTime) -> bool {
    decode(token).map_or(true, |claims| claims.is_expired_at(now))
}

fn decode_segment(segment: &str, name: &'static str) -> Result<Map<String, Value>, MalformedTokenError> {
    // Some issuers keep base64 padding; the URL-safe alphabet is otherwise identical.
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| MalformedTokenError::Encoding { segment: name })?;
    serde_json::from_slice::<Map<String, Value>>(&bytes)
        .map_err(|e| MalformedTokenError::Json { segment: name, reason: e.to_string() })
}

/// Read a NumericDate claim. Fractional seconds are floored; a missing or
/// non-numeric claim is `None`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn numeric_date(
    payload: &Map<String, Value>,
    claim: &'static str,
) -> Result<Option<OffsetDateTime>, MalformedTokenError> {
    let Some(value) = payload.get(claim).filter(|v| v.is_number()) else {
        return Ok(None);
    };
    let secs = match value.as_i64() {
        Some(secs) => secs,
        None => {
            let secs = value
                .as_f64()
                .map(f64::floor)
                .filter(|s| s.is_finite() && *s >= i64::MIN as f64 && *s < i64::MAX as f64)
                .ok_or(MalformedTokenError::ClaimRange(claim))?;
            secs as i64
        }
    };
    OffsetDateTime::from_unix_timestamp(secs)
        .map(Some)
        .map_err(|_| MalformedTokenError::ClaimRange(claim))
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
