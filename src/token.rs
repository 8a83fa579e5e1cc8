//! Local inspection of bearer tokens.
//!
//! The payload segment is decoded only to compare its expiry with the local clock.
//! Nothing here verifies a signature: the API remains the only authority on whether
//! a token is acceptable.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::Error;
use crate::types::Role;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Claims carried in the middle segment of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct TokenPayload {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "rol", default)]
    pub role: Option<Role>,
    /// Issued-at, seconds since the epoch.
    #[serde(rename = "iat", default)]
    pub issued_at: Option<i64>,
    /// Expiry, seconds since the epoch.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl TokenPayload {
    /// `true` while `now` is strictly before the expiry.
    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now.unix_timestamp()
    }
}

/// Decodes the payload segment of a three-segment token.
///
/// # Errors
///
/// Returns `Error::Token` if the token does not have exactly three segments, the
/// middle segment is not base64, or it does not hold a JSON object with `exp`.
pub fn decode_payload(token: &str) -> Result<TokenPayload, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::Token("invalid token format".into()));
    }

    let segment = parts[1];
    let bytes = URL_SAFE_LENIENT
        .decode(segment)
        .or_else(|_| STANDARD_LENIENT.decode(segment))
        .map_err(|_| Error::Token("invalid payload encoding".into()))?;

    serde_json::from_slice(&bytes).map_err(|e| Error::Token(format!("invalid payload: {e}")))
}

/// Checks that a token decodes and has not expired at `now`.
#[must_use]
pub fn is_token_valid_at(token: &str, now: OffsetDateTime) -> bool {
    decode_payload(token).is_ok_and(|payload| payload.is_live_at(now))
}

/// Checks a token against the current clock.
#[must_use]
pub fn is_token_valid(token: &str) -> bool {
    is_token_valid_at(token, OffsetDateTime::now_utc())
}

/// Builds an unsigned token around `payload`, for tests and local fixtures.
#[cfg(test)]
pub(crate) fn unsigned_token(payload: &serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}
