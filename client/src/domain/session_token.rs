//! Session token inspection.
//!
//! Tokens are JWT shaped: `header.payload.signature`, each segment base64
//! encoded. The client never verifies signatures; it only reads the payload
//! claims it needs (`exp`, `role`, `schoolId`). Every decode failure is
//! reported as [`TokenDecodeError`] and callers treat it as "absent".

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors raised while decoding a session token payload.
#[derive(Debug, Error)]
pub enum TokenDecodeError {
    /// The token does not have exactly three dot-separated segments.
    #[error("session token must have three dot-separated segments, found {segments}")]
    Malformed {
        /// Number of segments found.
        segments: usize,
    },
    /// The payload segment is not valid base64.
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    /// The payload is not a JSON document.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The payload decodes but is not a JSON object.
    #[error("session token payload must be a JSON object")]
    NotAnObject,
    /// A claim is present with an unusable type.
    #[error("session token claim `{claim}` has an invalid value")]
    InvalidClaim {
        /// Claim name.
        claim: &'static str,
    },
}

/// Bearer token read from session storage.
///
/// The raw value is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Raw token text for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Copy the raw value into a zeroizing buffer owned by a request.
    #[must_use]
    pub fn to_bearer(&self) -> Zeroizing<String> {
        self.0.clone()
    }

    /// Decode the payload claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] when the token is not three segments,
    /// the payload is not base64 JSON, or a consumed claim has the wrong
    /// type.
    ///
    /// # Examples
    /// ```
    /// use erp_client::domain::SessionToken;
    ///
    /// // {"role":"teacher","schoolId":7}
    /// let token = SessionToken::new("e30.eyJyb2xlIjoidGVhY2hlciIsInNjaG9vbElkIjo3fQ.sig");
    /// let claims = token.claims()?;
    /// assert_eq!(claims.role(), Some("teacher"));
    /// assert_eq!(claims.school_id(), Some(7));
    /// # Ok::<(), erp_client::domain::TokenDecodeError>(())
    /// ```
    pub fn claims(&self) -> Result<SessionClaims, TokenDecodeError> {
        let segments: Vec<&str> = self.as_str().split('.').collect();
        let [_header, payload, _signature] = segments.as_slice() else {
            return Err(TokenDecodeError::Malformed {
                segments: segments.len(),
            });
        };
        let bytes = decode_segment(payload)?;
        let value: Value = serde_json::from_slice(&bytes)?;
        match value {
            Value::Object(fields) => SessionClaims::from_fields(&fields),
            _ => Err(TokenDecodeError::NotAnObject),
        }
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
}

/// Claims the client reads from a session token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClaims {
    expires_at: Option<i64>,
    role: Option<String>,
    school_id: Option<i64>,
}

impl SessionClaims {
    fn from_fields(fields: &Map<String, Value>) -> Result<Self, TokenDecodeError> {
        let expires_at = match fields.get("exp") {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => Some(
                number
                    .as_i64()
                    // Fractional seconds truncate towards zero.
                    .or_else(|| number.as_f64().map(|seconds| seconds as i64))
                    .ok_or(TokenDecodeError::InvalidClaim { claim: "exp" })?,
            ),
            Some(_) => return Err(TokenDecodeError::InvalidClaim { claim: "exp" }),
        };
        let role = fields
            .get("role")
            .and_then(Value::as_str)
            .filter(|role| !role.trim().is_empty())
            .map(str::to_owned);
        let school_id = fields.get("schoolId").and_then(|value| match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        });
        Ok(Self {
            expires_at,
            role,
            school_id,
        })
    }

    /// Expiry as epoch seconds, when the token carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Role name such as `admin` or `teacher`.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Identifier of the school the session belongs to.
    #[must_use]
    pub fn school_id(&self) -> Option<i64> {
        self.school_id
    }

    /// Whether the token has expired at `now`.
    ///
    /// Tokens without `exp` never expire. A token expiring exactly at `now`
    /// counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|seconds| {
            seconds.saturating_mul(1000) <= now.timestamp_millis()
        })
    }
}
