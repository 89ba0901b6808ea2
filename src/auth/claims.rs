/// Bearer token claims
///
/// Reads the payload segment of a JWT access token without verifying its
/// signature. The client cannot verify tokens; the server does. The only
/// claim this layer relies on is `exp`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default safety margin subtracted from `exp` (seconds)
pub const DEFAULT_EXPIRY_SKEW_SECONDS: i64 = 30;

/// Decoded access token payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Expiration time (Unix timestamp, possibly fractional)
    pub exp: f64,
    /// Everything else the server put in the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Look up a non-standard claim such as `role` or `sub`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Whether `exp - skew` lies before `now`
    pub fn is_expired_at(&self, skew_seconds: i64, now: i64) -> bool {
        // Float arithmetic: `exp` is untrusted and may sit at the i64 limits.
        self.exp - (skew_seconds as f64) < now as f64
    }
}

/// Decode the payload of `token`.
///
/// Returns `None` for anything malformed: not exactly three `.`-separated
/// segments, a payload that is not base64url, or one that is not a JSON
/// object with a numeric `exp`.
pub fn decode(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Accept padded and standard-alphabet encodings as well.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()
}

/// `true` when `token` cannot be decoded or expires within `skew_seconds`.
pub fn is_expired(token: &str, skew_seconds: i64) -> bool {
    is_expired_at(token, skew_seconds, chrono::Utc::now().timestamp())
}

/// Same as [`is_expired`] against a caller-supplied clock.
pub fn is_expired_at(token: &str, skew_seconds: i64, now: i64) -> bool {
    match decode(token) {
        Some(claims) => claims.is_expired_at(skew_seconds, now),
        None => true,
    }
}
