/*
[INPUT]:  Session tokens and expiration timestamps
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - token lifecycle management
[UPDATE]: When adding token refresh or changing storage strategy
[UPDATE]: Read expiry from the JWT `exp` claim when the server omits expiresIn
*/

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, RwLock};

/// Stored token data with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    pub token: String,
    /// `None` when neither the server nor the token states an expiry
    pub expires_at: Option<DateTime<Utc>>,
    pub username: Option<String>,
}

impl TokenData {
    /// Build token data, resolving expiry from `expires_in` or the token's `exp` claim.
    /// An `expires_in` too large to represent falls back to the claim.
    pub fn new(token: String, expires_in: Option<u64>, username: Option<String>) -> Self {
        let expires_at = expires_in
            .and_then(|seconds| i64::try_from(seconds).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .or_else(|| decode_expiry(&token));
        Self {
            token,
            expires_at,
            username,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Thread-safe token manager
#[derive(Debug, Clone, Default)]
pub struct TokenManager {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenManager {
    /// Create a new empty token manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token
    pub fn set(&self, data: TokenData) {
        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(data);
    }

    /// Get the current token if available and not expired
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .as_ref()
            .filter(|data| !data.is_expired_at(Utc::now()))
            .map(|data| data.token.clone())
    }

    /// Check if token is missing or expired
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(data) => data.is_expired_at(Utc::now()),
            None => true,
        }
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }
}

/// Read the `exp` claim of a JWT without verifying it.
///
/// Opaque (non-JWT) tokens simply have no known expiry.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload_b64 = token.trim().split('.').nth(1)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
    let exp = payload.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}
