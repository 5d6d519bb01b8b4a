//! Signed session tokens.
//!
//! Token layout: `<session-id>.<expires-unix>.<hex(username)>.<hex(mac)>`,
//! where `mac = HMAC-SHA256(secret, "<session-id>.<expires-unix>.<hex(username)>")`.
//! Every part is hex or decimal so the token is cookie-safe as-is.

use crate::AuthError;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Shortest accepted signing secret, in bytes
const MIN_SECRET_LEN: usize = 16;

/// Longest accepted session lifetime: one year
const MAX_TTL_SECONDS: i64 = 366 * 24 * 60 * 60;

/// Who is making a request, resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub username: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Opaque value to hand to the client
    pub token: String,
    pub context: AuthContext,
}

/// Issues, verifies and revokes session tokens
pub struct SessionManager {
    /// Keyed MAC, cloned per signature
    mac: HmacSha256,
    ttl: Duration,
    /// Revoked session ids with their expiry (unix seconds)
    revoked: Mutex<HashMap<Uuid, i64>>,
}

impl SessionManager {
    /// Create a manager signing with `secret`; sessions last `ttl_seconds`
    pub fn new(secret: impl AsRef<[u8]>, ttl_seconds: i64) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "session secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if ttl_seconds <= 0 || ttl_seconds > MAX_TTL_SECONDS {
            return Err(AuthError::Config(format!(
                "session ttl must be between 1 and {} seconds, got {}",
                MAX_TTL_SECONDS, ttl_seconds
            )));
        }
        let ttl = Duration::try_seconds(ttl_seconds)
            .ok_or_else(|| AuthError::Config(format!("session ttl {} is out of range", ttl_seconds)))?;

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| AuthError::Config(format!("session secret rejected: {}", e)))?;

        Ok(Self {
            mac,
            ttl,
            revoked: Mutex::new(HashMap::new()),
        })
    }

    /// Session lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a session for `username` starting now
    pub fn issue(&self, username: &str) -> Result<IssuedSession, AuthError> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a session starting at `now`; fails if the expiry is not a representable time
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<IssuedSession, AuthError> {
        let expires_at = DateTime::from_timestamp(now.timestamp(), 0)
            .and_then(|start| start.checked_add_signed(self.ttl))
            .ok_or_else(|| AuthError::Config(format!("session expiry out of range for start {}", now)))?;
        let expires = expires_at.timestamp();

        let session_id = Uuid::new_v4();
        let payload = format!("{}.{}.{}", session_id.simple(), expires, hex::encode(username));
        let token = format!("{}.{}", payload, self.sign(&payload));

        Ok(IssuedSession {
            token,
            context: AuthContext {
                username: username.to_string(),
                session_id,
                expires_at,
            },
        })
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AuthContext, AuthError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(AuthError::MalformedToken)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| AuthError::BadSignature)?;

        let mut parts = payload.splitn(3, '.');
        let (Some(id), Some(expires), Some(user)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AuthError::MalformedToken);
        };

        let session_id = Uuid::parse_str(id).map_err(|_| AuthError::MalformedToken)?;
        let expires: i64 = expires.parse().map_err(|_| AuthError::MalformedToken)?;
        let username = hex::decode(user)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(AuthError::MalformedToken)?;

        if now.timestamp() >= expires {
            debug!("Session {} expired", session_id);
            return Err(AuthError::Expired);
        }

        let revoked = self
            .revoked
            .lock()
            .map_err(|e| AuthError::Store(format!("Lock error: {}", e)))?;
        if revoked.contains_key(&session_id) {
            return Err(AuthError::Revoked);
        }

        Ok(AuthContext {
            username,
            session_id,
            expires_at: DateTime::from_timestamp(expires, 0).ok_or(AuthError::MalformedToken)?,
        })
    }

    /// Revoke a session until it would have expired anyway
    pub fn revoke(&self, context: &AuthContext) -> Result<(), AuthError> {
        let mut revoked = self
            .revoked
            .lock()
            .map_err(|e| AuthError::Store(format!("Lock error: {}", e)))?;

        let now = Utc::now().timestamp();
        revoked.retain(|_, expires| *expires > now);
        revoked.insert(context.session_id, context.expires_at.timestamp());
        Ok(())
    }

    /// Number of revoked sessions still tracked
    pub fn revoked_count(&self) -> usize {
        self.revoked.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
