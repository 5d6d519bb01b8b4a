//! Session Authentication
//!
//! Login-gated access for the prediction front end:
//! - Configured credential check
//! - HMAC-SHA256 signed session tokens with expiry
//! - Revocation at logout
//! - Request-scoped authentication context

mod credentials;
mod token;

pub use credentials::Credentials;
pub use token::{AuthContext, IssuedSession, SessionManager};

use thiserror::Error;
use tracing::info;

/// Message shown when a login attempt fails
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please try again.";

/// Authentication error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials. Please try again.")]
    InvalidCredentials,

    #[error("Malformed session token")]
    MalformedToken,

    #[error("Session token signature mismatch")]
    BadSignature,

    #[error("Session expired")]
    Expired,

    #[error("Session has been logged out")]
    Revoked,

    #[error("Invalid session configuration: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Store(String),
}

/// Authentication module: credentials plus the session manager
pub struct AuthModule {
    credentials: Credentials,
    sessions: SessionManager,
}

impl AuthModule {
    /// Create new auth module
    pub fn new(credentials: Credentials, sessions: SessionManager) -> Self {
        Self { credentials, sessions }
    }

    /// Check a login attempt and issue a session on success
    pub fn authenticate(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError> {
        if !self.credentials.matches(username, password) {
            info!("Rejected login attempt for user '{}'", username);
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.sessions.issue(username)?;
        info!(
            "User '{}' logged in (session {})",
            username, issued.context.session_id
        );
        Ok(issued)
    }

    /// Resolve a presented token into an authentication context
    pub fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        self.sessions.verify(token)
    }

    /// Invalidate a session
    pub fn logout(&self, context: &AuthContext) -> Result<(), AuthError> {
        self.sessions.revoke(context)?;
        info!("User '{}' logged out (session {})", context.username, context.session_id);
        Ok(())
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}
