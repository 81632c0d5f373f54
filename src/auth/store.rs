//! In-memory credential authority.
//!
//! Tables:
//! - users: username -> credential, created_at
//! - sessions: HMAC(secret, token) -> username, created_at, expires_at
//!
//! Login always performs the full PBKDF2 derivation and constant-time
//! comparison, against a dummy credential when the username is unknown, so
//! neither the result nor the latency tells a caller whether an account
//! exists.

use super::credential::{
    hash_password_with_iterations, verify_password_with_iterations, Credential,
};
use super::error::{AuthFailure, RegistrationError};
use super::session::{SessionRecord, SessionTable, SessionToken};
use crate::config::AuthConfig;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone)]
struct UserRecord {
    credential: Credential,
    created_at: DateTime<Utc>,
}

/// Public view of a registered user. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Owns the user and session tables plus the process secret.
pub struct CredentialAuthority {
    users: RwLock<HashMap<String, UserRecord>>,
    sessions: Mutex<SessionTable>,
    config: AuthConfig,
    session_ttl: TimeDelta,
}

impl CredentialAuthority {
    /// Authority with the standard protocol parameters.
    pub fn new() -> Self {
        Self::from_validated(AuthConfig::default())
    }

    /// Authority with custom settings. Refuses configs that fall below the
    /// standard round count or minimum password length, or that would issue
    /// sessions already expired.
    pub fn with_config(config: AuthConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Cheap-parameter authority for tests; skips validation.
    #[cfg(test)]
    pub(crate) fn with_config_unchecked(config: AuthConfig) -> Self {
        Self::from_validated(config)
    }

    fn from_validated(config: AuthConfig) -> Self {
        let session_ttl = config.session_ttl();
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: Mutex::new(SessionTable::new()),
            config,
            session_ttl,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ── User Management ─────────────────────────────────────────────

    /// Register a new user.
    ///
    /// Refuses an existing username before anything else, then a short
    /// password before any hashing. Neither failure touches the table.
    pub fn register_user(&self, username: &str, password: &[u8]) -> Result<(), RegistrationError> {
        if self.users.read().contains_key(username) {
            tracing::debug!(username, "Registration refused: username taken");
            return Err(RegistrationError::AlreadyExists);
        }
        if password.len() < self.config.min_password_len {
            tracing::debug!(username, "Registration refused: password too short");
            return Err(RegistrationError::WeakPassword {
                min_len: self.config.min_password_len,
            });
        }

        // Hash outside the lock; the write lock below makes check-then-insert
        // atomic against a concurrent registration of the same name.
        let credential = hash_password_with_iterations(password, self.config.pbkdf2_iterations);

        let mut users = self.users.write();
        match users.entry(username.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!(username, "Registration refused: username taken");
                Err(RegistrationError::AlreadyExists)
            }
            Entry::Vacant(slot) => {
                slot.insert(UserRecord {
                    credential,
                    created_at: Utc::now(),
                });
                tracing::info!(username, "User registered");
                Ok(())
            }
        }
    }

    /// Look up a registered user.
    pub fn user(&self, username: &str) -> Option<UserInfo> {
        self.users.read().get(username).map(|user| UserInfo {
            username: username.to_string(),
            created_at: user.created_at,
        })
    }

    pub fn contains_user(&self, username: &str) -> bool {
        self.users.read().contains_key(username)
    }

    /// Stored credential for callers that persist credentials themselves.
    pub fn stored_credential(&self, username: &str) -> Option<Credential> {
        self.users
            .read()
            .get(username)
            .map(|user| user.credential.clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    // ── Login ───────────────────────────────────────────────────────

    /// Verify a login attempt and issue a session on success.
    ///
    /// Unknown usernames are verified against [`Credential::dummy`], and the
    /// existence flag is combined with the verification result only after
    /// the hashing work is done. Membership is read exactly once.
    pub fn login(&self, username: &str, password: &[u8]) -> Result<SessionRecord, AuthFailure> {
        let (exists, credential) = match self.users.read().get(username) {
            Some(user) => (true, user.credential.clone()),
            None => (false, Credential::dummy()),
        };

        let verified =
            verify_password_with_iterations(password, &credential, self.config.pbkdf2_iterations);

        // Non-short-circuiting: both operands are already computed.
        if !(exists & verified) {
            tracing::debug!(username, "Login rejected");
            return Err(AuthFailure);
        }

        let record = SessionRecord::new(
            SessionToken::generate(),
            username,
            Utc::now(),
            self.session_ttl,
        );
        self.sessions.lock().insert(&record);
        tracing::info!(username, expires_at = %record.expires_at, "Session issued");
        Ok(record)
    }

    // ── Session Lookup ──────────────────────────────────────────────

    /// Look up a session by token. Returns logically expired records too;
    /// use [`SessionRecord::is_expired_at`] or [`Self::validate_session`].
    pub fn session(&self, token: &SessionToken) -> Option<SessionRecord> {
        self.sessions.lock().get(token)
    }

    /// Return the session only while it is active at `now`.
    pub fn validate_session(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Option<SessionRecord> {
        self.session(token).filter(|record| record.is_active_at(now))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl Default for CredentialAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialAuthority")
            .field("users", &self.user_count())
            .field("sessions", &self.session_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
