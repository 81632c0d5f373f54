//! Session tokens and the append-only session table.
//!
//! Tokens are 32 random bytes, URL-safe base64 without padding. The table
//! never holds a token in the clear: records are keyed by
//! HMAC-SHA256(process secret, token), so a dump of the table cannot be
//! replayed as bearer credentials.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::digest::Key;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// Token byte length before encoding.
pub const TOKEN_BYTES: usize = 32;

/// Default session lifetime: 24 hours (seconds).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 3600;

/// Process secret length; one HMAC-SHA256 block.
const SECRET_BYTES: usize = 64;

type HmacSha256 = Hmac<Sha256>;

/// Opaque bearer token handed to the client.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Fresh token from the CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// A session issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub session_id: SessionToken,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        session_id: SessionToken,
        username: &str,
        created_at: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Self {
        let expires_at = created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            session_id,
            username: username.to_string(),
            created_at,
            expires_at,
        }
    }

    /// True once `now` has reached `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now)
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Append-only map of issued sessions. Entries are never mutated or removed.
pub(crate) struct SessionTable {
    secret: Zeroizing<[u8; SECRET_BYTES]>,
    entries: HashMap<[u8; 32], SessionEntry>,
}

impl SessionTable {
    /// New empty table with a freshly generated process secret.
    pub(crate) fn new() -> Self {
        let mut secret = Zeroizing::new([0u8; SECRET_BYTES]);
        rand::rng().fill_bytes(&mut secret[..]);
        Self {
            secret,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, record: &SessionRecord) {
        let key = self.table_key(&record.session_id);
        self.entries.insert(
            key,
            SessionEntry {
                username: record.username.clone(),
                created_at: record.created_at,
                expires_at: record.expires_at,
            },
        );
    }

    /// Look up a session by its token, expired or not.
    pub(crate) fn get(&self, token: &SessionToken) -> Option<SessionRecord> {
        self.entries
            .get(&self.table_key(token))
            .map(|entry| SessionRecord {
                session_id: token.clone(),
                username: entry.username.clone(),
                created_at: entry.created_at,
                expires_at: entry.expires_at,
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn table_key(&self, token: &SessionToken) -> [u8; 32] {
        let mut mac = <HmacSha256 as Mac>::new(<Key<HmacSha256>>::from_slice(&self.secret[..]));
        mac.update(token.as_str().as_bytes());
        mac.finalize().into_bytes().into()
    }
}
