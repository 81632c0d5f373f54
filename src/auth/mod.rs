//! Credential authority: password registration, login, and session issue.
//!
//! Provides:
//! - Password credentials (PBKDF2-HMAC-SHA256, 100k rounds, 32-byte salt)
//! - Constant-time verification with a dummy credential for unknown users
//! - Session tokens (URL-safe base64 of 32 random bytes, 24h lifetime)
//! - In-memory user and session tables
//!
//! ## Design Decisions
//! - Credentials are a fixed 64-byte layout, `salt ‖ derived_key`, split by
//!   offset. No text delimiter.
//! - Login cost does not depend on whether the username exists: the
//!   derivation always runs and membership is combined with the result
//!   afterwards.
//! - The session table is keyed by HMAC-SHA256 under a per-authority secret
//!   instead of the plaintext token.
//! - No persistence and no network surface; callers own both.

pub mod credential;
pub mod error;
pub mod session;
pub mod store;

pub use credential::{hash_password, verify_password, Credential};
pub use error::{AuthError, AuthFailure, CredentialError, RegistrationError};
pub use session::{SessionRecord, SessionToken};
pub use store::{CredentialAuthority, UserInfo};
