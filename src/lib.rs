//! In-process credential store and session issuer.
//!
//! ```no_run
//! use credential_authority::CredentialAuthority;
//!
//! let authority = CredentialAuthority::new();
//! authority.register_user("alice", b"correcthorse").unwrap();
//! let session = authority.login("alice", b"correcthorse").unwrap();
//! assert_eq!(session.username, "alice");
//! assert!(authority.login("bob", b"anything").is_err());
//! ```

pub mod auth;
pub mod config;
pub mod timing;

pub use auth::{
    hash_password, verify_password, AuthError, AuthFailure, Credential, CredentialAuthority,
    CredentialError, RegistrationError, SessionRecord, SessionToken, UserInfo,
};
pub use config::AuthConfig;
