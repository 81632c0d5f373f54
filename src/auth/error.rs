//! Failure values returned by the credential authority.
//!
//! Every failure is a value the caller can match on; nothing here panics or
//! aborts. `AuthFailure` is deliberately a unit struct: a failed login never
//! says whether the username or the password was wrong.

use thiserror::Error;

/// Registration was refused. No table mutation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The username is already registered.
    #[error("user already exists")]
    AlreadyExists,

    /// The password is shorter than the configured minimum (in bytes).
    #[error("password must be at least {min_len} bytes")]
    WeakPassword { min_len: usize },
}

/// Login failed. Identical for unknown users and wrong passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid username or password")]
pub struct AuthFailure;

/// A byte sequence could not be decoded as a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential must be exactly {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("credential is not valid hex")]
    InvalidHex,
}

/// Umbrella error for callers that drive several authority operations
/// through one `?` chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Login(#[from] AuthFailure),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}
