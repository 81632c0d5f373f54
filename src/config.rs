//! Authority configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields the standard protocol: 24-hour sessions, 100k PBKDF2 rounds,
//! 8-byte minimum password. The round count and minimum length are floors:
//! a config may raise them, never lower them.

use crate::auth::credential::PBKDF2_ITERATIONS;
use crate::auth::session::DEFAULT_SESSION_TTL_SECS;
use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::path::Path;

/// Default minimum password length in bytes.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 8;

/// Longest accepted session lifetime: 10 years.
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Lifetime of an issued session, in seconds.
    pub session_ttl_secs: u64,
    /// PBKDF2-HMAC-SHA256 rounds. Not recorded in the credential, so
    /// changing it invalidates every stored credential.
    pub pbkdf2_iterations: u32,
    /// Minimum password length in bytes.
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            pbkdf2_iterations: PBKDF2_ITERATIONS,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
        }
    }
}

impl AuthConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse and validate TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pbkdf2_iterations < PBKDF2_ITERATIONS {
            bail!("pbkdf2_iterations must be at least {PBKDF2_ITERATIONS}");
        }
        if self.min_password_len < DEFAULT_MIN_PASSWORD_LEN {
            bail!("min_password_len must be at least {DEFAULT_MIN_PASSWORD_LEN}");
        }
        if self.session_ttl_secs == 0 {
            bail!("session_ttl_secs must be greater than zero");
        }
        if self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            bail!(
                "session_ttl_secs too large (max {} seconds)",
                MAX_SESSION_TTL_SECS
            );
        }
        Ok(())
    }

    /// Session lifetime as a `TimeDelta`, clamped to the accepted maximum.
    pub fn session_ttl(&self) -> TimeDelta {
        let secs = self.session_ttl_secs.min(MAX_SESSION_TTL_SECS);
        TimeDelta::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
    }
}
