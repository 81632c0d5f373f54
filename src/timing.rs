//! Login latency measurement.
//!
//! Measures wall-clock login time for two classes of failing attempt,
//! unknown username and known username with a wrong password, and
//! summarises each class. If the dummy-credential path ever stops doing the
//! full derivation, the unknown-user mean collapses by orders of magnitude
//! and `mean_ratio` exposes it.

use crate::auth::CredentialAuthority;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Summary statistics over a set of latency samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    pub std_dev: Duration,
}

impl LatencySummary {
    /// `None` for an empty sample set.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;

        let count = samples.len() as f64;
        let nanos: Vec<f64> = samples.iter().map(|d| d.as_nanos() as f64).collect();
        let mean = nanos.iter().sum::<f64>() / count;
        let variance = nanos.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / count;

        Some(Self {
            samples: samples.len(),
            mean: Duration::from_nanos(mean as u64),
            min,
            max,
            std_dev: Duration::from_nanos(variance.sqrt() as u64),
        })
    }
}

/// Latency of unknown-user attempts versus wrong-password attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoginTimingReport {
    pub unknown_user: LatencySummary,
    pub wrong_password: LatencySummary,
}

impl LoginTimingReport {
    /// Slower mean divided by faster mean; 1.0 means identical.
    pub fn mean_ratio(&self) -> f64 {
        let a = self.unknown_user.mean.as_nanos() as f64;
        let b = self.wrong_password.mean.as_nanos() as f64;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if lo == 0.0 {
            return f64::INFINITY;
        }
        hi / lo
    }

    /// True when both means are within `tolerance` (a ratio, e.g. 1.5).
    pub fn is_indistinguishable(&self, tolerance: f64) -> bool {
        self.mean_ratio() <= tolerance
    }
}

impl fmt::Display for LoginTimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "unknown user:   mean {:?} (min {:?}, max {:?}, sd {:?}, n={})",
            self.unknown_user.mean,
            self.unknown_user.min,
            self.unknown_user.max,
            self.unknown_user.std_dev,
            self.unknown_user.samples
        )?;
        writeln!(
            f,
            "wrong password: mean {:?} (min {:?}, max {:?}, sd {:?}, n={})",
            self.wrong_password.mean,
            self.wrong_password.min,
            self.wrong_password.max,
            self.wrong_password.std_dev,
            self.wrong_password.samples
        )?;
        write!(f, "mean ratio:     {:.3}", self.mean_ratio())
    }
}

/// Time `trials` failing logins of each class against `authority`.
///
/// `known_user` must already be registered. Attempts alternate between the
/// two classes so slow drift (frequency scaling, other load) hits both
/// equally. Returns `None` when `trials` is zero.
pub fn measure_login_latency(
    authority: &CredentialAuthority,
    known_user: &str,
    trials: usize,
) -> Option<LoginTimingReport> {
    let mut unknown = Vec::with_capacity(trials);
    let mut wrong = Vec::with_capacity(trials);

    for i in 0..trials {
        let password = format!("not-the-password-{i}");

        let absent = format!("{known_user}-absent-{i}");
        let start = Instant::now();
        let _ = authority.login(&absent, password.as_bytes());
        unknown.push(start.elapsed());

        let start = Instant::now();
        let _ = authority.login(known_user, password.as_bytes());
        wrong.push(start.elapsed());
    }

    let report = LoginTimingReport {
        unknown_user: LatencySummary::from_samples(&unknown)?,
        wrong_password: LatencySummary::from_samples(&wrong)?,
    };
    tracing::debug!(trials, ratio = report.mean_ratio(), "Login latency measured");
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn summary_of_empty_set_is_none() {
        assert!(LatencySummary::from_samples(&[]).is_none());
    }

    #[test]
    fn summary_statistics() {
        let samples = [ms(2), ms(4), ms(4), ms(4), ms(5), ms(5), ms(7), ms(9)];
        let summary = LatencySummary::from_samples(&samples).unwrap();
        assert_eq!(summary.samples, 8);
        assert_eq!(summary.mean, ms(5));
        assert_eq!(summary.min, ms(2));
        assert_eq!(summary.max, ms(9));
        assert_eq!(summary.std_dev, ms(2));
    }

    #[test]
    fn ratio_flags_a_skipped_hash_path() {
        let fast = LatencySummary::from_samples(&[Duration::from_micros(5)]).unwrap();
        let slow = LatencySummary::from_samples(&[ms(50)]).unwrap();
        let report = LoginTimingReport {
            unknown_user: fast,
            wrong_password: slow,
        };
        assert!(report.mean_ratio() > 1000.0);
        assert!(!report.is_indistinguishable(2.0));

        let even = LoginTimingReport {
            unknown_user: slow,
            wrong_password: slow,
        };
        assert_eq!(even.mean_ratio(), 1.0);
    }

    #[test]
    fn zero_trials_yield_no_report() {
        let authority = CredentialAuthority::with_config_unchecked(AuthConfig {
            pbkdf2_iterations: 1_000,
            ..AuthConfig::default()
        });
        authority.register_user("timing_user", b"timing-password").unwrap();
        assert!(measure_login_latency(&authority, "timing_user", 0).is_none());
    }

    #[test]
    fn unknown_user_and_wrong_password_take_comparable_time() {
        let authority = CredentialAuthority::with_config_unchecked(AuthConfig {
            pbkdf2_iterations: 20_000,
            ..AuthConfig::default()
        });
        authority.register_user("timing_user", b"timing-password").unwrap();

        let report = measure_login_latency(&authority, "timing_user", 30).unwrap();
        assert_eq!(report.unknown_user.samples, 30);
        // Skipping the derivation for unknown users would put this ratio in
        // the thousands; doing the same work keeps it near 1.
        assert!(
            report.is_indistinguishable(3.0),
            "login latency differs by account existence:\n{report}"
        );
        assert_eq!(authority.session_count(), 0);
    }
}
