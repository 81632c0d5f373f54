//! Password credentials: PBKDF2-HMAC-SHA256 with a per-call random salt.
//!
//! Layout (64 bytes, no delimiter):
//! - `[0..32]`  salt
//! - `[32..64]` derived key
//!
//! Fields are only ever split by offset. Comparison of derived keys goes
//! through `subtle`, so verification time does not depend on where (or
//! whether) the candidate and stored keys differ.

use super::error::CredentialError;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// Encoded credential length: salt followed by derived key.
pub const CREDENTIAL_LEN: usize = SALT_LEN + KEY_LEN;

/// PBKDF2 iteration count for stored credentials.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt plus derived key for one password.
#[derive(Clone)]
pub struct Credential {
    bytes: [u8; CREDENTIAL_LEN],
}

impl Credential {
    /// The all-zero credential verified against when a username is unknown.
    /// Same shape as a real one, so the hashing work is identical.
    pub const fn dummy() -> Self {
        Self {
            bytes: [0u8; CREDENTIAL_LEN],
        }
    }

    /// Decode raw bytes. Anything other than exactly 64 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CredentialError> {
        let bytes: [u8; CREDENTIAL_LEN] =
            bytes.try_into().map_err(|_| CredentialError::InvalidLength {
                expected: CREDENTIAL_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    /// Decode the hex text form produced by [`Credential::to_hex`].
    pub fn from_hex(encoded: &str) -> Result<Self, CredentialError> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| CredentialError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    /// Hex text form for callers that persist credentials as strings.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CREDENTIAL_LEN] {
        &self.bytes
    }

    pub fn salt(&self) -> &[u8] {
        &self.bytes[..SALT_LEN]
    }

    pub fn derived_key(&self) -> &[u8] {
        &self.bytes[SALT_LEN..]
    }

    fn from_parts(salt: &[u8; SALT_LEN], key: &[u8; KEY_LEN]) -> Self {
        let mut bytes = [0u8; CREDENTIAL_LEN];
        bytes[..SALT_LEN].copy_from_slice(salt);
        bytes[SALT_LEN..].copy_from_slice(key);
        Self { bytes }
    }
}

// Equality runs in constant time as well; callers comparing credentials
// directly must not get a timing oracle either.
impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.bytes[..].ct_eq(&other.bytes[..]).into()
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("salt", &hex::encode(self.salt()))
            .field("derived_key", &"<redacted>")
            .finish()
    }
}

/// Hash a password with a fresh random salt and the standard iteration count.
pub fn hash_password(password: &[u8]) -> Credential {
    hash_password_with_iterations(password, PBKDF2_ITERATIONS)
}

/// Verify a password against a stored credential using the standard
/// iteration count.
pub fn verify_password(password: &[u8], stored: &Credential) -> bool {
    verify_password_with_iterations(password, stored, PBKDF2_ITERATIONS)
}

/// Hash a password with a fresh random salt and an explicit iteration count.
pub fn hash_password_with_iterations(password: &[u8], iterations: u32) -> Credential {
    let salt = generate_salt();
    let key = derive_key(password, &salt, iterations);
    Credential::from_parts(&salt, &key)
}

/// Recompute the derived key from `stored`'s salt and compare in constant
/// time. The iteration count must match the one used at hashing time.
pub fn verify_password_with_iterations(
    password: &[u8],
    stored: &Credential,
    iterations: u32,
) -> bool {
    let computed = derive_key(password, stored.salt(), iterations);
    computed[..].ct_eq(stored.derived_key()).into()
}

/// PBKDF2-HMAC-SHA256 into a 32-byte key.
fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap iteration count for the bulk of the tests; the standard count is
    // covered separately.
    const FAST: u32 = 1_000;

    #[test]
    fn verify_accepts_original_password() {
        let cred = hash_password(b"correcthorse");
        assert!(verify_password(b"correcthorse", &cred));
    }

    #[test]
    fn verify_rejects_other_password() {
        let cred = hash_password_with_iterations(b"correcthorse", FAST);
        assert!(!verify_password_with_iterations(b"batterystaple", &cred, FAST));
        assert!(!verify_password_with_iterations(b"", &cred, FAST));
        assert!(!verify_password_with_iterations(b"correcthorsE", &cred, FAST));
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        let a = hash_password_with_iterations(b"same_password", FAST);
        let b = hash_password_with_iterations(b"same_password", FAST);
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.salt(), b.salt());
    }

    #[test]
    fn derivation_is_deterministic_for_fixed_salt() {
        let salt = [7u8; SALT_LEN];
        assert_eq!(derive_key(b"pw", &salt, FAST), derive_key(b"pw", &salt, FAST));
        assert_ne!(
            derive_key(b"pw", &salt, FAST),
            derive_key(b"pw", &[8u8; SALT_LEN], FAST)
        );
    }

    #[test]
    fn iteration_count_is_part_of_the_derivation() {
        let cred = hash_password_with_iterations(b"password123", FAST);
        assert!(!verify_password_with_iterations(b"password123", &cred, FAST + 1));
    }

    #[test]
    fn layout_is_salt_then_key() {
        let cred = hash_password_with_iterations(b"layout_check", FAST);
        assert_eq!(cred.as_bytes().len(), CREDENTIAL_LEN);
        assert_eq!(cred.salt(), &cred.as_bytes()[..SALT_LEN]);

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(cred.salt());
        assert_eq!(cred.derived_key(), derive_key(b"layout_check", &salt, FAST));
    }

    #[test]
    fn dummy_credential_rejects_everything() {
        let dummy = Credential::dummy();
        assert_eq!(dummy.as_bytes(), &[0u8; CREDENTIAL_LEN]);
        assert!(!verify_password_with_iterations(b"", &dummy, FAST));
        assert!(!verify_password_with_iterations(b"anything", &dummy, FAST));
    }

    #[test]
    fn from_bytes_requires_exact_length() {
        assert_eq!(
            Credential::from_bytes(&[0u8; 63]),
            Err(CredentialError::InvalidLength {
                expected: CREDENTIAL_LEN,
                actual: 63
            })
        );
        assert!(Credential::from_bytes(&[0u8; 65]).is_err());
        assert!(Credential::from_bytes(&[0u8; CREDENTIAL_LEN]).is_ok());
    }

    #[test]
    fn hex_form_decodes_back() {
        let cred = hash_password_with_iterations(b"hex_storage", FAST);
        let decoded = Credential::from_hex(&cred.to_hex()).unwrap();
        assert_eq!(decoded, cred);
        assert!(verify_password_with_iterations(b"hex_storage", &decoded, FAST));
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert_eq!(
            Credential::from_hex("not hex at all"),
            Err(CredentialError::InvalidHex)
        );
        assert!(matches!(
            Credential::from_hex("abcd"),
            Err(CredentialError::InvalidLength { actual: 2, .. })
        ));
    }

    #[test]
    fn debug_output_hides_derived_key() {
        let cred = hash_password_with_iterations(b"secret_password", FAST);
        let rendered = format!("{cred:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&hex::encode(cred.derived_key())));
    }
}
