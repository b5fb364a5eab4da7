//! # Password Verification
//!
//! PBKDF2-HMAC-SHA256 key derivation with a constant-time comparison
//! against the stored hash. Derivation is CPU-bound, so the async entry
//! point runs it on tokio's blocking pool under a timeout, with at most
//! one derivation in flight per permit.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use shop_core::{AuthError, AuthResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{instrument, warn};

/// Iteration count for PBKDF2-HMAC-SHA256
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Derived key length in bytes
pub const KEY_LEN: usize = 32;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derive a 32-byte key from a password and salt
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Compare two byte strings without short-circuiting on the first mismatch
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Fresh random salt from the OS RNG
pub fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Hash a new password, returning `(hash, salt)`
pub fn hash_password(password: &str, iterations: u32) -> (Vec<u8>, Vec<u8>) {
    let salt = generate_salt();
    let hash = derive_key(password, &salt, iterations).to_vec();
    (hash, salt)
}

/// Number of derivations allowed to run at once by default
fn default_max_concurrent() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Password verifier with a fixed iteration count and time budget.
///
/// Clones share the same concurrency permits.
#[derive(Debug, Clone)]
pub struct PasswordVerifier {
    iterations: u32,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl PasswordVerifier {
    pub fn new(iterations: u32, timeout: Duration) -> Self {
        Self {
            iterations,
            timeout,
            permits: Arc::new(Semaphore::new(default_max_concurrent())),
        }
    }

    /// Cap the number of derivations running on the blocking pool
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Permits not currently held by a running derivation
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Synchronous check. Blocks the calling thread for the whole derivation.
    pub fn verify(&self, password: &str, salt: &[u8], stored_hash: &[u8]) -> bool {
        let derived = derive_key(password, salt, self.iterations);
        constant_time_eq(&derived, stored_hash)
    }

    /// Check on the blocking pool, bounded by the configured timeout.
    ///
    /// Waiting for a permit counts against the timeout. A derivation that
    /// outlives the timeout keeps its permit until it finishes.
    #[instrument(skip_all, fields(iterations = self.iterations))]
    pub async fn verify_async(
        &self,
        password: String,
        salt: Vec<u8>,
        stored_hash: Vec<u8>,
    ) -> AuthResult<bool> {
        let verifier = self.clone();
        let permits = self.permits.clone();
        let task = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| AuthError::KeyDerivation(e.to_string()))?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                verifier.verify(&password, &salt, &stored_hash)
            })
            .await
            .map_err(|e| AuthError::KeyDerivation(e.to_string()))
        };

        match tokio::time::timeout(self.timeout, task).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Key derivation exceeded {:?}", self.timeout);
                Err(AuthError::KeyDerivation("timed out".to_string()))
            }
        }
    }
}

impl Default for PasswordVerifier {
    fn default() -> Self {
        Self::new(
            PBKDF2_ITERATIONS,
            Duration::from_millis(crate::config::DEFAULT_KDF_TIMEOUT_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn test_known_vector() {
        // RFC 7914 section 11, PBKDF2-HMAC-SHA256 c=1, first 32 bytes
        let key = derive_key("passwd", b"salt", 1);
        assert_eq!(
            hex::encode(key),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_verify_matches_own_derivation() {
        let verifier = PasswordVerifier::new(FAST, Duration::from_secs(5));

        for (password, salt) in [
            ("hunter2", b"0123456789abcdef".as_slice()),
            ("", b"salt".as_slice()),
            ("pässwörd with spaces", b"\x00\x01\x02".as_slice()),
        ] {
            let hash = derive_key(password, salt, FAST);
            assert!(verifier.verify(password, salt, &hash));
            assert!(!verifier.verify("other password", salt, &hash));
        }
    }

    #[test]
    fn test_verify_with_production_iterations() {
        let verifier = PasswordVerifier::default();
        let (hash, salt) = hash_password("correct horse", PBKDF2_ITERATIONS);

        assert_eq!(hash.len(), KEY_LEN);
        assert!(verifier.verify("correct horse", &salt, &hash));
        assert!(!verifier.verify("correct horsf", &salt, &hash));
    }

    #[test]
    fn test_generated_salt_is_random() {
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_LEN);
        assert_ne!(salt, generate_salt());
    }

    #[test]
    fn test_salt_changes_hash() {
        let (hash1, salt1) = hash_password("same", FAST);
        let (hash2, salt2) = hash_password("same", FAST);

        assert_ne!(salt1, salt2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc123", b"abc123"));
        assert!(!constant_time_eq(b"abc123", b"abc124"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_verify_async() {
        let verifier = PasswordVerifier::new(FAST, Duration::from_secs(5));
        let (hash, salt) = hash_password("hunter2", FAST);

        assert!(verifier
            .verify_async("hunter2".into(), salt.clone(), hash.clone())
            .await
            .unwrap());
        assert!(!verifier
            .verify_async("hunter3".into(), salt, hash)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_verify_async_timeout() {
        let verifier = PasswordVerifier::new(PBKDF2_ITERATIONS, Duration::ZERO);
        let (hash, salt) = hash_password("hunter2", FAST);

        let result = verifier.verify_async("hunter2".into(), salt, hash).await;
        assert!(matches!(result, Err(AuthError::KeyDerivation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_derivations_are_capped() {
        let verifier =
            PasswordVerifier::new(PBKDF2_ITERATIONS, Duration::ZERO).with_max_concurrent(1);
        let (hash, salt) = hash_password("hunter2", FAST);

        let first = verifier
            .verify_async("hunter2".into(), salt.clone(), hash.clone())
            .await;
        assert!(matches!(first, Err(AuthError::KeyDerivation(_))));

        // The abandoned derivation still holds the only permit
        assert_eq!(verifier.available_permits(), 0);
        let second = verifier.verify_async("hunter2".into(), salt, hash).await;
        assert!(matches!(second, Err(AuthError::KeyDerivation(_))));

        for _ in 0..600 {
            if verifier.available_permits() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(verifier.available_permits(), 1);
    }
}
