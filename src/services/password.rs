//! Password hashing
//!
//! Argon2id with the crate's default parameters and a random salt per hash.
//! Hashes are stored as PHC strings, which carry their own salt and
//! parameters.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash `password` into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Password hashing failed")?;

    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed hash or an argon2 failure is
/// an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Stored password hash is malformed")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("{}", e)).context("Password verification failed"),
    }
}

/// `hash_password` on the blocking pool, off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
}

/// `verify_password` on the blocking pool, off the async workers.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("Password verification task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_and_salted() {
        let first = hash_password("secret1").expect("Failed to hash password");
        let second = hash_password("secret1").expect("Failed to hash password");

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
    }

    #[test]
    fn test_verify_matches_only_original() {
        let hash = hash_password("secret1").expect("Failed to hash password");

        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
        assert!(!verify_password(" secret1", &hash).unwrap());
    }

    #[test]
    fn test_verify_unicode_password() {
        let hash = hash_password("pässwörd🔑").expect("Failed to hash password");
        assert!(verify_password("pässwörd🔑", &hash).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        assert!(verify_password("secret1", "not-a-phc-string").is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_variants_leave_runtime_responsive() {
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        });

        let hash = hash_password_blocking("secret1".to_string())
            .await
            .expect("Failed to hash password");
        assert!(ticker.is_finished());

        assert!(verify_password_blocking("secret1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("secret2".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_blocking_verify_malformed_hash_is_error() {
        assert!(verify_password_blocking("secret1".to_string(), "nope".to_string())
            .await
            .is_err());
    }
}
