//! Generated secrets: symmetric keys, passwords and password hashes.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::defaults::ADMIN_INVOKE_USER;

/// Generates a Fernet-compatible key: 32 random bytes, URL-safe base64.
pub fn generate_secret_key() -> String {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    URL_SAFE.encode(key)
}

/// Generates a random password suitable for interactive logins.
pub fn generate_password() -> String {
    let mut raw = [0u8; 18];
    rand::thread_rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Password of the `admin.invoke` account the dashboard uses to call servers.
pub fn admin_invoke_password() -> String {
    format!("{}.{}", ADMIN_INVOKE_USER, uuid::Uuid::new_v4().simple())
}

/// Hashes a password as `sha256$<salt>$<hex digest>`.
///
/// Placeholder format: a single salted SHA-256 pass, not a key-derivation
/// function. Only the local quickstart admin is stored this way; anything
/// reachable beyond localhost needs a real KDF such as PBKDF2 or Argon2.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("sha256${}${}", salt, digest(&salt, password))
}

/// Checks a password against a hash produced by [`hash_password`].
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let mut parts = hashed.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("sha256"), Some(salt), Some(expected)) => digest(salt, password) == expected,
        _ => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_is_fernet_shaped() {
        let key = generate_secret_key();
        assert_eq!(key.len(), 44);
        assert_eq!(URL_SAFE.decode(&key).unwrap().len(), 32);
        assert_ne!(key, generate_secret_key());
    }

    #[test]
    fn test_generate_password() {
        let password = generate_password();
        assert_eq!(password.len(), 24);
        assert!(password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_admin_invoke_password_prefix() {
        let password = admin_invoke_password();
        assert!(password.starts_with("admin.invoke."));
        assert_eq!(password.len(), "admin.invoke.".len() + 32);
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("s3cret");
        assert!(hashed.starts_with("sha256$"));
        assert!(verify_password("s3cret", &hashed));
        assert!(!verify_password("wrong", &hashed));
        assert!(!verify_password("s3cret", "plain"));
    }

    #[test]
    fn test_hash_password_is_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}
