//! Token generation and verification.
//!
//! Two token kinds:
//! - signup tokens: 32 bytes of OS randomness, hex-encoded, stored in
//!   plaintext with an expiry (they are single-use and short-lived);
//! - bearer tokens: `wb_{prefix}_{secret}` where the 8-char prefix is the
//!   database lookup key and only a SHA-256 hash of the full token is
//!   stored. Verification compares hashes in constant time.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Fixed prefix identifying workbridge bearer tokens.
pub const BEARER_PREFIX: &str = "wb_";

/// Length of the lookup prefix inside a bearer token.
pub const LOOKUP_PREFIX_LEN: usize = 8;

/// A freshly minted bearer token. The plaintext leaves the process exactly
/// once, in the auth response.
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub plaintext: String,
    pub prefix: String,
    pub hash: String,
}

/// Generate a single-use signup token: 256 bits of OS randomness.
pub fn generate_signup_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Mint a bearer token in `wb_{prefix}_{secret}` form.
pub fn mint_bearer_token() -> MintedToken {
    let mut prefix_bytes = [0u8; 4];
    OsRng.fill_bytes(&mut prefix_bytes);
    let prefix = hex::encode(prefix_bytes);

    let mut secret_bytes = [0u8; 24];
    OsRng.fill_bytes(&mut secret_bytes);
    let secret = hex::encode(secret_bytes);

    let plaintext = format!("{}{}_{}", BEARER_PREFIX, prefix, secret);
    let hash = hash_token(&plaintext);

    MintedToken {
        plaintext,
        prefix,
        hash,
    }
}

/// Extract the lookup prefix from a presented bearer token.
/// Returns None if the token is not in the expected shape.
pub fn bearer_lookup_prefix(token: &str) -> Option<&str> {
    let body = token.strip_prefix(BEARER_PREFIX)?;
    if body.len() < LOOKUP_PREFIX_LEN + 2 {
        return None;
    }
    let (prefix, rest) = body.split_at(LOOKUP_PREFIX_LEN);
    if !rest.starts_with('_') {
        return None;
    }
    Some(prefix)
}

/// Hash a token using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted password digest: `sha256(salt || password)` stored as
/// `{salt_hex}${digest_hex}`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{}${}", salt_hex, hex::encode(hasher.finalize()))
}

/// Verify a password against a stored `{salt}${digest}` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    constant_time_eq(&hex::encode(hasher.finalize()), digest_hex)
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_token_entropy() {
        let a = generate_signup_token();
        let b = generate_signup_token();

        // 32 bytes hex-encoded
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_bearer_token_shape() {
        let minted = mint_bearer_token();

        assert!(minted.plaintext.starts_with(BEARER_PREFIX));
        assert_eq!(minted.prefix.len(), LOOKUP_PREFIX_LEN);
        assert_eq!(
            bearer_lookup_prefix(&minted.plaintext),
            Some(minted.prefix.as_str())
        );
        assert_eq!(hash_token(&minted.plaintext), minted.hash);
    }

    #[test]
    fn test_bearer_lookup_prefix_rejects_garbage() {
        assert!(bearer_lookup_prefix("not-a-token").is_none());
        assert!(bearer_lookup_prefix("wb_short").is_none());
        assert!(bearer_lookup_prefix("wb_abcd1234nosecret").is_none());
    }

    #[test]
    fn test_hash_token() {
        let token = "wb_abcd1234_secretpart";
        let hash = hash_token(token);

        assert_eq!(hash, hash_token(token));
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, hash_token("wb_abcd1234_different"));
    }

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("hunter2hunter2");
        assert!(verify_password("hunter2hunter2", &stored));
        assert!(!verify_password("wrong-password", &stored));
        assert!(!verify_password("hunter2hunter2", "malformed"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hello!"));
        assert!(constant_time_eq("", ""));
    }
}
