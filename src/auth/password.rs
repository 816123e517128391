use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes per salt, before hex encoding.
pub const SALT_LEN: usize = 32;

/// Key under which a user's `salt` and `hash` fields are stored.
pub fn credential_key(username: &str) -> String {
    format!("user:{username}")
}

pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// `hex(SHA-256(key ":" salt ":" password))`
pub fn hash_password(key: &str, salt: &str, plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(key: &str, salt: &str, plain: &str, expected: &str) -> bool {
    let computed = hash_password(key, salt, plain);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let key = credential_key("alice");
        let salt = generate_salt();
        let hash = hash_password(&key, &salt, "Secur3P@ssw0rd!");
        assert!(verify_password(&key, &salt, "Secur3P@ssw0rd!", &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let key = credential_key("alice");
        let salt = generate_salt();
        let hash = hash_password(&key, &salt, "correct-horse-battery-staple");
        assert!(!verify_password(&key, &salt, "wrong-password", &hash));
    }

    #[test]
    fn hash_is_bound_to_key_and_salt() {
        let salt = generate_salt();
        let for_alice = hash_password(&credential_key("alice"), &salt, "pw");
        let for_bob = hash_password(&credential_key("bob"), &salt, "pw");
        assert_ne!(for_alice, for_bob);
        assert_ne!(for_alice, hash_password(&credential_key("alice"), &generate_salt(), "pw"));
    }

    #[test]
    fn matches_known_digest() {
        // sha256("user:a:s:p")
        let expected = {
            let mut h = Sha256::new();
            h.update(b"user:a:s:p");
            hex::encode(h.finalize())
        };
        assert_eq!(hash_password("user:a", "s", "p"), expected);
    }

    #[test]
    fn salts_are_fixed_size_and_random() {
        let a = generate_salt();
        assert_eq!(a.len(), SALT_LEN * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, generate_salt());
    }

    #[test]
    fn verify_rejects_truncated_hash() {
        let hash = hash_password("user:a", "s", "p");
        assert!(!verify_password("user:a", "s", "p", &hash[..10]));
    }
}
