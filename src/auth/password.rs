use sha2::{Digest, Sha256};

/// Unsalted SHA-256 of the password, hex encoded. Equal passwords produce
/// equal digests.
pub fn hash_password(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

/// Plain string comparison, not constant-time.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    hash_password(plain) == hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password);
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple");
        assert!(!verify_password("wrong-password", &hash));
        assert!(!verify_password("correct-horse-battery-stapl", &hash));
    }

    #[test]
    fn hash_is_deterministic_hex_sha256() {
        assert_eq!(hash_password("secret1"), hash_password("secret1"));
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_is_exact_match() {
        let hash = hash_password("secret1");
        assert!(!verify_password("secret1", &hash.to_uppercase()));
        assert!(!verify_password("secret1", ""));
    }
}
