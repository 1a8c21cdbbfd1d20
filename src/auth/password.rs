use sha2::{Digest, Sha256};

// Stored form: "<salt-hex>$<digest-hex>". The digest covers salt bytes
// followed by the password bytes.

/// Hash a password with the given salt (hex string)
pub fn hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{}${:x}", salt, hasher.finalize())
}

/// Derive a per-user salt. Millisecond timestamp and user-supplied name mixed
/// through the same digest; uniqueness matters here, not secrecy.
pub fn generate_salt(username: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(chrono::Utc::now().timestamp_millis().to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Constant-shape verify: re-derive from the stored salt and compare
pub fn verify(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, _)) => hash(password, salt) == stored,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_stored_salt() {
        let stored = hash("hunter2", "ab12cd34ef56ab78");
        assert!(verify("hunter2", &stored));
        assert!(!verify("hunter3", &stored));
    }

    #[test]
    fn rejects_malformed_stored_values() {
        assert!(!verify("hunter2", "no-separator-here"));
        assert!(!verify("hunter2", ""));
    }

    #[test]
    fn salts_differ_between_users() {
        assert_ne!(generate_salt("alice"), generate_salt("bob"));
    }
}
