use bcrypt::BcryptError;

/// Hash a plain text password for storage.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Compare a plain text password against a stored hash.
///
/// Hashes written by the legacy back office use the `$2y$` prefix, which
/// bcrypt treats the same as `$2b$`. A malformed stored hash counts as a
/// mismatch rather than an error so login failures stay indistinguishable.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Run the bcrypt work of a verify for a login with no stored hash, so an
/// unknown email costs as long as a wrong password. Always a mismatch.
pub fn verify_missing(password: &str, cost: u32) -> bool {
    if let Err(e) = bcrypt::hash(password, cost) {
        tracing::debug!("Placeholder hash failed: {}", e);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("s3cret!", 4).unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn missing_hash_never_verifies() {
        assert!(!verify_missing("s3cret!", 4));
        assert!(!verify_missing("", 4));
    }

    #[test]
    fn legacy_2y_prefix_is_accepted() {
        let hash = hash_password("legacy-pass", 4).unwrap();
        let legacy = format!("$2y${}", &hash[4..]);
        assert!(verify_password("legacy-pass", &legacy));
    }

    #[test]
    fn garbage_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-hash"));
        assert!(!verify_password("anything", ""));
    }
}
