use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand_core::OsRng;

/// Argon2id hashing with a fixed work factor.
///
/// Digests are PHC strings, so each one records the parameters it was made
/// with and verification keeps working if the configured cost changes later.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Digest of a throwaway password, checked when the account is unknown
    /// so a failed login costs the same either way.
    dummy_digest: String,
}

impl PasswordHasher {
    pub fn new(params: Params) -> anyhow::Result<Self> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_digest = argon2
            .hash_password(b"dummy-password-for-unknown-accounts", &salt)
            .map_err(|e| anyhow::anyhow!("Failed to prepare dummy digest: {}", e))?
            .to_string();
        Ok(Self { argon2, dummy_digest })
    }

    /// Argon2's recommended cost: 19 MiB, 2 passes, 1 lane.
    pub fn with_default_cost() -> anyhow::Result<Self> {
        Self::new(Params::DEFAULT)
    }

    /// Cheapest parameters argon2 accepts. Meant for tests.
    pub fn with_min_cost() -> anyhow::Result<Self> {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .map_err(|e| anyhow::anyhow!("Invalid argon2 params: {}", e))?;
        Self::new(params)
    }

    pub fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
        Ok(digest.to_string())
    }

    /// False on mismatch and on a digest that does not parse.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok()
    }

    /// Verify against `digest`, or burn one verification on the dummy digest
    /// and report failure when there is none.
    pub fn verify_or_dummy(&self, plaintext: &str, digest: Option<&str>) -> bool {
        match digest {
            Some(digest) => self.verify(plaintext, digest),
            None => {
                let _ = self.verify(plaintext, &self.dummy_digest);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::with_min_cost().unwrap();
        let digest = hasher.hash("password1").unwrap();

        assert!(!digest.contains("password1"));
        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("password1", &digest));
        assert!(!hasher.verify("password2", &digest));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = PasswordHasher::with_min_cost().unwrap();
        assert_ne!(hasher.hash("password1").unwrap(), hasher.hash("password1").unwrap());
    }

    #[test]
    fn malformed_digest_is_a_plain_mismatch() {
        let hasher = PasswordHasher::with_min_cost().unwrap();
        assert!(!hasher.verify("password1", ""));
        assert!(!hasher.verify("password1", "not-a-phc-string"));
        assert!(!hasher.verify("password1", "$argon2id$v=19$m=8,t=1,p=1$garbage"));
    }

    #[test]
    fn unknown_account_never_verifies() {
        let hasher = PasswordHasher::with_min_cost().unwrap();
        assert!(!hasher.verify_or_dummy("dummy-password-for-unknown-accounts", None));
    }

    #[test]
    fn digest_from_other_cost_still_verifies() {
        let cheap = PasswordHasher::with_min_cost().unwrap();
        let other = PasswordHasher::new(Params::new(16, 1, 1, None).unwrap()).unwrap();
        let digest = other.hash("password1").unwrap();
        assert!(cheap.verify("password1", &digest));
    }
}
