use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, Salt, SaltString,
    },
};
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroizing;

/// Password hashing for stored credentials.
///
/// Argon2id with a fresh random salt per digest and an optional server-side
/// pepper appended to the plaintext. Digests are PHC strings, so the
/// parameters travel with each hash and can be raised later without breaking
/// verification of older records.
pub struct CredentialCodec {
    argon2: Argon2<'static>,
    password_pepper: Zeroizing<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<PasswordHashError> for CredentialError {
    fn from(err: PasswordHashError) -> Self {
        CredentialError::PasswordHash(err.to_string())
    }
}

impl fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("params", self.argon2.params())
            .field("peppered", &!self.password_pepper.is_empty())
            .finish()
    }
}

impl CredentialCodec {
    /// ~64 MiB memory and 3 iterations: a solid baseline for servers without
    /// dedicated tuning.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = Salt::RECOMMENDED_LENGTH;

    /// Build a codec with default Argon2id parameters. An empty pepper
    /// disables peppering.
    pub fn new(password_pepper: impl AsRef<[u8]>) -> Result<Self, CredentialError> {
        Self::with_params(
            password_pepper,
            ParamsBuilder::new()
                .m_cost(Self::DEFAULT_MEMORY_KIB)
                .t_cost(Self::DEFAULT_ITERATIONS)
                .p_cost(Self::DEFAULT_PARALLELISM)
                .output_len(32)
                .build()
                .map_err(|err| CredentialError::InvalidArgon2Params(err.to_string()))?,
        )
    }

    /// Build a codec with caller-specified Argon2 parameters (useful for
    /// tests or constrained environments).
    pub fn with_params(
        password_pepper: impl AsRef<[u8]>,
        params: Params,
    ) -> Result<Self, CredentialError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::default(), params);

        Ok(Self {
            argon2,
            password_pepper: Zeroizing::new(password_pepper.as_ref().to_vec()),
        })
    }

    /// Cheapest parameters Argon2 accepts. Never use outside tests and local
    /// development.
    pub fn insecure_fast(password_pepper: impl AsRef<[u8]>) -> Result<Self, CredentialError> {
        let params = ParamsBuilder::new()
            .m_cost(Params::MIN_M_COST)
            .t_cost(Params::MIN_T_COST)
            .p_cost(Params::MIN_P_COST)
            .build()
            .map_err(|err| CredentialError::InvalidArgon2Params(err.to_string()))?;
        Self::with_params(password_pepper, params)
    }

    /// Hash a password with a random salt. Every call yields a different
    /// digest for the same input.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let material = self.peppered(password);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| CredentialError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;

        Ok(self.argon2.hash_password(&material, &salt)?.to_string())
    }

    /// Check a password against a stored digest.
    ///
    /// Any failure, including a digest that does not parse, is a mismatch.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            return false;
        };

        let material = self.peppered(password);
        self.argon2.verify_password(&material, &parsed).is_ok()
    }

    fn peppered(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(
            password.len() + self.password_pepper.len(),
        ));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.password_pepper);
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CredentialCodec {
        CredentialCodec::insecure_fast("pepper").expect("codec")
    }

    #[test]
    fn hash_then_verify_accepts_the_same_password() {
        let codec = codec();
        let digest = codec.hash("correct horse").expect("hash");
        assert!(digest.starts_with("$argon2id$"));
        assert!(codec.verify("correct horse", &digest));
    }

    #[test]
    fn verify_rejects_a_different_password() {
        let codec = codec();
        let digest = codec.hash("correct horse").expect("hash");
        assert!(!codec.verify("battery staple", &digest));
    }

    #[test]
    fn salts_differ_between_calls() {
        let codec = codec();
        let first = codec.hash("same").expect("hash");
        let second = codec.hash("same").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_digest_fails_closed() {
        let codec = codec();
        assert!(!codec.verify("anything", ""));
        assert!(!codec.verify("anything", "not-a-phc-string"));
        assert!(!codec.verify("anything", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn pepper_is_part_of_the_digest() {
        let digest = codec().hash("secret").expect("hash");
        let other = CredentialCodec::insecure_fast("other-pepper").expect("codec");
        assert!(!other.verify("secret", &digest));
    }

    #[test]
    fn debug_output_hides_pepper() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains("112, 101, 112"));
        assert!(rendered.contains("peppered: true"));
    }
}
