use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters")]
    InvalidParams(argon2::Error),
    #[error("password hashing failed: {0}")]
    HashFailed(argon2::password_hash::Error),
    #[error("stored credential is not a valid PHC string: {0}")]
    MalformedHash(argon2::password_hash::Error),
}

const MIB: u32 = 1024;
const MEMORY_COST_KIB: u32 = 19 * MIB;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// A plaintext credential on its way to the hasher. Wiped on drop and never
/// printed.
#[derive(Clone, zeroize::Zeroize, zeroize::ZeroizeOnDrop)]
pub struct Plaintext(Zeroizing<String>);

impl Plaintext {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Plaintext(***)")
    }
}

fn hasher() -> Result<argon2::Argon2<'static>, PasswordError> {
    let params = argon2::Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(PasswordError::InvalidParams)?;
    Ok(argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a credential into a self-describing Argon2id PHC string
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) with a fresh random salt.
pub fn hash_password(plain: &Plaintext) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    let hash = hasher()?
        .hash_password(plain.as_str().as_bytes(), &salt)
        .map_err(PasswordError::HashFailed)?;
    Ok(hash.to_string())
}

/// Check `plain` against a stored PHC string. Parameters are read from the
/// string itself, so hashes made with older settings still verify.
pub fn verify_password(plain: &Plaintext, phc: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(phc).map_err(PasswordError::MalformedHash)?;
    match hasher()?.verify_password(plain.as_str().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::HashFailed(e)),
    }
}
