//! Argon2id hashing for stored credentials.
//!
//! Parameters follow the OWASP recommendation (memory: 19 MiB,
//! iterations: 2, parallelism: 1). Salt is randomly generated per hash.
//! An optional pepper (server-side secret) is prepended to the secret.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::DbError;

fn argon2() -> Result<Argon2<'static>, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Corrupt(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn peppered(secret: &str, pepper: Option<&str>) -> Vec<u8> {
    match pepper {
        Some(p) => format!("{p}{secret}").into_bytes(),
        None => secret.as_bytes().to_vec(),
    }
}

/// Hash a secret into a PHC-format Argon2id string.
pub fn hash_secret(secret: &str, pepper: Option<&str>) -> Result<String, DbError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2()?
        .hash_password(&peppered(secret, pepper), &salt)
        .map_err(|e| DbError::Corrupt(format!("credential hash error: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a secret against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and an error only if the stored hash
/// is malformed.
pub fn verify_secret(secret: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Corrupt(format!("invalid credential hash: {e}")))?;

    match Argon2::default().verify_password(&peppered(secret, pepper), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Corrupt(format!("credential verify error: {e}"))),
    }
}
