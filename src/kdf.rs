//! Password-based key derivation.
//!
//! A file key is derived from nothing but the password and the 16-byte salt
//! stored at the head of the file:
//!
//! 1. Argon2id (fixed parameters) hardens the password. Its PHC string
//!    (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`) is the intermediate,
//!    so the algorithm, version and parameters travel with the value that
//!    feeds the next step.
//! 2. PBKDF2-HMAC-BLAKE2b-512 over that string and the same salt stretches it
//!    into exactly [`KEY_LEN`] bytes.
//!
//! Parameters never vary per file. Given the same password and salt the output
//! is always the same key.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use blake2::Blake2b512;
use hmac::SimpleHmac;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::types::{
    ARGON2_MEM_KIB, ARGON2_PARALLELISM, ARGON2_T_COST, AegisError, KEY_LEN, PBKDF2_ROUNDS,
    SALT_LEN,
};

/// A 256-bit file key. Zeroized on drop; never printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes, e.g. for tests that bypass the password KDF.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the file key for `password` and `salt`.
///
/// The password may be empty. The salt length is fixed by its type.
///
/// # Errors
///
/// Returns [`AegisError::Kdf`] only if the underlying primitives reject the
/// built-in parameters, which does not happen for the constants shipped here.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<DerivedKey, AegisError> {
    let params = Params::new(
        ARGON2_MEM_KIB,
        ARGON2_T_COST,
        ARGON2_PARALLELISM,
        Some(KEY_LEN),
    )
    .map_err(|_| AegisError::Kdf("invalid Argon2id parameters"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let phc_salt =
        SaltString::encode_b64(salt).map_err(|_| AegisError::Kdf("salt not encodable"))?;
    let encoded = Zeroizing::new(
        argon2
            .hash_password(password, &phc_salt)
            .map_err(|_| AegisError::Kdf("Argon2id pre-hash failed"))?
            .to_string(),
    );

    let mut key = DerivedKey::from_bytes([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<SimpleHmac<Blake2b512>>(
        encoded.as_bytes(),
        salt,
        PBKDF2_ROUNDS,
        &mut key.bytes,
    )
    .map_err(|_| AegisError::Kdf("PBKDF2 output length rejected"))?;

    Ok(key)
}

/// Fresh salt from the operating system CSPRNG.
pub fn generate_salt() -> Result<[u8; SALT_LEN], AegisError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::fill(&mut salt)
        .map_err(|e| AegisError::Io(std::io::Error::other(format!("random source: {e}"))))?;
    Ok(salt)
}
