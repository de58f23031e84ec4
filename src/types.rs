//! Core constants and the error type for aegis.

use std::path::PathBuf;
use thiserror::Error;

/// Length of the per-file random salt stored at offset 0 of every encrypted file.
pub const SALT_LEN: usize = 16;

/// Length of the derived symmetric key (ChaCha20-Poly1305 key size).
pub const KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 nonce length.
pub const NONCE_LEN: usize = 12;

/// AEAD authentication tag length.
pub const TAG_LEN: usize = 16;

/// Plaintext bytes per chunk (64 KiB). The final chunk may be shorter.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// PBKDF2 rounds applied after the Argon2id pre-hash.
pub const PBKDF2_ROUNDS: u32 = 4096;

/// Argon2id pre-hash memory cost in KiB.
pub const ARGON2_MEM_KIB: u32 = 19 * 1024;

/// Argon2id pre-hash time cost.
pub const ARGON2_T_COST: u32 = 2;

/// Argon2id pre-hash lanes.
pub const ARGON2_PARALLELISM: u32 = 1;

/// Identifier of the key-derivation scheme this build reads and writes.
///
/// Scheme 1 is Argon2id (fixed parameters above, PHC-encoded) followed by
/// PBKDF2-HMAC-BLAKE2b-512. The identifier is bound into the stream subkey,
/// so a file produced under a different scheme fails authentication on its
/// first chunk instead of decrypting to garbage.
pub const KDF_SCHEME_ID: u8 = 1;

/// Coarse classification of an [`AegisError`], for callers deciding what to tell a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// File system or stream I/O failed.
    Io,
    /// The input is not shaped like an encrypted stream.
    Format,
    /// A chunk failed to authenticate: wrong password, tampering or reordering.
    Authentication,
    /// The stream ended before its final chunk.
    Truncation,
    /// Bytes follow the final chunk.
    TrailingData,
    /// A limit or internal invariant was hit.
    Internal,
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum AegisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed input: {0}")]
    Format(&'static str),
    #[error("authentication failed (wrong password or corrupted data)")]
    Authentication,
    #[error("stream truncated before its final chunk")]
    Truncated,
    #[error("unexpected data after the final chunk")]
    TrailingData,
    #[error("stream exceeds the maximum number of chunks")]
    LimitExceeded,
    #[error("key derivation failed: {0}")]
    Kdf(&'static str),
}

impl AegisError {
    /// Attach a path to an I/O error from opening, creating or syncing a named file.
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AegisError::File {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AegisError::Io(_) | AegisError::File { .. } => FailureKind::Io,
            AegisError::Format(_) => FailureKind::Format,
            AegisError::Authentication => FailureKind::Authentication,
            AegisError::Truncated => FailureKind::Truncation,
            AegisError::TrailingData => FailureKind::TrailingData,
            AegisError::LimitExceeded | AegisError::Kdf(_) => FailureKind::Internal,
        }
    }

    /// `true` when the input itself is at fault (wrong password or a corrupted,
    /// truncated or extended file), as opposed to the file system.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::Format
                | FailureKind::Authentication
                | FailureKind::Truncation
                | FailureKind::TrailingData
        )
    }
}
