#![forbid(unsafe_code)]
//! # aegis: password-based streaming authenticated encryption for files.
//!
//! `aegis` encrypts files of any size with a password, in constant memory,
//! and detects any tampering on decryption: modified bytes, reordered or
//! dropped chunks, a cut-off tail, or data appended after the end.
//!
//! ## Format
//! An encrypted file is a 16-byte random salt followed by a sequence of
//! chunks. Each chunk is `index (8, BE) || flag (1) || ciphertext || tag (16)`;
//! exactly the last chunk carries flag `1`. Plaintext is cut into 64 KiB
//! chunks, and an empty file still yields one empty final chunk.
//!
//! ## Features
//! - **Key derivation**: Argon2id pre-hash, then PBKDF2-HMAC-BLAKE2b-512 (4096 rounds)
//! - **Chunked AEAD**: ChaCha20-Poly1305, index-bound nonces, `index || flag` associated data
//! - **Streaming**: reader/writer and file-path entry points, never buffering the whole file
//! - **Zeroization** of keys and plaintext buffers
//!
//! ## Example: Encrypt and decrypt a file
//! ```no_run
//! use aegis::{decrypt, encrypt};
//! use secrecy::SecretString;
//! use std::path::Path;
//!
//! let password = SecretString::new("mypassword".into());
//! encrypt(Path::new("notes.txt"), Path::new("notes.txt.enc"), &password).unwrap();
//! decrypt(Path::new("notes.txt.enc"), Path::new("notes.txt.dec"), &password).unwrap();
//! ```
//!
//! ## Example: Encrypt in memory
//! ```
//! use aegis::{decrypt_reader, encrypt_reader};
//! use secrecy::SecretString;
//!
//! let password = SecretString::new("pw".into());
//! let mut ciphertext = Vec::new();
//! encrypt_reader(&b"Hello, world!"[..], &mut ciphertext, &password).unwrap();
//!
//! let mut plaintext = Vec::new();
//! decrypt_reader(&ciphertext[..], &mut plaintext, &password).unwrap();
//! assert_eq!(plaintext, b"Hello, world!");
//! ```
//!
//! Safety notes
//! - The crate is not audited or reviewed!
//! - Protects data at rest. Does not defend against compromised hosts/side channels.

mod codec;
mod crypto;
mod file;
mod format;
mod kdf;
mod streaming;
mod types;

pub use codec::{DecryptStream, EncryptStream, decrypt_stream, encrypt_stream};
pub use file::{
    decrypt, default_decrypt_output_path, default_encrypt_output_path, encrypt,
    persist_tempfile_atomic, tempfile_beside,
};
pub use format::{ChunkFlag, ChunkHeader, FRAME_OVERHEAD, HEADER_LEN, chunk_count, encrypted_len};
pub use kdf::{DerivedKey, derive_key, generate_salt};
pub use streaming::{StreamStats, decrypt_reader, encrypt_reader};
pub use types::*;
