//! Streaming encryption and decryption over arbitrary readers and writers.
//!
//! Memory use is bounded by a couple of chunks regardless of input size.

use std::io::{Read, Write};

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::codec::{decrypt_stream, encrypt_stream, read_full};
use crate::format::FRAME_OVERHEAD;
use crate::kdf::{derive_key, generate_salt};
use crate::types::{AegisError, SALT_LEN};

/// Totals for one completed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks: u64,
    pub plaintext_bytes: u64,
    pub encrypted_bytes: u64,
}

/// Encrypt everything read from `reader` into `writer`: a fresh salt, then the chunk sequence.
///
/// Output is written as it is produced. On error the writer holds a partial,
/// undecryptable stream; removing it is up to the caller.
pub fn encrypt_reader<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    password: &SecretString,
) -> Result<StreamStats, AegisError> {
    let salt = generate_salt()?;
    writer.write_all(&salt)?;

    let key = derive_key(password.expose_secret().as_bytes(), &salt)?;
    debug!("file key derived, sealing chunks");

    let mut stats = StreamStats {
        encrypted_bytes: SALT_LEN as u64,
        ..Default::default()
    };
    for frame in encrypt_stream(&key, reader)? {
        let frame = frame?;
        writer.write_all(&frame)?;
        stats.chunks += 1;
        stats.plaintext_bytes += (frame.len() - FRAME_OVERHEAD) as u64;
        stats.encrypted_bytes += frame.len() as u64;
    }
    writer.flush()?;

    debug!(
        "sealed {} chunks ({} plaintext bytes)",
        stats.chunks, stats.plaintext_bytes
    );
    Ok(stats)
}

/// Decrypt a salt-prefixed chunk sequence from `reader` into `writer`.
///
/// Only authenticated plaintext is ever written. Writing stops at the first
/// failure; whatever was written before it must be treated as untrusted.
pub fn decrypt_reader<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    password: &SecretString,
) -> Result<StreamStats, AegisError> {
    let mut salt = [0u8; SALT_LEN];
    if read_full(&mut reader, &mut salt)? < SALT_LEN {
        return Err(AegisError::Format("input shorter than the salt"));
    }

    let key = derive_key(password.expose_secret().as_bytes(), &salt)?;
    debug!("file key derived, opening chunks");

    let mut stats = StreamStats {
        encrypted_bytes: SALT_LEN as u64,
        ..Default::default()
    };
    for chunk in decrypt_stream(&key, reader)? {
        let mut plaintext = match chunk {
            Ok(pt) => pt,
            Err(e) => {
                warn!(
                    "decryption stopped after {} verified chunks: {e}",
                    stats.chunks
                );
                return Err(e);
            }
        };
        writer.write_all(&plaintext)?;
        stats.chunks += 1;
        stats.plaintext_bytes += plaintext.len() as u64;
        stats.encrypted_bytes += (plaintext.len() + FRAME_OVERHEAD) as u64;
        plaintext.zeroize();
    }
    writer.flush()?;

    debug!(
        "opened {} chunks ({} plaintext bytes)",
        stats.chunks, stats.plaintext_bytes
    );
    Ok(stats)
}
