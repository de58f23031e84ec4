//! On-disk layout.
//!
//! ```text
//! offset 0   salt                16 bytes
//! offset 16  chunk 0, chunk 1, ... chunk n-1, each:
//!              index             8 bytes, big-endian u64
//!              flag              1 byte, 0 = more follow, 1 = final
//!              ciphertext        N bytes, N = plaintext length <= CHUNK_SIZE
//!              tag               16 bytes
//! ```
//!
//! The 9-byte `index || flag` header doubles as the chunk's associated data.

use crate::types::{AegisError, CHUNK_SIZE, SALT_LEN, TAG_LEN};

/// Length of `index || flag`.
pub const HEADER_LEN: usize = 9;

/// Per-chunk bytes that are not ciphertext.
pub const FRAME_OVERHEAD: usize = HEADER_LEN + TAG_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFlag {
    More = 0,
    Final = 1,
}

impl ChunkFlag {
    pub fn from_byte(b: u8) -> Result<Self, AegisError> {
        match b {
            0 => Ok(ChunkFlag::More),
            1 => Ok(ChunkFlag::Final),
            _ => Err(AegisError::Format("invalid chunk flag")),
        }
    }

    pub fn is_final(self) -> bool {
        self == ChunkFlag::Final
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub index: u64,
    pub flag: ChunkFlag,
}

impl ChunkHeader {
    pub fn new(index: u64, flag: ChunkFlag) -> Self {
        Self { index, flag }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..8].copy_from_slice(&self.index.to_be_bytes());
        out[8] = self.flag as u8;
        out
    }

    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, AegisError> {
        let mut index = [0u8; 8];
        index.copy_from_slice(&bytes[..8]);
        Ok(Self {
            index: u64::from_be_bytes(index),
            flag: ChunkFlag::from_byte(bytes[8])?,
        })
    }
}

/// Number of chunks a plaintext of `plaintext_len` bytes is split into.
/// Empty input still produces one (empty, final) chunk.
pub fn chunk_count(plaintext_len: u64, chunk_size: usize) -> u64 {
    plaintext_len.div_ceil(chunk_size as u64).max(1)
}

/// Exact size of the encrypted file for a plaintext of `plaintext_len` bytes.
pub fn encrypted_len(plaintext_len: u64) -> u64 {
    SALT_LEN as u64
        + chunk_count(plaintext_len, CHUNK_SIZE) * FRAME_OVERHEAD as u64
        + plaintext_len
}
