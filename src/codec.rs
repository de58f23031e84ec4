//! Chunked AEAD stream codec.
//!
//! [`encrypt_stream`] turns a plaintext reader into a lazy sequence of framed
//! chunks (`index || flag || ciphertext || tag`). [`decrypt_stream`] turns the
//! framed bytes back into plaintext chunks, verifying each one before it is
//! yielded. Neither side holds more than two chunks in memory.
//!
//! The decoder rejects:
//! - a chunk whose tag does not verify, or whose stored index is not the next
//!   expected one ([`AegisError::Authentication`]);
//! - input that ends before a final-flagged chunk ([`AegisError::Truncated`]);
//! - bytes after a full-size final chunk ([`AegisError::TrailingData`]);
//! - headers or bodies too short to be a chunk ([`AegisError::Format`]).
//!
//! The final chunk's length is not stored. When it is shorter than the chunk
//! size, bytes appended after it or cut from its end are read as part of its
//! body and surface as [`AegisError::Authentication`], not as `TrailingData`
//! or `Truncated`. Either way the stream is rejected.
//!
//! Both iterators stop after the first error.

use std::io::{self, Read};
use std::iter::FusedIterator;

use log::trace;
use zeroize::Zeroize;

use crate::crypto::StreamKey;
use crate::format::{ChunkFlag, ChunkHeader, FRAME_OVERHEAD, HEADER_LEN};
use crate::kdf::DerivedKey;
use crate::types::{AegisError, CHUNK_SIZE, TAG_LEN};

/// Start encrypting `reader` under `key`. Not restartable: one call per stream.
pub fn encrypt_stream<R: Read>(
    key: &DerivedKey,
    reader: R,
) -> Result<EncryptStream<R>, AegisError> {
    EncryptStream::with_chunk_size(key, reader, CHUNK_SIZE)
}

/// Start decrypting the chunk sequence read from `reader` under `key`.
pub fn decrypt_stream<R: Read>(
    key: &DerivedKey,
    reader: R,
) -> Result<DecryptStream<R>, AegisError> {
    DecryptStream::with_chunk_size(key, reader, CHUNK_SIZE)
}

/// Lazy sequence of encrypted frames. See [`encrypt_stream`].
pub struct EncryptStream<R> {
    reader: R,
    key: StreamKey,
    chunk_size: usize,
    current: Vec<u8>,
    lookahead: Vec<u8>,
    index: u64,
    primed: bool,
    done: bool,
}

impl<R: Read> EncryptStream<R> {
    pub(crate) fn with_chunk_size(
        key: &DerivedKey,
        reader: R,
        chunk_size: usize,
    ) -> Result<Self, AegisError> {
        debug_assert!(chunk_size > 0);
        Ok(Self {
            reader,
            key: StreamKey::new(key)?,
            chunk_size,
            current: Vec::with_capacity(chunk_size),
            lookahead: Vec::with_capacity(chunk_size),
            index: 0,
            primed: false,
            done: false,
        })
    }

    fn next_frame(&mut self) -> Result<Vec<u8>, AegisError> {
        if !self.primed {
            fill_chunk(&mut self.reader, &mut self.current, self.chunk_size)?;
            self.primed = true;
        }

        // A short chunk exhausted the reader. A full one is final only if nothing follows it.
        let flag = if self.current.len() < self.chunk_size {
            ChunkFlag::Final
        } else {
            fill_chunk(&mut self.reader, &mut self.lookahead, self.chunk_size)?;
            if self.lookahead.is_empty() {
                ChunkFlag::Final
            } else {
                ChunkFlag::More
            }
        };

        let header = ChunkHeader::new(self.index, flag);
        let mut frame = Vec::with_capacity(FRAME_OVERHEAD + self.current.len());
        frame.extend_from_slice(&header.encode());
        frame.extend_from_slice(&self.current);
        let tag = self.key.seal_in_place(&header, &mut frame[HEADER_LEN..])?;
        frame.extend_from_slice(&tag);
        trace!(
            "sealed chunk {} ({} bytes, {:?})",
            header.index,
            self.current.len(),
            flag
        );

        self.current.zeroize();
        std::mem::swap(&mut self.current, &mut self.lookahead);

        if flag.is_final() {
            self.done = true;
        } else {
            self.index = self
                .index
                .checked_add(1)
                .ok_or(AegisError::LimitExceeded)?;
        }
        Ok(frame)
    }
}

impl<R: Read> Iterator for EncryptStream<R> {
    type Item = Result<Vec<u8>, AegisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.next_frame();
        if res.is_err() {
            self.done = true;
        }
        Some(res)
    }
}

impl<R: Read> FusedIterator for EncryptStream<R> {}

impl<R> Drop for EncryptStream<R> {
    fn drop(&mut self) {
        self.current.zeroize();
        self.lookahead.zeroize();
    }
}

/// Lazy sequence of verified plaintext chunks. See [`decrypt_stream`].
pub struct DecryptStream<R> {
    reader: R,
    key: StreamKey,
    chunk_size: usize,
    index: u64,
    frame: Vec<u8>,
    done: bool,
}

impl<R: Read> DecryptStream<R> {
    pub(crate) fn with_chunk_size(
        key: &DerivedKey,
        reader: R,
        chunk_size: usize,
    ) -> Result<Self, AegisError> {
        debug_assert!(chunk_size > 0);
        Ok(Self {
            reader,
            key: StreamKey::new(key)?,
            chunk_size,
            index: 0,
            frame: Vec::with_capacity(chunk_size + TAG_LEN),
            done: false,
        })
    }

    fn next_chunk(&mut self) -> Result<Vec<u8>, AegisError> {
        let mut raw = [0u8; HEADER_LEN];
        match read_full(&mut self.reader, &mut raw)? {
            0 => return Err(AegisError::Truncated),
            HEADER_LEN => {}
            _ => return Err(AegisError::Format("incomplete chunk header")),
        }
        let header = ChunkHeader::decode(&raw)?;
        if header.index != self.index {
            return Err(AegisError::Authentication);
        }

        let body_max = self.chunk_size + TAG_LEN;
        self.frame.zeroize();
        self.frame.resize(body_max, 0);
        let n = read_full(&mut self.reader, &mut self.frame)?;
        self.frame.truncate(n);

        if n < TAG_LEN {
            return Err(AegisError::Format("incomplete chunk"));
        }
        if !header.flag.is_final() && n < body_max {
            return Err(AegisError::Truncated);
        }

        let ct_len = n - TAG_LEN;
        {
            let (ct, tag) = self.frame.split_at_mut(ct_len);
            self.key.open_in_place(&header, ct, tag)?;
        }

        if header.flag.is_final() {
            let mut probe = [0u8; 1];
            if read_full(&mut self.reader, &mut probe)? != 0 {
                return Err(AegisError::TrailingData);
            }
            self.done = true;
        } else {
            self.index = self
                .index
                .checked_add(1)
                .ok_or(AegisError::LimitExceeded)?;
        }
        trace!("opened chunk {} ({} bytes)", header.index, ct_len);

        let plaintext = self.frame[..ct_len].to_vec();
        self.frame.zeroize();
        Ok(plaintext)
    }
}

impl<R: Read> Iterator for DecryptStream<R> {
    type Item = Result<Vec<u8>, AegisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.next_chunk();
        if res.is_err() {
            self.done = true;
        }
        Some(res)
    }
}

impl<R: Read> FusedIterator for DecryptStream<R> {}

impl<R> Drop for DecryptStream<R> {
    fn drop(&mut self) {
        self.frame.zeroize();
    }
}

/// Read until `buf` is full or the reader is exhausted; returns bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn fill_chunk<R: Read>(reader: &mut R, buf: &mut Vec<u8>, chunk_size: usize) -> io::Result<()> {
    buf.clear();
    buf.resize(chunk_size, 0);
    let n = read_full(reader, buf)?;
    buf.truncate(n);
    Ok(())
}
