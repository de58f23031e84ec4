//! Per-chunk AEAD primitives.
//!
//! The file key is expanded with HKDF-SHA256 into a ChaCha20-Poly1305 chunk key
//! and a 12-byte nonce base. Chunk `i` is sealed under the nonce base with its
//! low 8 bytes XORed with `i` (big-endian), and authenticated together with its
//! encoded `index || flag` header.

use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce, Tag};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::format::ChunkHeader;
use crate::kdf::DerivedKey;
use crate::types::{AegisError, KDF_SCHEME_ID, KEY_LEN, NONCE_LEN, TAG_LEN};

const STREAM_INFO: &[u8] = b"aegis chunk stream v";

/// Cipher state for one encrypted stream.
pub struct StreamKey {
    cipher: ChaCha20Poly1305,
    nonce_base: [u8; NONCE_LEN],
}

impl StreamKey {
    pub fn new(key: &DerivedKey) -> Result<Self, AegisError> {
        let hk = Hkdf::<Sha256>::new(None, key.as_bytes());

        let mut info = [0u8; STREAM_INFO.len() + 1];
        info[..STREAM_INFO.len()].copy_from_slice(STREAM_INFO);
        info[STREAM_INFO.len()] = KDF_SCHEME_ID;

        let mut okm = Zeroizing::new([0u8; KEY_LEN + NONCE_LEN]);
        hk.expand(&info, &mut okm[..])
            .map_err(|_| AegisError::Kdf("HKDF output length rejected"))?;

        let cipher = ChaCha20Poly1305::new_from_slice(&okm[..KEY_LEN])
            .map_err(|_| AegisError::Kdf("chunk key length rejected"))?;
        let mut nonce_base = [0u8; NONCE_LEN];
        nonce_base.copy_from_slice(&okm[KEY_LEN..]);

        Ok(Self { cipher, nonce_base })
    }

    /// Nonce for chunk `index`.
    pub fn nonce(&self, index: u64) -> [u8; NONCE_LEN] {
        let mut nonce = self.nonce_base;
        for (n, i) in nonce[NONCE_LEN - 8..].iter_mut().zip(index.to_be_bytes()) {
            *n ^= i;
        }
        nonce
    }

    /// Encrypt `buf` in place and return the detached tag.
    pub fn seal_in_place(
        &self,
        header: &ChunkHeader,
        buf: &mut [u8],
    ) -> Result<[u8; TAG_LEN], AegisError> {
        let nonce = self.nonce(header.index);
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), &header.encode(), buf)
            .map_err(|_| AegisError::LimitExceeded)?;

        let mut out = [0u8; TAG_LEN];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Verify `tag` and decrypt `buf` in place. On failure `buf` must be discarded.
    pub fn open_in_place(
        &self,
        header: &ChunkHeader,
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<(), AegisError> {
        if tag.len() != TAG_LEN {
            return Err(AegisError::Format("incomplete authentication tag"));
        }
        let nonce = self.nonce(header.index);
        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce),
                &header.encode(),
                buf,
                Tag::from_slice(tag),
            )
            .map_err(|_| AegisError::Authentication)
    }
}

impl Drop for StreamKey {
    fn drop(&mut self) {
        self.nonce_base.zeroize();
    }
}
