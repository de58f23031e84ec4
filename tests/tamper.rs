//! Tamper, reorder, truncation and trailing-data detection on the chunk codec.

use aegis::{
    AegisError, CHUNK_SIZE, DerivedKey, FRAME_OVERHEAD, KEY_LEN, TAG_LEN, decrypt_stream,
    encrypt_stream,
};

const FULL_FRAME: usize = FRAME_OVERHEAD + CHUNK_SIZE;

fn key() -> DerivedKey {
    DerivedKey::from_bytes([0x42; KEY_LEN])
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn seal(data: &[u8]) -> Vec<u8> {
    encrypt_stream(&key(), data)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .concat()
}

fn open(ct: &[u8]) -> Result<Vec<u8>, AegisError> {
    Ok(decrypt_stream(&key(), ct)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()?
        .concat())
}

/// 2 full chunks + a 100-byte final chunk.
fn three_chunks() -> (Vec<u8>, Vec<u8>) {
    let data = pattern(2 * CHUNK_SIZE + 100);
    let ct = seal(&data);
    assert_eq!(ct.len(), 3 * FRAME_OVERHEAD + data.len());
    (data, ct)
}

#[test]
fn intact_stream_round_trips() {
    let (data, ct) = three_chunks();
    assert_eq!(open(&ct).unwrap(), data);
}

#[test]
fn bit_flips_in_ciphertext_and_tag_fail_authentication() {
    let (_, ct) = three_chunks();
    let starts = [0, FULL_FRAME, 2 * FULL_FRAME];

    for (i, &start) in starts.iter().enumerate() {
        let end = if i == 2 { ct.len() } else { start + FULL_FRAME };
        let body = start + 9;
        // first/last ciphertext byte, middle, and every byte of the tag
        let mut positions = vec![body, (body + end - TAG_LEN) / 2, end - TAG_LEN - 1];
        positions.extend(end - TAG_LEN..end);

        for pos in positions {
            for bit in [0, 3, 7] {
                let mut bad = ct.clone();
                bad[pos] ^= 1 << bit;
                assert!(
                    matches!(open(&bad), Err(AegisError::Authentication)),
                    "chunk {i}, byte {pos}, bit {bit} not rejected"
                );
            }
        }
    }
}

#[test]
fn flipping_index_or_flag_never_succeeds() {
    let (_, ct) = three_chunks();
    for pos in [0, 7, 8, FULL_FRAME + 7, FULL_FRAME + 8, 2 * FULL_FRAME + 8] {
        let mut bad = ct.clone();
        bad[pos] ^= 1;
        assert!(open(&bad).is_err(), "header byte {pos} flip accepted");
    }
}

#[test]
fn swapping_two_chunks_fails_authentication() {
    let data = pattern(3 * CHUNK_SIZE);
    let ct = seal(&data);

    let mut swapped = ct.clone();
    swapped[..FULL_FRAME].copy_from_slice(&ct[FULL_FRAME..2 * FULL_FRAME]);
    swapped[FULL_FRAME..2 * FULL_FRAME].copy_from_slice(&ct[..FULL_FRAME]);

    assert!(matches!(open(&swapped), Err(AegisError::Authentication)));
}

#[test]
fn removing_the_tail_never_yields_truncated_plaintext() {
    let (_, ct) = three_chunks();

    // Whole chunks dropped: only a final flag can end a stream.
    for cut in [FULL_FRAME, 2 * FULL_FRAME] {
        assert!(matches!(open(&ct[..cut]), Err(AegisError::Truncated)));
    }
    // Inside a header or short of a tag.
    for cut in [FULL_FRAME + 3, 2 * FULL_FRAME + 9 + 5] {
        assert!(matches!(open(&ct[..cut]), Err(AegisError::Format(_))));
    }
    // Inside an intermediate chunk body.
    assert!(matches!(
        open(&ct[..FULL_FRAME - 10]),
        Err(AegisError::Truncated)
    ));
    // Any cut at all fails.
    for cut in (0..ct.len()).step_by(4099) {
        assert!(open(&ct[..cut]).is_err(), "cut at {cut} accepted");
    }
    for trim in 1..=20 {
        assert!(open(&ct[..ct.len() - trim]).is_err(), "trim {trim} accepted");
    }
}

#[test]
fn data_after_the_final_chunk_is_rejected() {
    let data = pattern(CHUNK_SIZE);
    let mut ct = seal(&data);
    ct.extend_from_slice(&[0u8; 3]);
    assert!(matches!(open(&ct), Err(AegisError::TrailingData)));

    let (_, mut ct) = three_chunks();
    ct.extend_from_slice(b"appended");
    assert!(open(&ct).is_err());
}

#[test]
fn decryption_yields_nothing_past_a_bad_chunk() {
    let (data, mut ct) = three_chunks();
    ct[FULL_FRAME + 100] ^= 0x80;

    let mut dec = decrypt_stream(&key(), &ct[..]).unwrap();
    assert_eq!(dec.next().unwrap().unwrap(), data[..CHUNK_SIZE]);
    assert!(matches!(dec.next(), Some(Err(AegisError::Authentication))));
    assert!(dec.next().is_none());
}
