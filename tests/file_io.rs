//! File-level roundtrips and the on-disk layout of real encrypted files.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use aegis::{
    AegisError, CHUNK_SIZE, ChunkFlag, ChunkHeader, FRAME_OVERHEAD, HEADER_LEN, SALT_LEN,
    decrypt, encrypt, encrypted_len,
};
use secrecy::SecretString;
use tempfile::tempdir;

fn write_blob(path: &Path, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    for (i, b) in data.iter_mut().enumerate() {
        *b = (i as u32).wrapping_mul(1664525).wrapping_add(1013904223) as u8;
    }
    fs::File::create(path).unwrap().write_all(&data).unwrap();
    data
}

fn slurp(path: &Path) -> Vec<u8> {
    let mut v = Vec::new();
    fs::File::open(path).unwrap().read_to_end(&mut v).unwrap();
    v
}

fn header_at(ct: &[u8], pos: usize) -> ChunkHeader {
    let raw: [u8; HEADER_LEN] = ct[pos..pos + HEADER_LEN].try_into().unwrap();
    ChunkHeader::decode(&raw).unwrap()
}

#[test]
fn empty_file_is_25_bytes_and_decrypts_to_empty() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.bin");
    let enc = dir.path().join("empty.bin.enc");
    let back = dir.path().join("empty.bin.dec");
    write_blob(&input, 0);

    let pw = SecretString::new("x".into());
    encrypt(&input, &enc, &pw).unwrap();

    let ct = slurp(&enc);
    assert_eq!(ct.len(), 16 + 8 + 1 + 16);
    assert_eq!(header_at(&ct, SALT_LEN), ChunkHeader::new(0, ChunkFlag::Final));

    decrypt(&enc, &back, &pw).unwrap();
    assert!(slurp(&back).is_empty());
}

#[test]
fn file_of_150000_bytes_is_three_chunks() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let enc = dir.path().join("out.enc");
    let back = dir.path().join("back.bin");
    let data = write_blob(&input, 150_000);

    let pw = SecretString::new("pw".into());
    encrypt(&input, &enc, &pw).unwrap();

    let ct = slurp(&enc);
    assert_eq!(ct.len() as u64, encrypted_len(150_000));

    let full = FRAME_OVERHEAD + CHUNK_SIZE;
    assert_eq!(header_at(&ct, SALT_LEN), ChunkHeader::new(0, ChunkFlag::More));
    assert_eq!(
        header_at(&ct, SALT_LEN + full),
        ChunkHeader::new(1, ChunkFlag::More)
    );
    assert_eq!(
        header_at(&ct, SALT_LEN + 2 * full),
        ChunkHeader::new(2, ChunkFlag::Final)
    );
    let last_body = ct.len() - (SALT_LEN + 2 * full) - FRAME_OVERHEAD;
    assert_eq!(last_body, 18_928);

    decrypt(&enc, &back, &pw).unwrap();
    assert_eq!(slurp(&back), data);
}

#[test]
fn exact_chunk_multiple_round_trips() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let enc = dir.path().join("out.enc");
    let back = dir.path().join("back.bin");
    let data = write_blob(&input, 2 * CHUNK_SIZE);

    let pw = SecretString::new("pw".into());
    encrypt(&input, &enc, &pw).unwrap();

    let ct = slurp(&enc);
    assert_eq!(ct.len() as u64, encrypted_len(data.len() as u64));
    assert_eq!(
        header_at(&ct, SALT_LEN + FRAME_OVERHEAD + CHUNK_SIZE),
        ChunkHeader::new(1, ChunkFlag::Final)
    );

    decrypt(&enc, &back, &pw).unwrap();
    assert_eq!(slurp(&back), data);
}

#[test]
fn each_encryption_uses_a_fresh_salt() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let a = dir.path().join("a.enc");
    let b = dir.path().join("b.enc");
    write_blob(&input, 1000);

    let pw = SecretString::new("same".into());
    encrypt(&input, &a, &pw).unwrap();
    encrypt(&input, &b, &pw).unwrap();

    let (a, b) = (slurp(&a), slurp(&b));
    assert_ne!(a[..SALT_LEN], b[..SALT_LEN]);
    assert_ne!(a[SALT_LEN..], b[SALT_LEN..]);
}

#[test]
fn wrong_password_is_an_authentication_failure() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let enc = dir.path().join("out.enc");
    let back = dir.path().join("back.bin");
    write_blob(&input, 3 * CHUNK_SIZE);

    encrypt(&input, &enc, &SecretString::new("right".into())).unwrap();
    let err = decrypt(&enc, &back, &SecretString::new("wrong".into())).unwrap_err();

    assert!(matches!(err, AegisError::Authentication));
    assert!(err.is_integrity_failure());
    assert!(slurp(&back).is_empty(), "nothing unverified may reach the output");
}

#[test]
fn empty_password_is_supported() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let enc = dir.path().join("out.enc");
    let back = dir.path().join("back.bin");
    let data = write_blob(&input, 77);

    let pw = SecretString::new("".into());
    encrypt(&input, &enc, &pw).unwrap();
    decrypt(&enc, &back, &pw).unwrap();
    assert_eq!(slurp(&back), data);
}

#[test]
fn file_shorter_than_salt_is_a_format_error() {
    let dir = tempdir().unwrap();
    let enc = dir.path().join("tiny.enc");
    let back = dir.path().join("back.bin");
    fs::write(&enc, [0u8; 5]).unwrap();

    let err = decrypt(&enc, &back, &SecretString::new("pw".into())).unwrap_err();
    assert!(matches!(err, AegisError::Format(_)));
}

#[test]
fn unwritable_output_is_an_io_error_with_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    write_blob(&input, 10);
    let out = dir.path().join("no/such/dir/out.enc");

    let err = encrypt(&input, &out, &SecretString::new("pw".into())).unwrap_err();
    assert!(!err.is_integrity_failure());
    assert!(err.to_string().contains("out.enc"), "{err}");
}
