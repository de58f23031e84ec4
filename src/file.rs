//! File-level entry points and output-path helpers.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use secrecy::SecretString;
use tempfile::NamedTempFile;

use crate::streaming::{StreamStats, decrypt_reader, encrypt_reader};
use crate::types::AegisError;

/// Encrypt the file at `input` into `output` (created or truncated).
///
/// I/O errors name the offending path. On failure `output` is left as
/// written so far; deleting it is the caller's decision.
///
/// # Errors
///
/// - [`AegisError::File`] if `input` cannot be opened, `output` cannot be
///   created or synced, or both paths name the same file (`InvalidInput`;
///   nothing is written in that case).
/// - [`AegisError::Io`] if reading or writing fails midway.
/// - [`AegisError::Kdf`] if key derivation fails.
pub fn encrypt(input: &Path, output: &Path, password: &SecretString) -> Result<(), AegisError> {
    let (reader, mut writer) = open_pair(input, output)?;
    let stats = encrypt_reader(reader, &mut writer, password)?;
    finish(writer, output)?;
    log_done("encrypted", input, output, &stats);
    Ok(())
}

/// Decrypt the file at `input` into `output` (created or truncated).
///
/// Stops at the first chunk that fails verification. Anything already in
/// `output` at that point is untrusted.
///
/// # Errors
///
/// - [`AegisError::File`] / [`AegisError::Io`] as for [`encrypt`], including
///   the same-file check.
/// - [`AegisError::Authentication`] for a wrong password or a modified,
///   reordered or spliced chunk.
/// - [`AegisError::Truncated`], [`AegisError::TrailingData`] or
///   [`AegisError::Format`] for a stream that is cut short, extended or malformed.
pub fn decrypt(input: &Path, output: &Path, password: &SecretString) -> Result<(), AegisError> {
    let (reader, mut writer) = open_pair(input, output)?;
    let stats = decrypt_reader(reader, &mut writer, password)?;
    finish(writer, output)?;
    log_done("decrypted", input, output, &stats);
    Ok(())
}

/// `<input>.enc`
pub fn default_encrypt_output_path(input: &Path) -> PathBuf {
    with_suffix(input, ".enc")
}

/// `<input>.dec`
pub fn default_decrypt_output_path(input: &Path) -> PathBuf {
    with_suffix(input, ".dec")
}

/// Create a temp file in the directory that will hold `out`, so it can later be renamed onto it.
///
/// # Errors
///
/// Returns [`AegisError::File`] naming the parent directory if the temp file
/// cannot be created there.
pub fn tempfile_beside(out: &Path) -> Result<NamedTempFile, AegisError> {
    let parent = match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(parent).map_err(|e| AegisError::file(parent, e))
}

/// Atomically persist a tempfile to the target path, honoring the force overwrite policy.
///
/// Returns the final path on success.
///
/// # Errors
///
/// Returns [`AegisError::File`] if `out` exists and `force` is false
/// (`AlreadyExists`), or if removing the old file or renaming fails.
pub fn persist_tempfile_atomic(
    tmp: NamedTempFile,
    out: &Path,
    force: bool,
) -> Result<PathBuf, AegisError> {
    let tmp_path = tmp.into_temp_path();

    if out.exists() {
        if force {
            fs::remove_file(out).map_err(|e| AegisError::file(out, e))?;
        } else {
            return Err(AegisError::file(
                out,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "output exists; use --force to overwrite",
                ),
            ));
        }
    }

    tmp_path
        .persist(out)
        .map_err(|e| AegisError::file(out, e.error))?;
    Ok(out.to_path_buf())
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

type Reader<'a> = PathIo<'a, BufReader<File>>;
type Writer<'a> = PathIo<'a, BufWriter<File>>;

fn open_pair<'a>(
    input: &'a Path,
    output: &'a Path,
) -> Result<(Reader<'a>, Writer<'a>), AegisError> {
    let src = File::open(input).map_err(|e| AegisError::file(input, e))?;
    // Creating the output would truncate the input before it is read.
    if same_file(&src, input, output) {
        return Err(AegisError::file(
            output,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "input and output are the same file",
            ),
        ));
    }
    let dst = File::create(output).map_err(|e| AegisError::file(output, e))?;
    Ok((
        PathIo::new(BufReader::new(src), input),
        PathIo::new(BufWriter::new(dst), output),
    ))
}

/// `true` if `output` already exists and is the file opened as `src`, by path,
/// symlink or hard link. Anything that cannot be inspected is left for
/// `File::create` to report.
fn same_file(src: &File, input: &Path, output: &Path) -> bool {
    let Ok(out_meta) = fs::metadata(output) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let _ = input;
        src.metadata()
            .is_ok_and(|m| m.dev() == out_meta.dev() && m.ino() == out_meta.ino())
    }
    #[cfg(not(unix))]
    {
        let _ = (src, out_meta);
        match (fs::canonicalize(input), fs::canonicalize(output)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

fn finish(writer: Writer<'_>, output: &Path) -> Result<(), AegisError> {
    let file = writer
        .inner
        .into_inner()
        .map_err(|e| AegisError::file(output, e.into_error()))?;
    file.sync_all().map_err(|e| AegisError::file(output, e))
}

fn log_done(what: &str, input: &Path, output: &Path, stats: &StreamStats) {
    info!(
        "{what} {} -> {} ({} chunks, {} plaintext bytes)",
        input.display(),
        output.display(),
        stats.chunks,
        stats.plaintext_bytes
    );
}

/// Reader/writer adapter that names its file in every I/O error it returns.
struct PathIo<'a, T> {
    inner: T,
    path: &'a Path,
}

impl<'a, T> PathIo<'a, T> {
    fn new(inner: T, path: &'a Path) -> Self {
        Self { inner, path }
    }

    fn tag(&self, e: io::Error) -> io::Error {
        io::Error::new(e.kind(), format!("{}: {e}", self.path.display()))
    }
}

impl<T: Read> Read for PathIo<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| self.tag(e))
    }
}

impl<T: Write> Write for PathIo<'_, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.tag(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.tag(e))
    }
}
