#![forbid(unsafe_code)]

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use aegis::{
    AegisError, FailureKind, decrypt, default_decrypt_output_path, default_encrypt_output_path,
    encrypt, persist_tempfile_atomic, tempfile_beside,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use zeroize::Zeroize;

#[derive(Parser, Debug)]
#[command(
    name = "aegis",
    version,
    about = "A simple file encryption and decryption tool",
    long_about = "Encrypts and decrypts files with a password. Files are split into \
                  64 KiB chunks, each sealed with ChaCha20-Poly1305, so any size is \
                  handled in constant memory and any tampering, reordering or \
                  truncation is detected."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a file. Output defaults to <INPUT>.enc
    Encrypt(OpArgs),
    /// Decrypt a file. Output defaults to <INPUT>.dec
    Decrypt(OpArgs),
}

#[derive(Args, Debug)]
struct OpArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    output: Option<PathBuf>,

    /// Password (visible to other processes; prefer --password-file or the prompt)
    #[arg(short = 'p', long = "password", conflicts_with = "password_file")]
    password: Option<String>,

    /// Read the password from a file (trailing newline is trimmed)
    #[arg(long = "password-file")]
    password_file: Option<PathBuf>,

    /// Overwrite the output file if it already exists
    #[arg(short = 'f', long = "force")]
    force: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Encrypt(a) => run(a, Op::Encrypt),
        Command::Decrypt(a) => run(a, Op::Decrypt),
    }
}

#[derive(Clone, Copy)]
enum Op {
    Encrypt,
    Decrypt,
}

fn run(mut a: OpArgs, op: Op) -> Result<()> {
    let out = a.output.clone().unwrap_or_else(|| match op {
        Op::Encrypt => default_encrypt_output_path(&a.input),
        Op::Decrypt => default_decrypt_output_path(&a.input),
    });

    if out.exists() && !a.force {
        anyhow::bail!("output exists; use --force to overwrite");
    }

    let pw = read_password(&mut a)?;

    // Write next to the destination and rename on success, so a failed run leaves nothing behind.
    let tmp = tempfile_beside(&out)?;
    let res = match op {
        Op::Encrypt => encrypt(&a.input, tmp.path(), &pw),
        Op::Decrypt => decrypt(&a.input, tmp.path(), &pw),
    };
    res.map_err(explain)?;

    persist_tempfile_atomic(tmp, &out, a.force)?;

    match op {
        Op::Encrypt => eprintln!("File encrypted successfully! Output: {}", out.display()),
        Op::Decrypt => eprintln!("File decrypted successfully! Output: {}", out.display()),
    }
    Ok(())
}

fn explain(err: AegisError) -> anyhow::Error {
    let hint = if err.is_integrity_failure() {
        "wrong password or corrupted file"
    } else if err.kind() == FailureKind::Io {
        "file system error"
    } else {
        "internal error"
    };
    anyhow::Error::new(err).context(hint)
}

fn read_password(a: &mut OpArgs) -> Result<SecretString> {
    if let Some(pw) = a.password.take() {
        return Ok(SecretString::new(pw.into_boxed_str()));
    }
    if let Some(path) = &a.password_file {
        return read_password_file(path);
    }
    let pw = rpassword::prompt_password("Password: ").context("failed to read password")?;
    Ok(SecretString::new(pw.into_boxed_str()))
}

fn read_password_file(path: &Path) -> Result<SecretString> {
    let mut s = String::new();
    fs::File::open(path)
        .and_then(|mut f| f.read_to_string(&mut s))
        .with_context(|| format!("failed to read password file {}", path.display()))?;

    let secret = SecretString::new(
        s.trim_end_matches(&['\r', '\n'][..])
            .to_owned()
            .into_boxed_str(),
    );
    s.zeroize();
    Ok(secret)
}
