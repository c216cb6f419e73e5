// src/signing.rs

//! Release signing
//!
//! A signed distribution carries two signatures of the same Release text:
//! `InRelease` (clear-signed) and `Release.gpg` (detached, ASCII-armored).
//! Signing is delegated to a [`Signer`]; [`GpgSigner`] shells out to GnuPG.

use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Default time allowed for one signing invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Signing errors, split by which signature was being produced
#[derive(Error, Debug)]
pub enum SignError {
    #[error("generate InRelease: {0}")]
    ClearSign(#[source] SignFailure),

    #[error("generate Release.gpg: {0}")]
    DetachSign(#[source] SignFailure),
}

/// Why a signing invocation failed
#[derive(Error, Debug)]
pub enum SignFailure {
    #[error("failed to run {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("{program} {status}")]
    Exit { program: String, status: String },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("{program}: {source}")]
    Io { program: String, source: io::Error },

    #[error("{0}")]
    Other(String),
}

/// The two signed forms of a Release file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRelease {
    /// `InRelease` content
    pub clearsigned: Vec<u8>,
    /// `Release.gpg` content
    pub detached: Vec<u8>,
}

/// Produces OpenPGP signatures over Release data
pub trait Signer: Send + Sync {
    /// Clear-sign `data`, embedding it in the output
    fn clear_sign(&self, data: &[u8]) -> Result<Vec<u8>, SignFailure>;

    /// Produce an armored detached signature of `data`
    fn detach_sign(&self, data: &[u8]) -> Result<Vec<u8>, SignFailure>;

    /// Produce both signatures
    fn sign(&self, data: &[u8]) -> Result<SignedRelease, SignError> {
        let clearsigned = self.clear_sign(data).map_err(SignError::ClearSign)?;
        let detached = self.detach_sign(data).map_err(SignError::DetachSign)?;
        Ok(SignedRelease {
            clearsigned,
            detached,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignMode {
    Clear,
    Detach,
}

impl SignMode {
    fn flag(self) -> &'static str {
        match self {
            Self::Clear => "--clear-sign",
            Self::Detach => "--detach-sign",
        }
    }
}

impl fmt::Display for SignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag().trim_start_matches('-'))
    }
}

/// Signs with a GnuPG secret key
#[derive(Debug, Clone)]
pub struct GpgSigner {
    program: String,
    key_id: String,
    timeout: Duration,
}

impl GpgSigner {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            program: "gpg".to_string(),
            key_id: key_id.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different gpg-compatible executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn args(&self, mode: SignMode) -> [String; 4] {
        // The trailing "!" pins the exact (sub)key instead of letting gpg pick
        [
            "-a".to_string(),
            "-u".to_string(),
            format!("{}!", self.key_id),
            mode.flag().to_string(),
        ]
    }

    fn run(&self, mode: SignMode, data: &[u8]) -> Result<Vec<u8>, SignFailure> {
        let io_err = |source| SignFailure::Io {
            program: self.program.clone(),
            source,
        };

        debug!("Running {} {} with key {}", self.program, mode, self.key_id);
        let mut child = Command::new(&self.program)
            .args(self.args(mode))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SignFailure::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin and drain stdout on their own threads so neither pipe
        // can fill up while we wait.
        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io_err(io::Error::other("stdio pipes not captured")));
        };
        let input = data.to_vec();
        let writer = thread::spawn(move || stdin.write_all(&input));
        let reader = thread::spawn(move || {
            let mut output = Vec::new();
            stdout.read_to_end(&mut output).map(|_| output)
        });

        let status = match child.wait_timeout(self.timeout).map_err(io_err)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SignFailure::Timeout {
                    program: self.program.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
        };
        if !status.success() {
            return Err(SignFailure::Exit {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        let panicked = || io::Error::other("pipe thread panicked");
        writer.join().map_err(|_| io_err(panicked()))?.map_err(io_err)?;
        let output = reader.join().map_err(|_| io_err(panicked()))?.map_err(io_err)?;
        Ok(output)
    }
}

impl Signer for GpgSigner {
    fn clear_sign(&self, data: &[u8]) -> Result<Vec<u8>, SignFailure> {
        info!("Clear-signing Release with key {}", self.key_id);
        self.run(SignMode::Clear, data)
    }

    fn detach_sign(&self, data: &[u8]) -> Result<Vec<u8>, SignFailure> {
        info!("Detach-signing Release with key {}", self.key_id);
        self.run(SignMode::Detach, data)
    }
}
