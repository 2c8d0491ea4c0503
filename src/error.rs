//! Error types for process sampling.
//!
//! A per-process read yields a [`ReadError`]. Two of its kinds, access denied
//! and vanished, are recognized as skips by the sampler; every other kind is
//! escalated to a [`SampleError`] and aborts the pass.

use std::io;
use thiserror::Error;

use crate::sampler::SkipReason;

/// Failure to read one attribute of one process.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The caller lacks permission to inspect the process.
    #[error("access denied")]
    AccessDenied,

    /// The process exited between enumeration and inspection.
    #[error("process vanished")]
    Vanished,

    /// The OS returned data that could not be parsed.
    #[error("malformed {what} for pid {pid}")]
    Malformed { pid: u32, what: &'static str },

    /// Any other I/O failure.
    #[error("i/o error for pid {pid}: {source}")]
    Io {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl ReadError {
    /// Classifies an I/O error raised while reading `/proc/<pid>/...`.
    ///
    /// `ENOENT` and `ESRCH` mean the process is gone, `EACCES` and `EPERM`
    /// mean it is not ours to look at.
    pub fn from_io(pid: u32, err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOENT) | Some(libc::ESRCH) => ReadError::Vanished,
            Some(libc::EACCES) | Some(libc::EPERM) => ReadError::AccessDenied,
            _ => match err.kind() {
                io::ErrorKind::NotFound => ReadError::Vanished,
                io::ErrorKind::PermissionDenied => ReadError::AccessDenied,
                _ => ReadError::Io { pid, source: err },
            },
        }
    }

    /// Returns the skip reason if this error is one the sampler tolerates.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            ReadError::AccessDenied => Some(SkipReason::AccessDenied),
            ReadError::Vanished => Some(SkipReason::Vanished),
            _ => None,
        }
    }
}

/// Failure of a whole sampling pass.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The process table itself could not be listed.
    #[error("failed to enumerate processes: {0}")]
    Enumerate(#[source] io::Error),

    /// A process read failed in a way that is not a recognized skip.
    #[error("failed to sample pid {pid}: {source}")]
    Read {
        pid: u32,
        #[source]
        source: ReadError,
    },
}

/// Failure to load or validate configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
