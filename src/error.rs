//! Error types for hub-compress

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("empty input")]
    EmptyInput,

    #[error("input of {size} bytes exceeds the configured limit of {limit} bytes")]
    InputTooLarge { size: u64, limit: u64 },

    #[error("cannot read input {}: {source}", .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output {}: {source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a HUB1 container (magic {found:02x?})")]
    BadMagic { found: Vec<u8> },

    #[error("truncated container: missing {0}")]
    Truncated(&'static str),

    #[error("invalid container header: {0}")]
    InvalidHeader(String),

    #[error("decompression size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("bit count mismatch: {recorded} bits recorded for {payload_bytes} payload bytes")]
    BitCountMismatch { recorded: u64, payload_bytes: u64 },

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`CompressError`], matching the failure
/// categories a caller reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Format,
    Integrity,
    Output,
    Config,
}

impl CompressError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompressError::EmptyInput
            | CompressError::InputTooLarge { .. }
            | CompressError::ReadInput { .. } => ErrorKind::Input,
            CompressError::BadMagic { .. }
            | CompressError::Truncated(_)
            | CompressError::InvalidHeader(_) => ErrorKind::Format,
            CompressError::SizeMismatch { .. }
            | CompressError::BitCountMismatch { .. }
            | CompressError::CorruptPayload(_) => ErrorKind::Integrity,
            CompressError::WriteOutput { .. } | CompressError::IoError(_) => ErrorKind::Output,
            CompressError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_integrity(&self) -> bool {
        self.kind() == ErrorKind::Integrity
    }
}

/// A specialized Result type for hub-compress operations.
pub type Result<T> = std::result::Result<T, CompressError>;
