//! Error types for harmonia

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarmoniaError {
    #[error("Unknown pitch name: {0}")]
    LookupFailure(String),
    #[error("Unsupported chord quality: {0}")]
    UnsupportedQuality(String),
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Inversion {0} voices notes outside the playable range")]
    InversionOutOfRange(u32),
    #[error("Invalid note: {0}")]
    InvalidNote(String),
    #[error("Tempo must be a positive BPM value, got {0}")]
    InvalidTempo(u32),
    #[error("Progression has no chords")]
    EmptyProgression,
    #[error("Progression name must not be empty")]
    InvalidName,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarmoniaError>;
