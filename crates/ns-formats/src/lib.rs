//! File formats for nodesynth.
//!
//! Saves and loads project documents (JSON), decodes WAV files into sample
//! assets and encodes rendered blocks as WAV.

mod project;
mod wav_format;

use thiserror::Error;

pub use project::{load_project, project_to_json, read_project, save_project};
pub use wav_format::{blocks_to_wav, decode_wav, load_wav, read_wav_file, write_wav};

/// Error type for WAV parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Missing RIFF/WAVE magic or a required chunk
    #[error("invalid header")]
    InvalidHeader,
    /// File shorter than its header
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Well-formed but not something the engine can play
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// Error type for project I/O.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("project json: {0}")]
    Json(#[from] serde_json::Error),
    /// Top level is not an array of entries
    #[error("project document must be an array of entries")]
    NotAnArray,
}
