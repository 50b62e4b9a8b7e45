use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR error: {0}")]
    Cbor(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Octave not found at {path:?} after {waited_secs}s")]
    ExecutableNotFound { path: PathBuf, waited_secs: u64 },

    #[error("{0:?} does not look like an Octave executable")]
    NotOctave(PathBuf),

    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Octave failed converting {file} ({status}): {stderr}")]
    Octave {
        file: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("variable {name} not found in {path:?}")]
    MissingVariable { name: String, path: PathBuf },

    #[error("variable {name} is not a non-empty struct")]
    NotAStruct { name: String },

    #[error("field {field}: {reason}")]
    FieldShape { field: String, reason: String },
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, ConvError>;
