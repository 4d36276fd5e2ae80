//! Error types for the voice-cloning pipeline.

use std::path::PathBuf;

/// Every failure the pipeline can surface to a caller.
///
/// Per-file problems during training (a clip that does not decode, a clip
/// shorter than one second) are recovered locally and never reach this type;
/// what remains here aborts the current operation and is reported to the
/// caller, never the process.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("cannot decode {path}: {reason}")]
    AudioDecode { path: PathBuf, reason: String },

    #[error("{0} is not a usable audio sample")]
    InvalidAudioFile(PathBuf),

    #[error("none of the {0} candidate files is a usable audio sample")]
    NoValidAudioFiles(usize),

    #[error("audio combination produced no data")]
    Combination,

    #[error("no voice model named '{0}'")]
    ModelNotFound(String),

    #[error("stored model '{name}' is corrupt: {reason}")]
    ModelCorrupt { name: String, reason: String },

    #[error("no voice model loaded; train or load one first")]
    NoModelLoaded,

    #[error("a {0} run is already in progress")]
    AlreadyInProgress(&'static str),

    #[error("invalid model name '{0}': use letters, digits and underscores, at most 50 characters")]
    InvalidModelName(String),

    #[error("the zonos TTS engine is not installed")]
    DependencyUnavailable,

    #[error("{backend} backend failed: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },

    #[error("background worker terminated without reporting a result")]
    WorkerLost,
}
