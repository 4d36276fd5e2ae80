//! Speech synthesis backends.
//!
//! A backend owns the two voice-specific computations: deriving a speaker
//! embedding from combined training audio, and turning text plus an
//! embedding into a waveform.
//!
//! # Available Backends
//!
//! - [`zonos`] wraps the external `zonos` TTS engine when it is installed
//! - [`placeholder`] is a deterministic stand-in used when the engine is absent
//!   and in tests

pub mod placeholder;
pub mod zonos;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::VoiceError;
use crate::Waveform;

pub use placeholder::PlaceholderBackend;
pub use zonos::ZonosBackend;

/// Length of the speaker embedding vector produced by the pipeline.
pub const EMBEDDING_DIM: usize = 256;

/// A fixed-length numeric signature of a trained voice.
///
/// Opaque outside the backend: callers persist it and hand it back for
/// synthesis, nothing more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerEmbedding(Vec<f32>);

impl SpeakerEmbedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Common interface for voice-cloning backends.
///
/// Implementations must be thread-safe: the manager calls them from
/// background worker threads.
pub trait TtsBackend: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Derive a speaker embedding from combined training audio.
    fn extract_embedding(&self, audio: &Waveform) -> Result<SpeakerEmbedding, VoiceError>;

    /// Synthesize speech for `text` in the voice described by `embedding`.
    ///
    /// Empty text yields a zero-duration waveform, not an error.
    fn synthesize(&self, text: &str, embedding: &SpeakerEmbedding)
        -> Result<Waveform, VoiceError>;
}

/// Which backend a [`crate::VoiceManager`] should be built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Probe for the zonos engine once; fall back to the placeholder.
    #[default]
    Auto,
    /// Always the deterministic placeholder.
    Placeholder,
    /// Require the zonos engine; fail if it is not installed.
    Zonos,
}

/// Resolve a [`BackendKind`] to a concrete backend. Called once at manager
/// construction; the choice is fixed for the manager's lifetime.
pub fn select(kind: BackendKind) -> Result<Arc<dyn TtsBackend>, VoiceError> {
    match kind {
        BackendKind::Placeholder => Ok(Arc::new(PlaceholderBackend::new())),
        BackendKind::Zonos => {
            if zonos::is_installed() {
                Ok(Arc::new(ZonosBackend::new()))
            } else {
                Err(VoiceError::DependencyUnavailable)
            }
        }
        BackendKind::Auto => {
            if zonos::is_installed() {
                log::info!("zonos engine found, using it for synthesis");
                Ok(Arc::new(ZonosBackend::new()))
            } else {
                log::warn!("zonos engine not installed, using placeholder synthesis");
                Ok(Arc::new(PlaceholderBackend::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_always_selectable() {
        let backend = select(BackendKind::Placeholder).unwrap();
        assert_eq!(backend.name(), "placeholder");
    }

    #[test]
    fn auto_always_resolves_to_something() {
        assert!(select(BackendKind::Auto).is_ok());
    }

    #[test]
    fn embedding_serialises_as_a_bare_array() {
        let emb = SpeakerEmbedding::new(vec![0.5, -0.5]);
        assert_eq!(serde_json::to_string(&emb).unwrap(), "[0.5,-0.5]");
    }
}
