//! Deterministic stand-in backend.
//!
//! This is NOT a voice-cloning implementation. The embedding is random noise
//! that ignores the training audio, and synthesis produces faint noise whose
//! length tracks the text. It exists so the rest of the pipeline (and any UI
//! on top of it) is fully exercisable without the external engine, and it
//! defines the stored-model format real backends must stay compatible with.

use rand::Rng;

use crate::audio::TARGET_SAMPLE_RATE;
use crate::backend::{SpeakerEmbedding, TtsBackend, EMBEDDING_DIM};
use crate::error::VoiceError;
use crate::Waveform;

/// Synthesized duration per character of input text, in seconds.
const SECS_PER_CHAR: f64 = 0.1;

/// Peak amplitude of the synthesized noise.
const NOISE_AMPLITUDE: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderBackend;

impl PlaceholderBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TtsBackend for PlaceholderBackend {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn extract_embedding(&self, audio: &Waveform) -> Result<SpeakerEmbedding, VoiceError> {
        log::info!(
            "creating speaker embedding from {:.1}s of audio",
            audio.duration_secs()
        );

        // Stand-in: independent random values, waveform content unused.
        let mut rng = rand::thread_rng();
        let values = (0..EMBEDDING_DIM)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        Ok(SpeakerEmbedding::new(values))
    }

    fn synthesize(
        &self,
        text: &str,
        _embedding: &SpeakerEmbedding,
    ) -> Result<Waveform, VoiceError> {
        let duration = text.chars().count() as f64 * SECS_PER_CHAR;
        let num_samples = (TARGET_SAMPLE_RATE as f64 * duration).round() as usize;

        let mut rng = rand::thread_rng();
        let samples = (0..num_samples)
            .map(|_| rng.gen_range(-1.0f32..1.0) * NOISE_AMPLITUDE)
            .collect();

        Ok(Waveform {
            samples,
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }
}
