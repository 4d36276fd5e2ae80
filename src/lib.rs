//! # stimmenklon
//!
//! A Rust library for voice cloning: train a named voice model from a handful
//! of audio clips, persist it, and synthesize speech with it later.
//!
//! ## Features
//!
//! - **Training pipeline**: validate clips, resample and downmix them to one
//!   44.1 kHz mono waveform, extract a speaker embedding, persist the model
//! - **Pluggable backends**: the external `zonos` engine when it is
//!   installed, a deterministic placeholder otherwise
//! - **Background execution**: training and synthesis run on worker threads
//!   and report ordered progress updates over a channel
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! stimmenklon = "0.1"
//! ```
//!
//! ```ignore
//! use stimmenklon::VoiceManager;
//!
//! let manager = VoiceManager::new()?;
//!
//! let clips = vec!["clip1.wav".into(), "clip2.wav".into()];
//! manager.train("my_voice", &clips, |stage, percent| {
//!     println!("[{percent:3}%] {stage}");
//! })?;
//!
//! let wav = manager.synthesize("Hallo Welt!", None)?;
//! println!("wrote {}", wav.display());
//! # Ok::<(), stimmenklon::VoiceError>(())
//! ```

pub mod audio;
pub mod backend;
pub mod error;
pub mod manager;
pub mod store;

use std::path::Path;

pub use audio::TARGET_SAMPLE_RATE;
pub use backend::{BackendKind, SpeakerEmbedding, TtsBackend, EMBEDDING_DIM};
pub use error::VoiceError;
pub use manager::{
    ManagerConfig, ManagerConfigBuilder, SynthesisUpdate, TrainingStage, TrainingUpdate,
    VoiceManager,
};
pub use store::{ModelStore, VoiceModel};

/// A mono audio buffer.
///
/// Produced by the clip combiner and by synthesis backends; everything past
/// decoding is single-channel, so only the sample rate travels with the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl Waveform {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), VoiceError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_sample_count() {
        let wave = Waveform {
            samples: vec![0.0; 44_100],
            sample_rate: 44_100,
        };
        assert_eq!(wave.duration_secs(), 1.0);
    }

    #[test]
    fn wav_round_trip_preserves_rate_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let wave = Waveform {
            samples: vec![0.25; 1_000],
            sample_rate: 22_050,
        };
        wave.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.duration(), 1_000);
    }
}
