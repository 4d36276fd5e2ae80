//! Wrapper around the external `zonos` TTS engine.
//!
//! Zonos is an optional third-party package driven here through its command
//! line interface. The backend shells out for both voice-specific
//! computations and exchanges audio and embeddings through temporary files;
//! if the binary is missing the capability probe fails and the manager falls
//! back to the placeholder backend.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::audio::decode;
use crate::backend::{SpeakerEmbedding, TtsBackend};
use crate::error::VoiceError;
use crate::Waveform;

const ZONOS_BIN: &str = "zonos";

/// Capability probe: can the zonos CLI be executed at all?
pub fn is_installed() -> bool {
    Command::new(ZONOS_BIN)
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Install the zonos package with pip, reporting success or failure.
pub fn install() -> Result<(), VoiceError> {
    log::info!("installing zonos via pip");
    let output = Command::new("pip3")
        .args(["install", "zonos"])
        .output()
        .map_err(|e| VoiceError::Backend {
            backend: "zonos",
            reason: format!("could not run pip3: {e}"),
        })?;

    if output.status.success() {
        log::info!("zonos installed successfully");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(VoiceError::Backend {
            backend: "zonos",
            reason: format!("pip3 install failed: {stderr}"),
        })
    }
}

/// Backend that delegates embedding extraction and synthesis to the zonos
/// CLI.
#[derive(Debug, Clone)]
pub struct ZonosBackend {
    bin: PathBuf,
}

impl Default for ZonosBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ZonosBackend {
    /// Use `zonos` from `PATH`.
    pub fn new() -> Self {
        Self {
            bin: PathBuf::from(ZONOS_BIN),
        }
    }

    /// Use an explicit zonos binary, e.g. one bundled with an application.
    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, VoiceError> {
        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VoiceError::DependencyUnavailable
                } else {
                    VoiceError::Backend {
                        backend: "zonos",
                        reason: format!("failed to run {}: {e}", self.bin.display()),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Backend {
                backend: "zonos",
                reason: format!("exited with code {:?}: {stderr}", output.status.code()),
            });
        }
        Ok(output.stdout)
    }

    fn scratch_path(suffix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stimmenklon_zonos_{}_{suffix}", std::process::id()))
    }
}

impl TtsBackend for ZonosBackend {
    fn name(&self) -> &'static str {
        "zonos"
    }

    fn extract_embedding(&self, audio: &Waveform) -> Result<SpeakerEmbedding, VoiceError> {
        let wav_path = Self::scratch_path("ref.wav");
        audio.write_wav(&wav_path)?;

        let result = self
            .run(&["embed", "--input", &wav_path.to_string_lossy()])
            .and_then(|stdout| parse_embedding_json(&String::from_utf8_lossy(&stdout)));

        let _ = std::fs::remove_file(&wav_path);
        result
    }

    fn synthesize(
        &self,
        text: &str,
        embedding: &SpeakerEmbedding,
    ) -> Result<Waveform, VoiceError> {
        let speaker_path = Self::scratch_path("speaker.json");
        let out_path = Self::scratch_path("out.wav");

        let speaker_json =
            serde_json::to_string(embedding).map_err(|e| VoiceError::Io(e.into()))?;
        std::fs::write(&speaker_path, speaker_json)?;

        let result = self
            .run(&[
                "speak",
                "--text",
                text,
                "--speaker",
                &speaker_path.to_string_lossy(),
                "--output",
                &out_path.to_string_lossy(),
            ])
            .and_then(|_| decode_output(&out_path, text));

        let _ = std::fs::remove_file(&speaker_path);
        let _ = std::fs::remove_file(&out_path);
        result
    }
}

fn decode_output(path: &Path, text: &str) -> Result<Waveform, VoiceError> {
    // The engine writes nothing for empty input; mirror the backend contract.
    if text.is_empty() && !path.exists() {
        return Ok(Waveform {
            samples: Vec::new(),
            sample_rate: crate::audio::TARGET_SAMPLE_RATE,
        });
    }
    decode::decode_mono(path)
}

/// Parse the JSON float array the `zonos embed` subcommand prints.
fn parse_embedding_json(stdout: &str) -> Result<SpeakerEmbedding, VoiceError> {
    let values: Vec<f32> =
        serde_json::from_str(stdout.trim()).map_err(|e| VoiceError::Backend {
            backend: "zonos",
            reason: format!("unparseable embedding output: {e}"),
        })?;
    if values.is_empty() {
        return Err(VoiceError::Backend {
            backend: "zonos",
            reason: "engine returned an empty embedding".into(),
        });
    }
    Ok(SpeakerEmbedding::new(values))
}
