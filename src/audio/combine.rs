//! Combination of training clips into one canonical-rate waveform.

use std::path::PathBuf;

use crate::audio::{decode, TARGET_SAMPLE_RATE};
use crate::error::VoiceError;
use crate::Waveform;

/// Decode every clip, resample it to [`TARGET_SAMPLE_RATE`], and concatenate
/// the results in input order.
///
/// `on_progress` receives the fraction of files processed (0.0–1.0), once
/// before each file and once after the last. Clips that fail to decode are
/// skipped with a warning; the combination fails with
/// [`VoiceError::Combination`] only when nothing survives.
pub fn combine<F>(paths: &[PathBuf], mut on_progress: F) -> Result<Waveform, VoiceError>
where
    F: FnMut(f32),
{
    if paths.is_empty() {
        return Err(VoiceError::Combination);
    }

    let mut combined: Vec<f32> = Vec::new();
    let total = paths.len();

    for (i, path) in paths.iter().enumerate() {
        on_progress(i as f32 / total as f32);

        let wave = match decode::decode_mono(path) {
            Ok(w) => w,
            Err(err) => {
                log::warn!("failed to process {}: {err}", path.display());
                continue;
            }
        };

        if wave.sample_rate == TARGET_SAMPLE_RATE {
            combined.extend_from_slice(&wave.samples);
        } else {
            combined.extend(resample_linear(
                &wave.samples,
                wave.sample_rate,
                TARGET_SAMPLE_RATE,
            ));
        }
    }
    on_progress(1.0);

    if combined.is_empty() {
        return Err(VoiceError::Combination);
    }

    Ok(Waveform {
        samples: combined,
        sample_rate: TARGET_SAMPLE_RATE,
    })
}

/// Linear-interpolation resampler for mono audio.
///
/// The combined waveform feeds embedding extraction, not playback.
pub fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if input.is_empty() || from_rate == to_rate {
        return input.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let out_len = ((input.len() as f64) * ratio).round() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let t = (src_pos - idx as f64) as f32;

        let s0 = input[idx.min(input.len() - 1)];
        let s1 = input[(idx + 1).min(input.len() - 1)];
        out.push(s0 * (1.0 - t) + s1 * t);
    }

    out
}
