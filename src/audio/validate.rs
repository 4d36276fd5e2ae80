//! Admissibility checks for training clips.

use std::path::Path;

use crate::audio::decode;
use crate::error::VoiceError;

/// Container extensions accepted as training input (case-insensitive).
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["wav", "mp3", "flac", "ogg", "m4a"];

/// Minimum decoded duration of a usable clip, in seconds.
pub const MIN_CLIP_SECS: f64 = 1.0;

/// Whether the file name carries one of the accepted container extensions.
pub fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Full admissibility check: accepted extension, decodable, at least
/// [`MIN_CLIP_SECS`] long. Returns the decoded duration in seconds.
pub fn check_sample(path: &Path) -> Result<f64, VoiceError> {
    if !has_accepted_extension(path) {
        return Err(VoiceError::InvalidAudioFile(path.to_path_buf()));
    }
    let wave = decode::decode_mono(path)?;
    let secs = wave.duration_secs();
    if secs < MIN_CLIP_SECS {
        return Err(VoiceError::InvalidAudioFile(path.to_path_buf()));
    }
    Ok(secs)
}

/// Boolean form of [`check_sample`]; rejections are logged and swallowed.
pub fn is_valid_sample(path: &Path) -> bool {
    match check_sample(path) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("skipping {}: {err}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, secs: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(sample_rate as f64 * secs) as usize {
            writer.write_sample(1_000i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn extension_set_is_case_insensitive() {
        assert!(has_accepted_extension(Path::new("a.WAV")));
        assert!(has_accepted_extension(Path::new("b.Mp3")));
        assert!(has_accepted_extension(Path::new("c.m4a")));
        assert!(!has_accepted_extension(Path::new("d.txt")));
        assert!(!has_accepted_extension(Path::new("no_extension")));
    }

    #[test]
    fn accepts_a_two_second_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.wav");
        write_wav(&path, 16_000, 2.0);
        assert!(is_valid_sample(&path));
        assert!((check_sample(&path).unwrap() - 2.0).abs() < 0.01);
    }

    #[test]
    fn rejects_a_clip_shorter_than_one_second() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, 16_000, 0.5);
        assert!(!is_valid_sample(&path));
    }

    #[test]
    fn rejects_missing_file_and_unknown_extension() {
        assert!(!is_valid_sample(Path::new("/no/such/clip.wav")));
        assert!(!is_valid_sample(Path::new("/no/such/clip.txt")));
    }
}
