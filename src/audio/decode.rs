//! Container decoding via symphonia.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::VoiceError;
use crate::Waveform;

/// Decode an audio file to a mono waveform at its native sample rate.
///
/// Multi-channel sources are downmixed by averaging the channels of each
/// frame. The container is probed from content with the file extension as a
/// hint, so a misnamed file still decodes if symphonia recognises it.
pub fn decode_mono(path: &Path) -> Result<Waveform, VoiceError> {
    let fail = |reason: String| VoiceError::AudioDecode {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| fail(format!("unrecognised container: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| fail("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| fail("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("no decoder for codec: {e}")))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(fail(format!("read error: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // A damaged packet is recoverable; the decoder resynchronises.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(fail(format!("decode error: {e}"))),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let channels = decoded.spec().channels.count();

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            downmix_interleaved(buf.samples(), channels, &mut samples);
        }
    }

    if samples.is_empty() {
        return Err(fail("decoded no audio data".into()));
    }

    Ok(Waveform {
        samples,
        sample_rate,
    })
}

/// Append interleaved frames to `out` as mono, averaging the channels.
fn downmix_interleaved(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.reserve(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        out.push(frame.iter().sum::<f32>() / channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            for ch in 0..channels {
                // Distinct per-channel values so downmix is observable.
                let v: i16 = if ch == 0 { 8_000 } else { -8_000 };
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_mono_wav_at_native_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 22_050, 1, 22_050);

        let wave = decode_mono(&path).unwrap();
        assert_eq!(wave.sample_rate, 22_050);
        assert_eq!(wave.samples.len(), 22_050);
    }

    #[test]
    fn stereo_is_downmixed_by_averaging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 44_100, 2, 1_000);

        let wave = decode_mono(&path).unwrap();
        assert_eq!(wave.samples.len(), 1_000);
        // +8000 and -8000 average to zero.
        assert!(wave.samples.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = decode_mono(Path::new("/no/such/file.wav")).unwrap_err();
        assert!(matches!(err, VoiceError::Io(_)));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a wav file").unwrap();

        let err = decode_mono(&path).unwrap_err();
        assert!(matches!(err, VoiceError::AudioDecode { .. }));
    }

    #[test]
    fn downmix_three_channels() {
        let mut out = Vec::new();
        downmix_interleaved(&[3.0, 0.0, 0.0, 0.0, 3.0, 0.0], 3, &mut out);
        assert_eq!(out, vec![1.0, 1.0]);
    }
}
