//! Audio segment preparation and mixdown.
//!
//! Every audible source (audio tracks and the embedded audio of video
//! clips) is decoded to interleaved stereo f32, trimmed, positioned, and
//! summed with its gain.

use std::path::{Path, PathBuf};
use std::process::Command;

use shortsmith_common::{secs_to_samples, ShortsmithError, ShortsmithResult};
use shortsmith_processing_core::{place_media, PcmBuffer, Placement, TrimWindow};
use shortsmith_timeline_model::{MediaTrack, SkippedTrack, TrackKind};

use crate::ffmpeg::{probe_media, secs_arg, stderr_tail};

/// Mixdown channel count.
pub const MIX_CHANNELS: u16 = 2;

/// One positioned, gain-scaled piece of audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    pub kind: TrackKind,
    /// Declaration index within its track kind.
    pub index: usize,
    pub path: PathBuf,
    pub placement: Placement,
    pub trim: TrimWindow,
    pub gain: f32,
}

/// An audio track paired with its downloaded asset.
#[derive(Debug, Clone)]
pub struct AudioInput<'a> {
    pub index: usize,
    pub track: &'a MediaTrack,
    pub path: Option<PathBuf>,
}

/// Probe audio tracks and turn them into segments.
pub fn build_audio_segments(inputs: &[AudioInput<'_>]) -> (Vec<AudioSegment>, Vec<SkippedTrack>) {
    let mut segments = Vec::new();
    let mut skipped = Vec::new();

    for input in inputs {
        match build_segment(input) {
            Ok(segment) => {
                tracing::info!(
                    track = input.index,
                    start = segment.placement.start,
                    duration = segment.placement.duration,
                    gain = segment.gain,
                    "Audio segment ready"
                );
                segments.push(segment);
            }
            Err(err) => {
                tracing::warn!(track = input.index, error = %err, "Skipping audio track");
                skipped.push(SkippedTrack {
                    kind: TrackKind::Audio,
                    index: input.index,
                    reason: err.to_string(),
                });
            }
        }
    }

    (segments, skipped)
}

fn build_segment(input: &AudioInput<'_>) -> ShortsmithResult<AudioSegment> {
    let path = input
        .path
        .as_ref()
        .ok_or_else(|| ShortsmithError::asset_download("Asset unavailable"))?;
    let info = probe_media(path)?;
    if !info.has_audio {
        return Err(ShortsmithError::asset_decode("No audio stream"));
    }
    let natural = info
        .duration_secs
        .ok_or_else(|| ShortsmithError::asset_decode("Unknown duration"))?;
    let (placement, trim) = place_media(input.track, Some(natural))
        .ok_or_else(|| ShortsmithError::asset_decode("Offset is past the end of the source"))?;

    Ok(AudioSegment {
        kind: TrackKind::Audio,
        index: input.index,
        path: path.clone(),
        placement,
        trim,
        gain: input.track.volume as f32,
    })
}

/// Decode the trimmed window of `path` to interleaved stereo f32.
pub fn decode_pcm(path: &Path, trim: &TrimWindow, sample_rate: u32) -> ShortsmithResult<Vec<f32>> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
        .args(["-ss", &secs_arg(trim.offset), "-t", &secs_arg(trim.duration), "-i"])
        .arg(path)
        .args(["-vn", "-f", "f32le", "-ac", &MIX_CHANNELS.to_string()])
        .args(["-ar", &sample_rate.to_string(), "pipe:1"])
        .output()
        .map_err(|e| ShortsmithError::asset_decode(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(ShortsmithError::asset_decode(format!(
            "Audio decode of {} failed: {}",
            path.display(),
            stderr_tail(&String::from_utf8_lossy(&output.stderr), 5)
        )));
    }

    let mut samples = pcm_from_le_bytes(&output.stdout);
    samples.truncate(secs_to_samples(trim.duration, sample_rate) * MIX_CHANNELS as usize);
    Ok(samples)
}

pub fn pcm_from_le_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Result of [`mix_segments`].
#[derive(Debug)]
pub struct AudioMix {
    pub buffer: PcmBuffer,
    pub mixed: usize,
    pub skipped: Vec<SkippedTrack>,
}

/// Decode and sum every segment over a `duration_secs` timeline.
///
/// `mixed` is zero (and the buffer empty) when nothing decoded.
pub fn mix_segments(segments: &[AudioSegment], duration_secs: f64, sample_rate: u32) -> AudioMix {
    let mut buffer = PcmBuffer::new(sample_rate, MIX_CHANNELS);
    let mut mixed = 0;
    let mut skipped = Vec::new();

    for segment in segments {
        match decode_pcm(&segment.path, &segment.trim, sample_rate) {
            Ok(pcm) => {
                buffer.mix_in(&pcm, segment.placement.start, segment.gain);
                mixed += 1;
            }
            Err(err) => {
                tracing::warn!(
                    kind = segment.kind.as_str(),
                    track = segment.index,
                    error = %err,
                    "Dropping audio segment"
                );
                skipped.push(SkippedTrack {
                    kind: segment.kind,
                    index: segment.index,
                    reason: err.to_string(),
                });
            }
        }
    }

    if mixed > 0 {
        buffer.fit_to(duration_secs);
        let peak = buffer.peak();
        if peak > 1.0 {
            tracing::warn!(peak, "Audio mix exceeds full scale");
        }
    }

    AudioMix {
        buffer,
        mixed,
        skipped,
    }
}

/// Write the mix as raw f32le for the encoder.
pub fn write_pcm(path: &Path, buffer: &PcmBuffer) -> ShortsmithResult<()> {
    std::fs::write(path, buffer.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::command_exists;

    fn ffmpeg_available() -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe")
    }

    fn write_tone(path: &Path, secs: f64) {
        let status = Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"])
            .arg(format!("sine=frequency=440:duration={secs}:sample_rate=44100"))
            .args(["-ac", "2", "-c:a", "pcm_f32le"])
            .arg(path)
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_pcm_from_le_bytes() {
        let bytes: Vec<u8> = [0.5f32, -1.0].iter().flat_map(|s| s.to_le_bytes()).collect();
        assert_eq!(pcm_from_le_bytes(&bytes), vec![0.5, -1.0]);
        assert!(pcm_from_le_bytes(&[0, 0, 0]).is_empty());
    }

    #[test]
    fn test_missing_audio_asset_is_skipped() {
        let track = MediaTrack::new("https://x/a.mp3");
        let (segments, skipped) = build_audio_segments(&[AudioInput {
            index: 0,
            track: &track,
            path: None,
        }]);
        assert!(segments.is_empty());
        assert_eq!(skipped[0].kind, TrackKind::Audio);
    }

    #[test]
    fn test_unit_volume_preserves_length_and_level() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg not found, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone(&path, 2.0);

        let track = MediaTrack::new(path.to_string_lossy());
        let (segments, skipped) = build_audio_segments(&[AudioInput {
            index: 0,
            track: &track,
            path: Some(path.clone()),
        }]);
        assert!(skipped.is_empty());
        let segment = &segments[0];
        assert!((segment.placement.duration - 2.0).abs() < 0.05);

        let source = decode_pcm(&path, &segment.trim, 44100).unwrap();
        let mix = mix_segments(&segments, segment.placement.duration, 44100);
        assert_eq!(mix.mixed, 1);
        let expected = (2.0 * 44100.0 * 2.0) as usize;
        assert!(source.len().abs_diff(expected) < 44100 / 10);
        assert!(mix.buffer.samples.len() >= source.len());
        assert_eq!(&mix.buffer.samples[..source.len()], &source[..]);
        assert!(mix.buffer.samples[source.len()..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_offset_and_volume_are_applied() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg not found, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone(&path, 3.0);

        let mut track = MediaTrack::new(path.to_string_lossy());
        track.offset = 1.0;
        track.start = 0.5;
        track.volume = 0.5;
        let (segments, _) = build_audio_segments(&[AudioInput {
            index: 0,
            track: &track,
            path: Some(path.clone()),
        }]);
        let segment = &segments[0];
        assert!((segment.trim.duration - 2.0).abs() < 0.05);
        assert_eq!(segment.gain, 0.5);

        let mix = mix_segments(&segments, 2.5, 44100);
        // Leading half second is silence.
        assert!(mix.buffer.samples[..44100].iter().all(|s| *s == 0.0));
        assert!(mix.buffer.peak() <= 0.5 + 1e-3);
    }
}
