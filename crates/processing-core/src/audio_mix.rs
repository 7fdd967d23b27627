//! Summing positioned PCM segments into one interleaved buffer.

use shortsmith_common::secs_to_samples;

/// Interleaved f32 PCM with a fixed layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            samples: Vec::new(),
        }
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }

    /// Add `segment` at `start_secs`, scaled by `gain`.
    ///
    /// The buffer grows as needed. Overlapping audio is summed without any
    /// limiting, so the result may leave `[-1.0, 1.0]`.
    pub fn mix_in(&mut self, segment: &[f32], start_secs: f64, gain: f32) {
        let channels = self.channels as usize;
        let start = secs_to_samples(start_secs, self.sample_rate) * channels;
        let end = start + segment.len();
        if self.samples.len() < end {
            self.samples.resize(end, 0.0);
        }

        let dest = &mut self.samples[start..end];
        if gain == 1.0 {
            for (d, s) in dest.iter_mut().zip(segment) {
                *d += *s;
            }
        } else {
            for (d, s) in dest.iter_mut().zip(segment) {
                *d += *s * gain;
            }
        }
    }

    /// Pad with silence up to `duration_secs`, or cut down to it.
    pub fn fit_to(&mut self, duration_secs: f64) {
        let len = secs_to_samples(duration_secs, self.sample_rate) * self.channels as usize;
        self.samples.resize(len, 0.0);
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }

    /// Little-endian bytes, ready for `-f f32le`.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}
