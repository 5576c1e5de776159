// SPDX-License-Identifier: MIT OR Apache-2.0
//! Amplitude envelope for drawing audio clips.

use serde::{Deserialize, Serialize};

/// Peak envelope over a whole audio source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Peak magnitude per bucket, in `[0, 1]`
    pub peaks: Vec<f32>,
}

impl Waveform {
    /// Reduce PCM samples to `buckets` peak magnitudes
    pub fn from_samples(samples: &[f32], buckets: usize) -> Self {
        if samples.is_empty() || buckets == 0 {
            return Self::default();
        }

        let buckets = buckets.min(samples.len());
        let peaks = (0..buckets)
            .map(|bucket| {
                let start = bucket * samples.len() / buckets;
                let end = ((bucket + 1) * samples.len() / buckets).max(start + 1);
                samples[start..end]
                    .iter()
                    .map(|s| s.abs())
                    .fold(0.0_f32, f32::max)
                    .min(1.0)
            })
            .collect();

        Self { peaks }
    }

    /// Buckets covering `[source_in, source_out)` of a source of `total` seconds
    pub fn window(&self, source_in: f64, source_out: f64, total: f64) -> &[f32] {
        if self.peaks.is_empty() || total <= 0.0 || source_out <= source_in {
            return &[];
        }
        let len = self.peaks.len();
        let to_index = |t: f64| (((t / total).clamp(0.0, 1.0)) * len as f64).round() as usize;
        let start = to_index(source_in).min(len);
        let end = to_index(source_out).clamp(start, len);
        &self.peaks[start..end]
    }

    /// Whether there is anything to draw
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}
