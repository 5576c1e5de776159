// SPDX-License-Identifier: MIT OR Apache-2.0
//! In/out offsets of an audio clip into its source file.
//!
//! The out offset is never stored independently: it is always rederived as
//! `source_in_offset + duration`, capped at the source length.

use crate::clip::{Clip, MIN_CLIP_DURATION};
use crate::error::{Result, TimelineError};
use serde::{Deserialize, Serialize};

/// Trim state of an audio clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrim {
    /// Offset into the source where playback starts
    source_in_offset: f64,
    /// Offset into the source where playback stops
    source_out_offset: f64,
    /// Length of the whole source file
    source_total_duration: f64,
}

impl AudioTrim {
    /// Untrimmed state over a source of the given length
    pub fn new(source_total_duration: f64) -> Result<Self> {
        if !source_total_duration.is_finite() || source_total_duration < MIN_CLIP_DURATION {
            return Err(TimelineError::InvalidDuration {
                requested: source_total_duration,
            });
        }
        Ok(Self {
            source_in_offset: 0.0,
            source_out_offset: source_total_duration,
            source_total_duration,
        })
    }

    /// Source in offset (seconds)
    pub fn source_in_offset(&self) -> f64 {
        self.source_in_offset
    }

    /// Source out offset (seconds)
    pub fn source_out_offset(&self) -> f64 {
        self.source_out_offset
    }

    /// Total source length (seconds)
    pub fn source_total_duration(&self) -> f64 {
        self.source_total_duration
    }

    /// Longest duration the clip may have from its current in offset
    pub fn max_duration(&self) -> f64 {
        self.source_total_duration - self.source_in_offset
    }

    fn rederive(&mut self, duration: f64) {
        self.source_out_offset = (self.source_in_offset + duration).min(self.source_total_duration);
    }

    /// Clamp a requested duration to the source and rederive the out offset.
    ///
    /// Returns the duration actually applied.
    pub fn fit_duration(&mut self, requested: f64) -> f64 {
        let duration = requested.max(MIN_CLIP_DURATION).min(self.max_duration());
        self.rederive(duration);
        duration
    }

    /// Move the in point by `delta`, keeping the out point fixed.
    ///
    /// Returns `(applied_delta, new_duration)`.
    pub fn trim_left(&mut self, duration: f64, delta: f64) -> (f64, f64) {
        if !delta.is_finite() {
            return (0.0, duration);
        }
        let max_delta = (duration - MIN_CLIP_DURATION).max(0.0);
        let applied = delta.clamp(-self.source_in_offset, max_delta);

        self.source_in_offset = (self.source_in_offset + applied).max(0.0);
        let new_duration = (duration - applied).max(MIN_CLIP_DURATION);
        self.rederive(new_duration);
        (applied, new_duration)
    }

    /// Move the out point by `delta`. Returns the new duration.
    pub fn trim_right(&mut self, duration: f64, delta: f64) -> f64 {
        if !delta.is_finite() {
            return duration;
        }
        self.fit_duration(duration + delta)
    }

    /// Replace the source length once decoding has measured it.
    ///
    /// Returns the clip duration after re-clamping to the new bounds.
    pub fn set_source_total_duration(&mut self, total: f64, duration: f64) -> Result<f64> {
        if !total.is_finite() || total < MIN_CLIP_DURATION {
            return Err(TimelineError::InvalidDuration { requested: total });
        }
        self.source_total_duration = total;
        self.source_in_offset = self.source_in_offset.min(total - MIN_CLIP_DURATION).max(0.0);
        Ok(self.fit_duration(duration))
    }

    /// Whether offsets are consistent with the given clip duration
    pub fn is_consistent(&self, duration: f64) -> bool {
        const EPSILON: f64 = 1e-9;
        self.source_in_offset >= 0.0
            && self.source_in_offset < self.source_out_offset
            && self.source_out_offset <= self.source_total_duration + EPSILON
            && (self.source_out_offset - (self.source_in_offset + duration)).abs() <= EPSILON
    }
}

/// Trim the left edge of an audio clip.
///
/// Returns the applied delta, or `None` for non-audio clips.
pub fn trim_left(clip: &mut Clip, delta: f64) -> Option<f64> {
    clip.is_audio().then(|| clip.trim_start(delta))
}

/// Trim the right edge of an audio clip.
///
/// Returns the new duration, or `None` for non-audio clips.
pub fn trim_right(clip: &mut Clip, delta: f64) -> Option<f64> {
    clip.is_audio().then(|| clip.trim_end(delta))
}
