// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip definitions.
//!
//! A clip is a placed media segment. Start time and duration are private so
//! that `end_time` stays derived and the minimum duration always holds.

use crate::audio_trim::AudioTrim;
use crate::error::{Result, TimelineError};
use crate::track::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Shortest duration any clip may have (seconds)
pub const MIN_CLIP_DURATION: f64 = 0.1;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of media a clip shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still frame
    Image,
    /// Video
    Video,
    /// Audio
    Audio,
}

impl MediaKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }

    /// Image and video share the visual lanes and snap against each other
    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    /// Whether two kinds may snap to each other
    pub fn same_family(&self, other: MediaKind) -> bool {
        self.is_visual() == other.is_visual()
    }
}

/// Media payload; only audio carries trim offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipMedia {
    /// Still frame
    Image,
    /// Video
    Video,
    /// Audio with source offsets
    Audio(AudioTrim),
}

impl ClipMedia {
    /// The media kind tag
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Image => MediaKind::Image,
            Self::Video => MediaKind::Video,
            Self::Audio(_) => MediaKind::Audio,
        }
    }
}

/// Opaque handle to the collaborator that owns the clip's media
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceRef {
    /// Frame in the storyboard
    StoryboardFrame(String),
    /// Imported file
    ImportedFile(String),
}

impl SourceRef {
    /// The opaque handle
    pub fn handle(&self) -> &str {
        match self {
            Self::StoryboardFrame(id) | Self::ImportedFile(id) => id,
        }
    }
}

/// A placed media segment on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Unique clip ID, stable for the clip's lifetime
    pub id: ClipId,
    /// Media payload
    pub media: ClipMedia,
    /// Owning collaborator handle
    pub source: SourceRef,
    /// Start on the timeline (seconds)
    start_time: f64,
    /// Length on the timeline (seconds)
    duration: f64,
    /// Track the clip sits on; authoritative when present
    pub track_id: Option<TrackId>,
    /// Set once the user edits the duration
    pub has_custom_duration: bool,
    /// Thumbnail or file handle for renderers and exporters
    #[serde(default)]
    pub thumbnail_ref: Option<String>,
}

/// Reject non-positive durations, clamp short ones up to the minimum
pub(crate) fn checked_duration(requested: f64) -> Result<f64> {
    if !requested.is_finite() || requested <= 0.0 {
        return Err(TimelineError::InvalidDuration { requested });
    }
    Ok(requested.max(MIN_CLIP_DURATION))
}

impl Clip {
    fn build(media: ClipMedia, source: SourceRef, start_time: f64, duration: f64) -> Self {
        Self {
            id: ClipId::new(),
            media,
            source,
            start_time: sanitize_time(start_time),
            duration,
            track_id: None,
            has_custom_duration: false,
            thumbnail_ref: None,
        }
    }

    /// Create a clip derived from a storyboard frame
    pub fn from_storyboard(
        frame_id: impl Into<String>,
        kind: MediaKind,
        start_time: f64,
        duration: f64,
    ) -> Result<Self> {
        let media = match kind {
            MediaKind::Image => ClipMedia::Image,
            MediaKind::Video => ClipMedia::Video,
            MediaKind::Audio => {
                return Err(TimelineError::InvalidSource(
                    "storyboard frames cannot produce audio clips".to_string(),
                ))
            }
        };
        let duration = checked_duration(duration)?;
        Ok(Self::build(
            media,
            SourceRef::StoryboardFrame(frame_id.into()),
            start_time,
            duration,
        ))
    }

    /// Create a still or video clip from an imported file
    pub fn imported_visual(
        file_id: impl Into<String>,
        kind: MediaKind,
        start_time: f64,
        duration: f64,
    ) -> Result<Self> {
        let media = match kind {
            MediaKind::Image => ClipMedia::Image,
            MediaKind::Video => ClipMedia::Video,
            MediaKind::Audio => {
                return Err(TimelineError::InvalidSource(
                    "use Clip::imported_audio for audio files".to_string(),
                ))
            }
        };
        let duration = checked_duration(duration)?;
        Ok(Self::build(
            media,
            SourceRef::ImportedFile(file_id.into()),
            start_time,
            duration,
        ))
    }

    /// Create an untrimmed audio clip spanning its whole source
    pub fn imported_audio(
        file_id: impl Into<String>,
        start_time: f64,
        source_total_duration: f64,
    ) -> Result<Self> {
        let trim = AudioTrim::new(source_total_duration)?;
        Ok(Self::build(
            ClipMedia::Audio(trim),
            SourceRef::ImportedFile(file_id.into()),
            start_time,
            source_total_duration,
        ))
    }

    /// Place the clip on a track
    pub fn with_track(mut self, track: TrackId) -> Self {
        self.track_id = Some(track);
        self
    }

    /// Use a fixed ID (restoring from the storage collaborator)
    pub fn with_id(mut self, id: ClipId) -> Self {
        self.id = id;
        self
    }

    /// Start time (seconds)
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Duration (seconds)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// End time, always `start_time + duration`
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Media kind
    pub fn kind(&self) -> MediaKind {
        self.media.kind()
    }

    /// Whether the clip came from an imported file
    pub fn is_external(&self) -> bool {
        matches!(self.source, SourceRef::ImportedFile(_))
    }

    /// Whether the clip is audio
    pub fn is_audio(&self) -> bool {
        self.kind() == MediaKind::Audio
    }

    /// Audio trim state, if this is an audio clip
    pub fn audio(&self) -> Option<&AudioTrim> {
        match &self.media {
            ClipMedia::Audio(trim) => Some(trim),
            _ => None,
        }
    }

    /// Whether `time` falls inside `[start, end)`
    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }

    /// Whether the two clips share any instant
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.start_time < other.end_time() && other.start_time < self.end_time()
    }

    pub(crate) fn set_start_time(&mut self, start_time: f64) {
        self.start_time = sanitize_time(start_time);
    }

    /// Set the duration, clamping to the minimum and, for audio, to the source.
    ///
    /// Returns the applied duration.
    pub(crate) fn set_duration(&mut self, requested: f64) -> Result<f64> {
        let requested = checked_duration(requested)?;
        self.duration = match &mut self.media {
            ClipMedia::Audio(trim) => trim.fit_duration(requested),
            ClipMedia::Image | ClipMedia::Video => requested,
        };
        Ok(self.duration)
    }

    /// Move the left edge by `delta`, keeping the right edge in place.
    ///
    /// Returns the applied delta after clamping.
    pub(crate) fn trim_start(&mut self, delta: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let delta = delta.max(-self.start_time);
        let (applied, duration) = match &mut self.media {
            ClipMedia::Audio(trim) => trim.trim_left(self.duration, delta),
            ClipMedia::Image | ClipMedia::Video => {
                let max_delta = (self.duration - MIN_CLIP_DURATION).max(0.0);
                let applied = delta.min(max_delta);
                (applied, (self.duration - applied).max(MIN_CLIP_DURATION))
            }
        };
        self.start_time = sanitize_time(self.start_time + applied);
        self.duration = duration;
        applied
    }

    /// Move the right edge by `delta`. Returns the new duration.
    pub(crate) fn trim_end(&mut self, delta: f64) -> f64 {
        if !delta.is_finite() {
            return self.duration;
        }
        self.duration = match &mut self.media {
            ClipMedia::Audio(trim) => trim.trim_right(self.duration, delta),
            ClipMedia::Image | ClipMedia::Video => (self.duration + delta).max(MIN_CLIP_DURATION),
        };
        self.duration
    }

    /// Replace the measured source length of an audio clip
    pub(crate) fn set_source_total_duration(&mut self, total: f64) -> Result<f64> {
        match &mut self.media {
            ClipMedia::Audio(trim) => {
                self.duration = trim.set_source_total_duration(total, self.duration)?;
                Ok(self.duration)
            }
            ClipMedia::Image | ClipMedia::Video => Err(TimelineError::InvalidSource(
                "only audio clips have a source length".to_string(),
            )),
        }
    }

    /// Check invariants of a clip coming from outside (restored snapshots)
    pub fn validate(&self) -> Result<()> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(TimelineError::InvalidSource(format!(
                "clip {} has invalid start time {}",
                self.id, self.start_time
            )));
        }
        if !self.duration.is_finite() || self.duration < MIN_CLIP_DURATION - 1e-9 {
            return Err(TimelineError::InvalidDuration {
                requested: self.duration,
            });
        }
        if let SourceRef::StoryboardFrame(_) = self.source {
            if self.is_audio() {
                return Err(TimelineError::InvalidSource(
                    "storyboard frames cannot produce audio clips".to_string(),
                ));
            }
        }
        if let Some(trim) = self.audio() {
            if !trim.is_consistent(self.duration) {
                return Err(TimelineError::InvalidSource(format!(
                    "clip {} has inconsistent audio offsets",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

fn sanitize_time(time: f64) -> f64 {
    if time.is_finite() {
        time.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackKind;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_end_time_is_derived() {
        let mut clip = Clip::from_storyboard("frame-1", MediaKind::Image, 1.5, 2.0).unwrap();
        assert_eq!(clip.end_time(), 3.5);

        clip.set_start_time(4.0);
        assert_eq!(clip.end_time(), 6.0);
        clip.set_duration(0.5).unwrap();
        assert_eq!(clip.end_time(), 4.5);
    }

    #[test]
    fn test_short_durations_clamp_and_non_positive_reject() {
        let clip = Clip::from_storyboard("frame-1", MediaKind::Image, 0.0, 0.01).unwrap();
        assert_eq!(clip.duration(), MIN_CLIP_DURATION);

        assert!(matches!(
            Clip::from_storyboard("frame-1", MediaKind::Image, 0.0, 0.0),
            Err(TimelineError::InvalidDuration { .. })
        ));
        assert!(Clip::imported_visual("file", MediaKind::Video, 0.0, -1.0).is_err());
        assert!(Clip::imported_visual("file", MediaKind::Video, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_storyboard_source_rejects_audio() {
        assert!(matches!(
            Clip::from_storyboard("frame-1", MediaKind::Audio, 0.0, 1.0),
            Err(TimelineError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_external_flag_follows_source() {
        let derived = Clip::from_storyboard("frame-1", MediaKind::Video, 0.0, 1.0).unwrap();
        let imported = Clip::imported_audio("song.wav", 0.0, 3.0).unwrap();
        assert!(!derived.is_external());
        assert!(imported.is_external());
        assert!(imported.is_audio());
    }

    #[test]
    fn test_negative_start_clamps_to_zero() {
        let mut clip = Clip::imported_visual("file", MediaKind::Image, -3.0, 1.0).unwrap();
        assert_eq!(clip.start_time(), 0.0);
        clip.set_start_time(f64::NAN);
        assert_eq!(clip.start_time(), 0.0);
    }

    #[test]
    fn test_trim_start_keeps_right_edge() {
        let mut clip = Clip::imported_visual("file", MediaKind::Video, 2.0, 3.0).unwrap();
        let applied = clip.trim_start(1.0);
        assert!(approx(applied, 1.0));
        assert!(approx(clip.start_time(), 3.0));
        assert!(approx(clip.end_time(), 5.0));

        let applied = clip.trim_start(-10.0);
        assert!(approx(applied, -3.0));
        assert_eq!(clip.start_time(), 0.0);
    }

    #[test]
    fn test_audio_trim_start_moves_in_offset() {
        let mut clip = Clip::imported_audio("song.wav", 0.0, 5.0).unwrap();
        let out_before = clip.audio().unwrap().source_out_offset();
        clip.trim_start(0.5);

        let trim = clip.audio().unwrap();
        assert!(approx(trim.source_in_offset(), 0.5));
        assert!(approx(clip.duration(), 4.5));
        assert!(approx(trim.source_out_offset(), out_before));
        assert!(approx(clip.start_time(), 0.5));
    }

    #[test]
    fn test_validate_catches_bad_restores() {
        let clip = Clip::imported_audio("song.wav", 0.0, 5.0)
            .unwrap()
            .with_track(TrackId::base(TrackKind::Audio));
        assert!(clip.validate().is_ok());

        let mut json = serde_json::to_value(&clip).unwrap();
        json["duration"] = serde_json::json!(2.0);
        let broken: Clip = serde_json::from_value(json).unwrap();
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_clip_json_uses_camel_case() {
        let clip = Clip::imported_audio("song.wav", 1.0, 5.0).unwrap();
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["startTime"], serde_json::json!(1.0));
        assert_eq!(json["hasCustomDuration"], serde_json::json!(false));
        assert_eq!(json["source"]["importedFile"], serde_json::json!("song.wav"));
        assert_eq!(json["media"]["audio"]["sourceTotalDuration"], serde_json::json!(5.0));
    }
}
