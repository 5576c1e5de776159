// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline store.
//!
//! Owns every clip, the track registry and the derived total duration. All
//! structural mutations go through here so derived state is recomputed in
//! one place.

use crate::clip::{checked_duration, Clip, ClipId, MediaKind, MIN_CLIP_DURATION};
use crate::error::{Result, TimelineError};
use crate::history::HistoryEntry;
use crate::track::{Track, TrackId, TrackKind, TrackRegistry};
use crate::waveform::Waveform;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default project frame rate
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

/// Tolerance for comparing edit times
const TIME_EPSILON: f64 = 1e-9;

/// Serializable timeline shape shared with storage and export collaborators.
///
/// Times are in seconds from 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    /// Every clip
    pub clips: Vec<Clip>,
    /// Total duration including the trailing buffer
    pub total_duration: f64,
    /// Project frame rate
    pub frame_rate: f64,
}

impl TimelineSnapshot {
    /// Encode as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of moving a clip
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoveOutcome {
    /// The clip that moved
    pub moved: Option<ClipId>,
    /// Audio clips shortened to make room
    pub trimmed: Vec<ClipId>,
    /// Audio clips deleted because they were covered
    pub removed: Vec<ClipId>,
}

impl MoveOutcome {
    /// Every clip other than the moved one that changed
    pub fn affected_ids(&self) -> Vec<ClipId> {
        self.trimmed.iter().chain(&self.removed).copied().collect()
    }
}

/// Result of deleting a track
#[derive(Debug, Clone)]
pub struct TrackRemoval {
    /// The removed track
    pub track: Track,
    /// Clips deleted along with it
    pub removed_clips: Vec<ClipId>,
}

/// One frame of the storyboard as seen by the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardFrame {
    /// Storyboard frame ID
    pub frame_id: String,
    /// Still or video
    pub kind: MediaKind,
    /// Default duration (seconds)
    pub duration: f64,
}

/// What a storyboard sync changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Newly created clips
    pub added: Vec<ClipId>,
    /// Clips whose frame vanished
    pub removed: Vec<ClipId>,
    /// Clips whose default duration changed
    pub updated: Vec<ClipId>,
}

/// Result of an asynchronous media decode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Measured source length (seconds)
    pub duration: Option<f64>,
    /// Amplitude envelope for audio sources
    pub waveform: Option<Waveform>,
}

/// The authoritative clip store
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Clips in insertion order
    clips: IndexMap<ClipId, Clip>,
    /// Tracks and the assignment map
    tracks: TrackRegistry,
    /// Decoded envelopes for audio clips
    waveforms: HashMap<ClipId, Waveform>,
    /// Project frame rate
    frame_rate: f64,
    /// Cached `max(end) + buffer`
    total_duration: f64,
    /// Playhead position
    current_time: f64,
}

impl Timeline {
    /// Create an empty timeline with the two base tracks
    pub fn new(frame_rate: f64) -> Self {
        Self {
            clips: IndexMap::new(),
            tracks: TrackRegistry::new(),
            waveforms: HashMap::new(),
            frame_rate: sanitize_frame_rate(frame_rate),
            total_duration: 0.0,
            current_time: 0.0,
        }
    }

    /// Project frame rate
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Change the project frame rate
    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        self.frame_rate = sanitize_frame_rate(frame_rate);
    }

    /// Total duration including the trailing buffer
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Latest clip end time
    pub fn max_end_time(&self) -> f64 {
        self.clips.values().map(Clip::end_time).fold(0.0, f64::max)
    }

    /// Playhead position
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Move the playhead, clamped to the timeline
    pub fn set_current_time(&mut self, time: f64) {
        let time = if time.is_finite() { time } else { 0.0 };
        self.current_time = time.clamp(0.0, self.total_duration.max(0.0));
    }

    /// Track registry
    pub fn tracks(&self) -> &TrackRegistry {
        &self.tracks
    }

    /// Add a track of the given kind
    pub fn add_track(&mut self, kind: TrackKind) -> TrackId {
        self.tracks.add_track(kind)
    }

    /// Get a clip
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    /// All clips in insertion order
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }

    /// Clip count
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Envelope for an audio clip, once decoded
    pub fn waveform(&self, id: ClipId) -> Option<&Waveform> {
        self.waveforms.get(&id)
    }

    /// Check a clip's track reference without recovering from it
    pub fn track_reference(&self, clip: &Clip) -> Result<TrackId> {
        let kind = TrackKind::for_media(clip.kind());
        let valid = |track: TrackId| track.kind == kind && self.tracks.contains(track);
        let assigned = self.tracks.assignment(clip.id);

        match (clip.track_id, assigned) {
            (Some(track), _) if valid(track) => Ok(track),
            (_, Some(track)) if valid(track) => Ok(track),
            (Some(track), _) | (None, Some(track)) => Err(TimelineError::OrphanTrackReference {
                clip: clip.id,
                track,
            }),
            (None, None) => Ok(TrackId::base(kind)),
        }
    }

    /// Track a clip effectively sits on.
    ///
    /// Stale references fall back to the base track of the clip's kind.
    pub fn resolve_track(&self, clip: &Clip) -> TrackId {
        self.track_reference(clip)
            .unwrap_or_else(|_| TrackId::base(TrackKind::for_media(clip.kind())))
    }

    /// Resolved track of a clip by ID
    pub fn track_of(&self, id: ClipId) -> Result<TrackId> {
        let clip = self.clips.get(&id).ok_or(TimelineError::ClipNotFound(id))?;
        Ok(self.resolve_track(clip))
    }

    /// Clips on a track, sorted by start time
    pub fn clips_on_track(&self, track: TrackId) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self
            .clips
            .values()
            .filter(|c| self.resolve_track(c) == track)
            .collect();
        clips.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        clips
    }

    /// Add a clip, assigning it to its track
    pub fn add_clip(&mut self, mut clip: Clip) -> Result<ClipId> {
        if self.clips.contains_key(&clip.id) {
            return Err(TimelineError::DuplicateClip(clip.id));
        }
        clip.validate()?;
        if let Some(track) = clip.track_id {
            if !track.kind.accepts(clip.kind()) {
                return Err(TimelineError::IncompatibleTrack {
                    clip: clip.id,
                    track,
                });
            }
        }

        let track = self.recover_track(&clip);
        clip.track_id = Some(track);
        let id = clip.id;
        self.tracks.assign(id, track);
        self.clips.insert(id, clip);

        self.resolve_audio_overlaps(id);
        self.recompute_total();
        tracing::debug!("Added clip {id} on {track}");
        Ok(id)
    }

    /// Delete a clip the user owns.
    ///
    /// Storyboard-derived clips are refused; they leave the timeline only
    /// through a storyboard sync.
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        let clip = self.clips.get(&id).ok_or(TimelineError::ClipNotFound(id))?;
        if !clip.is_external() {
            return Err(TimelineError::StoryboardClipDeletion(id));
        }
        let clip = self.take_clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        self.recompute_total();
        Ok(clip)
    }

    /// Move a clip on its current track
    pub fn move_clip(&mut self, id: ClipId, new_start_time: f64) -> Result<MoveOutcome> {
        self.move_clip_to_track(id, new_start_time, None)
    }

    /// Move a clip, optionally onto another track of the same kind.
    ///
    /// Audio clips left overlapping on the destination track are trimmed or
    /// deleted. Visual overlaps are left for the caller to ripple.
    pub fn move_clip_to_track(
        &mut self,
        id: ClipId,
        new_start_time: f64,
        track: Option<TrackId>,
    ) -> Result<MoveOutcome> {
        let kind = self
            .clips
            .get(&id)
            .ok_or(TimelineError::ClipNotFound(id))?
            .kind();
        if let Some(track) = track {
            if !self.tracks.contains(track) {
                return Err(TimelineError::TrackNotFound(track));
            }
            if !track.kind.accepts(kind) {
                return Err(TimelineError::IncompatibleTrack { clip: id, track });
            }
        }

        let clip = self.clips.get_mut(&id).ok_or(TimelineError::ClipNotFound(id))?;
        clip.set_start_time(new_start_time);
        if let Some(track) = track {
            clip.track_id = Some(track);
            self.tracks.assign(id, track);
        }

        let mut outcome = self.resolve_audio_overlaps(id);
        outcome.moved = Some(id);
        self.recompute_total();
        Ok(outcome)
    }

    /// Set a clip's duration (right edge). Returns the applied duration.
    pub fn resize_clip(&mut self, id: ClipId, new_duration: f64) -> Result<f64> {
        let clip = self.clips.get_mut(&id).ok_or(TimelineError::ClipNotFound(id))?;
        let applied = clip.set_duration(new_duration)?;
        clip.has_custom_duration = true;
        if (applied - new_duration).abs() > TIME_EPSILON {
            tracing::debug!("Clamped duration of {id} from {new_duration} to {applied}");
        }

        self.resolve_audio_overlaps(id);
        self.recompute_total();
        Ok(applied)
    }

    /// Resize a clip and shift everything downstream on its track by the change
    /// in end time.
    ///
    /// Clips starting at or after the old end move before audio overlaps are
    /// resolved, so a rippled neighbour keeps its content. Returns the applied
    /// duration and the shifted clips.
    pub fn resize_clip_rippled(
        &mut self,
        id: ClipId,
        new_duration: f64,
    ) -> Result<(f64, Vec<ClipId>)> {
        let clip = self.clips.get(&id).ok_or(TimelineError::ClipNotFound(id))?;
        let track = self.resolve_track(clip);
        let original_end = clip.end_time();

        let clip = self.clips.get_mut(&id).ok_or(TimelineError::ClipNotFound(id))?;
        let applied = clip.set_duration(new_duration)?;
        clip.has_custom_duration = true;
        let delta = clip.end_time() - original_end;

        let shifted = self.ripple(track, original_end, delta, id);
        self.resolve_audio_overlaps(id);
        self.recompute_total();
        Ok((applied, shifted))
    }

    /// Move a clip's left edge by `delta`, keeping its right edge.
    ///
    /// This is resize plus move in one step; audio clips shift their source
    /// in offset. Returns the applied delta.
    pub fn trim_clip_start(&mut self, id: ClipId, delta: f64) -> Result<f64> {
        let clip = self.clips.get_mut(&id).ok_or(TimelineError::ClipNotFound(id))?;
        let applied = clip.trim_start(delta);
        clip.has_custom_duration = true;

        self.resolve_audio_overlaps(id);
        self.recompute_total();
        Ok(applied)
    }

    /// Shift every clip on `track` starting at or after `from_time` by `delta`
    pub fn ripple(
        &mut self,
        track: TrackId,
        from_time: f64,
        delta: f64,
        exclude: ClipId,
    ) -> Vec<ClipId> {
        if delta == 0.0 || !delta.is_finite() {
            return Vec::new();
        }
        let shifted: Vec<ClipId> = self
            .clips_on_track(track)
            .into_iter()
            .filter(|c| c.id != exclude && c.start_time() >= from_time - TIME_EPSILON)
            .map(|c| c.id)
            .collect();

        for id in &shifted {
            if let Some(clip) = self.clips.get_mut(id) {
                clip.set_start_time(clip.start_time() + delta);
            }
        }
        self.recompute_total();
        shifted
    }

    /// Reposition clips after a duration edit.
    ///
    /// With a track, clips on that track are pushed forward until none
    /// overlaps its predecessor. Without one, storyboard-derived clips are
    /// packed back to back on each track. External clips elsewhere are never
    /// touched. Returns the clips that moved.
    pub fn recalculate(&mut self, track: Option<TrackId>) -> Vec<ClipId> {
        let mut moved = Vec::new();

        match track {
            Some(track) => {
                let order: Vec<ClipId> = self.clips_on_track(track).iter().map(|c| c.id).collect();
                let mut prev_end: Option<f64> = None;
                for id in order {
                    let Some(clip) = self.clips.get_mut(&id) else {
                        continue;
                    };
                    if let Some(end) = prev_end {
                        if clip.start_time() < end - TIME_EPSILON {
                            clip.set_start_time(end);
                            moved.push(id);
                        }
                    }
                    prev_end = Some(prev_end.unwrap_or(0.0).max(clip.end_time()));
                }
            }
            None => {
                for (_, order) in self.storyboard_clips_by_track() {
                    moved.extend(self.pack(&order));
                }
            }
        }

        self.recompute_total();
        moved
    }

    /// Bring derived clips in line with the storyboard.
    ///
    /// Frames are laid out back to back in storyboard order on each track.
    pub fn sync_storyboard(&mut self, frames: &[StoryboardFrame]) -> Result<SyncReport> {
        for frame in frames {
            checked_duration(frame.duration)?;
            if frame.kind == MediaKind::Audio {
                return Err(TimelineError::InvalidSource(format!(
                    "storyboard frame {} cannot be audio",
                    frame.frame_id
                )));
            }
        }

        let mut report = SyncReport::default();
        let existing: HashMap<String, ClipId> = self
            .clips
            .values()
            .filter(|c| !c.is_external())
            .map(|c| (c.source.handle().to_string(), c.id))
            .collect();
        let wanted: HashSet<&str> = frames.iter().map(|f| f.frame_id.as_str()).collect();

        let vanished: Vec<ClipId> = self
            .clips
            .values()
            .filter(|c| !c.is_external() && !wanted.contains(c.source.handle()))
            .map(|c| c.id)
            .collect();
        for id in vanished {
            self.take_clip(id);
            report.removed.push(id);
        }

        let base = TrackId::base(TrackKind::Video);
        let mut frame_order: HashMap<ClipId, usize> = HashMap::new();
        for (index, frame) in frames.iter().enumerate() {
            let id = match existing.get(&frame.frame_id) {
                Some(&id) => {
                    if let Some(clip) = self.clips.get_mut(&id) {
                        if !clip.has_custom_duration
                            && (clip.duration() - frame.duration).abs() > TIME_EPSILON
                        {
                            clip.set_duration(frame.duration)?;
                            report.updated.push(id);
                        }
                    }
                    id
                }
                None => {
                    let clip =
                        Clip::from_storyboard(&frame.frame_id, frame.kind, 0.0, frame.duration)?
                            .with_track(base);
                    let id = clip.id;
                    self.tracks.assign(id, base);
                    self.clips.insert(id, clip);
                    report.added.push(id);
                    id
                }
            };
            frame_order.insert(id, index);
        }

        for (_, mut order) in self.storyboard_clips_by_track() {
            order.sort_by_key(|id| frame_order.get(id).copied().unwrap_or(usize::MAX));
            self.pack(&order);
        }

        self.recompute_total();
        tracing::info!(
            "Storyboard sync: {} added, {} removed, {} updated",
            report.added.len(),
            report.removed.len(),
            report.updated.len()
        );
        Ok(report)
    }

    /// How many clips deleting a track would take with it
    pub fn track_removal_impact(&self, track: TrackId) -> Result<usize> {
        if !self.tracks.contains(track) {
            return Err(TimelineError::TrackNotFound(track));
        }
        if self.tracks.is_protected(track) {
            return Err(TimelineError::ProtectedTrack(track));
        }
        Ok(self.clips_on_track(track).len())
    }

    /// Delete a track and every clip resolved onto it
    pub fn remove_track(&mut self, track: TrackId) -> Result<TrackRemoval> {
        self.track_removal_impact(track)?;
        let doomed: Vec<ClipId> = self.clips_on_track(track).iter().map(|c| c.id).collect();

        for id in &doomed {
            self.take_clip(*id);
        }
        let removed = self.tracks.remove_track(track)?;
        self.recompute_total();
        tracing::info!("Removed track {track} with {} clips", doomed.len());

        Ok(TrackRemoval {
            track: removed,
            removed_clips: doomed,
        })
    }

    /// Apply a finished decode.
    ///
    /// Returns `false` when the clip was deleted in the meantime and the
    /// result was discarded.
    pub fn apply_media_probe(&mut self, id: ClipId, probe: MediaProbe) -> Result<bool> {
        let Some(clip) = self.clips.get_mut(&id) else {
            tracing::warn!("Discarding media probe for deleted clip {id}");
            return Ok(false);
        };

        if let Some(duration) = probe.duration {
            if clip.is_audio() {
                clip.set_source_total_duration(duration)?;
            } else if clip.is_external()
                && clip.kind() == MediaKind::Video
                && !clip.has_custom_duration
            {
                clip.set_duration(duration)?;
            }
        }
        if let Some(waveform) = probe.waveform {
            if clip.is_audio() {
                self.waveforms.insert(id, waveform);
            }
        }

        self.resolve_audio_overlaps(id);
        self.recompute_total();
        Ok(true)
    }

    /// Pairs of clips sharing an instant on the same track
    pub fn overlaps(&self) -> Vec<(ClipId, ClipId)> {
        let mut pairs = Vec::new();
        for track in self.tracks.ordered() {
            let clips = self.clips_on_track(track.id);
            for (i, a) in clips.iter().enumerate() {
                for b in &clips[i + 1..] {
                    if b.start_time() >= a.end_time() {
                        break;
                    }
                    if a.overlaps(b) {
                        pairs.push((a.id, b.id));
                    }
                }
            }
        }
        pairs
    }

    /// The visual clip shown at `time`.
    ///
    /// The highest video track wins; among equals, the later start.
    pub fn clip_at_time(&self, time: f64) -> Option<&Clip> {
        self.clips
            .values()
            .filter(|c| c.kind().is_visual() && c.contains_time(time))
            .max_by(|a, b| {
                let ta = self.resolve_track(a).ordinal;
                let tb = self.resolve_track(b).ordinal;
                ta.cmp(&tb).then(a.start_time().total_cmp(&b.start_time()))
            })
    }

    /// Serializable snapshot for storage and export
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            clips: self.clips.values().cloned().collect(),
            total_duration: self.total_duration,
            frame_rate: self.frame_rate,
        }
    }

    /// Replace all clips with a snapshot's.
    ///
    /// Every clip is validated before anything changes. Tracks the clips refer
    /// to are registered again if they are missing.
    pub fn restore(&mut self, snapshot: TimelineSnapshot) -> Result<()> {
        check_clips(&snapshot.clips)?;
        for clip in &snapshot.clips {
            if let Some(track) = clip.track_id.filter(|t| t.kind.accepts(clip.kind())) {
                self.tracks.reinstate(Track::new(track));
            }
        }
        self.replace_clips(snapshot.clips)?;
        self.frame_rate = sanitize_frame_rate(snapshot.frame_rate);
        self.recompute_total();
        self.set_current_time(self.current_time);
        Ok(())
    }

    /// Capture the state recorded in history
    pub fn capture(&self) -> HistoryEntry {
        HistoryEntry {
            tracks: self.tracks.ordered().into_iter().cloned().collect(),
            clips: self.clips.values().cloned().collect(),
            current_time: self.current_time,
            total_duration: self.total_duration,
        }
    }

    /// Return to a state recorded in history
    pub fn restore_entry(&mut self, entry: HistoryEntry) -> Result<()> {
        check_clips(&entry.clips)?;
        self.tracks.restore_tracks(entry.tracks);
        self.replace_clips(entry.clips)?;
        self.total_duration = entry.total_duration;
        self.current_time = entry.current_time;
        Ok(())
    }

    fn replace_clips(&mut self, clips: Vec<Clip>) -> Result<()> {
        check_clips(&clips)?;

        self.clips.clear();
        self.tracks.clear_assignments();
        let mut relocated = Vec::new();
        for mut clip in clips {
            if self.track_reference(&clip).is_err() {
                relocated.push(clip.id);
            }
            let track = self.recover_track(&clip);
            clip.track_id = Some(track);
            self.tracks.assign(clip.id, track);
            self.clips.insert(clip.id, clip);
        }
        self.waveforms.retain(|id, _| self.clips.contains_key(id));

        // clips moved onto a base track may now collide with audio already there
        for id in relocated {
            self.resolve_audio_overlaps(id);
        }
        Ok(())
    }

    /// Resolve a clip's track, logging any stale reference
    fn recover_track(&self, clip: &Clip) -> TrackId {
        match self.track_reference(clip) {
            Ok(track) => track,
            Err(err) => {
                let fallback = TrackId::base(TrackKind::for_media(clip.kind()));
                tracing::debug!("{err}; falling back to {fallback}");
                fallback
            }
        }
    }

    fn take_clip(&mut self, id: ClipId) -> Option<Clip> {
        let clip = self.clips.shift_remove(&id)?;
        self.tracks.unassign(id);
        self.waveforms.remove(&id);
        Some(clip)
    }

    /// Storyboard-derived clips grouped by track, each in start order
    fn storyboard_clips_by_track(&self) -> Vec<(TrackId, Vec<ClipId>)> {
        self.tracks
            .ordered()
            .iter()
            .map(|track| {
                let ids = self
                    .clips_on_track(track.id)
                    .iter()
                    .filter(|c| !c.is_external())
                    .map(|c| c.id)
                    .collect();
                (track.id, ids)
            })
            .collect()
    }

    /// Lay clips back to back from 0 in the given order
    fn pack(&mut self, order: &[ClipId]) -> Vec<ClipId> {
        let mut moved = Vec::new();
        let mut cursor = 0.0;
        for id in order {
            let Some(clip) = self.clips.get_mut(id) else {
                continue;
            };
            if (clip.start_time() - cursor).abs() > TIME_EPSILON {
                clip.set_start_time(cursor);
                moved.push(*id);
            }
            cursor = clip.end_time();
        }
        moved
    }

    /// Keep at most one audio clip per instant on the moved clip's track
    fn resolve_audio_overlaps(&mut self, id: ClipId) -> MoveOutcome {
        let mut outcome = MoveOutcome::default();
        let Some(moved) = self.clips.get(&id) else {
            return outcome;
        };
        if !moved.is_audio() {
            return outcome;
        }

        let track = self.resolve_track(moved);
        let (start, end) = (moved.start_time(), moved.end_time());
        let overlapping: Vec<ClipId> = self
            .clips_on_track(track)
            .iter()
            .filter(|c| c.id != id && c.overlaps(moved))
            .map(|c| c.id)
            .collect();

        for other_id in overlapping {
            let Some(other) = self.clips.get_mut(&other_id) else {
                continue;
            };
            let (other_start, other_end) = (other.start_time(), other.end_time());

            let keep = if other_start >= start - TIME_EPSILON && other_end <= end + TIME_EPSILON {
                false
            } else if other_start < start {
                let remaining = start - other_start;
                if remaining < MIN_CLIP_DURATION {
                    false
                } else {
                    other.trim_end(remaining - other.duration());
                    true
                }
            } else {
                let cut = end - other_start;
                if other.duration() - cut < MIN_CLIP_DURATION {
                    false
                } else {
                    other.trim_start(cut);
                    true
                }
            };

            if keep {
                outcome.trimmed.push(other_id);
            } else {
                self.take_clip(other_id);
                outcome.removed.push(other_id);
            }
        }

        if !outcome.trimmed.is_empty() || !outcome.removed.is_empty() {
            tracing::debug!(
                "Audio overlap on {track}: {} trimmed, {} removed",
                outcome.trimmed.len(),
                outcome.removed.len()
            );
        }
        outcome
    }

    fn recompute_total(&mut self) {
        let max_end = self.max_end_time();
        self.total_duration = if max_end > 0.0 {
            max_end + (max_end * 0.05).min(1.0)
        } else {
            0.0
        };
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_RATE)
    }
}

/// Validate clips coming from outside the store
fn check_clips(clips: &[Clip]) -> Result<()> {
    let mut seen = HashSet::new();
    for clip in clips {
        clip.validate()?;
        if !seen.insert(clip.id) {
            return Err(TimelineError::DuplicateClip(clip.id));
        }
    }
    Ok(())
}

fn sanitize_frame_rate(frame_rate: f64) -> f64 {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        frame_rate
    } else {
        DEFAULT_FRAME_RATE
    }
}
