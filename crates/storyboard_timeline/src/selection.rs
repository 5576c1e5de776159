// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection state.

use crate::clip::ClipId;
use crate::timeline::Timeline;
use crate::track::TrackId;
use indexmap::IndexSet;

/// Selected clips (in selection order) and an optional selected track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Selected clips
    clips: IndexSet<ClipId>,
    /// Selected track header
    track: Option<TrackId>,
}

impl Selection {
    /// Empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with one clip
    pub fn select_only(&mut self, clip: ClipId) {
        self.clips.clear();
        self.clips.insert(clip);
        self.track = None;
    }

    /// Add or remove one clip (Shift-click)
    pub fn toggle(&mut self, clip: ClipId) {
        if !self.clips.shift_remove(&clip) {
            self.clips.insert(clip);
        }
        self.track = None;
    }

    /// Replace the selection with a set of clips (rectangle select)
    pub fn select_many(&mut self, clips: impl IntoIterator<Item = ClipId>) {
        self.clips = clips.into_iter().collect();
        self.track = None;
    }

    /// Select a track header, dropping any clip selection
    pub fn select_track(&mut self, track: TrackId) {
        self.clips.clear();
        self.track = Some(track);
    }

    /// Clear everything
    pub fn clear(&mut self) {
        self.clips.clear();
        self.track = None;
    }

    /// Whether a clip is selected
    pub fn contains(&self, clip: ClipId) -> bool {
        self.clips.contains(&clip)
    }

    /// Selected clips in selection order
    pub fn clips(&self) -> Vec<ClipId> {
        self.clips.iter().copied().collect()
    }

    /// Selected track
    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty() && self.track.is_none()
    }

    /// Drop clips and tracks that no longer exist (after undo or deletion)
    pub fn retain_existing(&mut self, timeline: &Timeline) -> bool {
        let before = (self.clips.len(), self.track);
        self.clips.retain(|id| timeline.clip(*id).is_some());
        if self.track.is_some_and(|track| !timeline.tracks().contains(track)) {
            self.track = None;
        }
        before != (self.clips.len(), self.track)
    }
}
