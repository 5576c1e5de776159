// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions and the track registry.
//!
//! Tracks are ordered lanes of one kind. Clips are not stored on tracks;
//! membership is resolved from `Clip::track_id`, with the registry's
//! assignment map as a fallback.

use crate::clip::{ClipId, MediaKind};
use crate::error::{Result, TimelineError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Still frames and video
    Video,
    /// Audio
    Audio,
}

impl TrackKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }

    /// Short prefix used in track IDs
    fn prefix(&self) -> char {
        match self {
            Self::Video => 'v',
            Self::Audio => 'a',
        }
    }

    /// Track kind that hosts the given media
    pub fn for_media(media: MediaKind) -> Self {
        match media {
            MediaKind::Image | MediaKind::Video => Self::Video,
            MediaKind::Audio => Self::Audio,
        }
    }

    /// Whether clips of this media kind may live on this track kind
    pub fn accepts(&self, media: MediaKind) -> bool {
        Self::for_media(media) == *self
    }
}

/// Unique identifier for a track.
///
/// Ordinals are handed out once per session and never reused, so a stale ID
/// can never silently point at a newer track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackId {
    /// Track kind
    pub kind: TrackKind,
    /// 1-based ordinal within the kind
    pub ordinal: u32,
}

impl TrackId {
    /// Create a track ID
    pub const fn new(kind: TrackKind, ordinal: u32) -> Self {
        Self { kind, ordinal }
    }

    /// The permanent base track of a kind
    pub const fn base(kind: TrackKind) -> Self {
        Self { kind, ordinal: 1 }
    }

    /// Whether this is the permanent first track of its kind
    pub fn is_base(&self) -> bool {
        self.ordinal == 1
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.ordinal)
    }
}

impl FromStr for TrackId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('v' | 'V') => TrackKind::Video,
            Some('a' | 'A') => TrackKind::Audio,
            _ => return Err(format!("invalid track id: {s:?}")),
        };
        let ordinal: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("invalid track ordinal: {s:?}"))?;
        if ordinal == 0 {
            return Err(format!("track ordinals start at 1: {s:?}"));
        }
        Ok(Self { kind, ordinal })
    }
}

impl TryFrom<String> for TrackId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.to_string()
    }
}

/// A track lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
}

impl Track {
    /// Create a new track with a default name
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            name: format!("{} {}", id.kind.name(), id.ordinal),
        }
    }

    /// Track kind
    pub fn kind(&self) -> TrackKind {
        self.id.kind
    }

    /// Display order ordinal
    pub fn ordinal(&self) -> u32 {
        self.id.ordinal
    }
}

/// Ordered video and audio tracks plus the clip-to-track assignment map
#[derive(Debug, Clone)]
pub struct TrackRegistry {
    /// Tracks in creation order
    tracks: IndexMap<TrackId, Track>,
    /// Next unused video ordinal
    next_video: u32,
    /// Next unused audio ordinal
    next_audio: u32,
    /// Durable fallback for clips whose own `track_id` is absent
    assignments: HashMap<ClipId, TrackId>,
}

impl TrackRegistry {
    /// Create a registry holding the two permanent base tracks
    pub fn new() -> Self {
        let mut tracks = IndexMap::new();
        for kind in [TrackKind::Video, TrackKind::Audio] {
            let id = TrackId::base(kind);
            tracks.insert(id, Track::new(id));
        }
        Self {
            tracks,
            next_video: 2,
            next_audio: 2,
            assignments: HashMap::new(),
        }
    }

    /// Add a track of the given kind with the next unused ordinal
    pub fn add_track(&mut self, kind: TrackKind) -> TrackId {
        let counter = match kind {
            TrackKind::Video => &mut self.next_video,
            TrackKind::Audio => &mut self.next_audio,
        };
        let id = TrackId::new(kind, *counter);
        *counter += 1;
        self.tracks.insert(id, Track::new(id));
        tracing::debug!("Added track {id}");
        id
    }

    /// Register a track under its recorded ID if it is missing.
    ///
    /// Counters move past the ordinal so it is never handed out again.
    pub fn reinstate(&mut self, track: Track) {
        let counter = match track.id.kind {
            TrackKind::Video => &mut self.next_video,
            TrackKind::Audio => &mut self.next_audio,
        };
        *counter = (*counter).max(track.id.ordinal + 1);
        if !self.tracks.contains_key(&track.id) {
            tracing::debug!("Reinstated track {}", track.id);
            self.tracks.insert(track.id, track);
        }
    }

    /// Replace the track set with a recorded one (undo/redo).
    ///
    /// Base tracks always survive, and ordinals handed out since the recording
    /// stay retired.
    pub fn restore_tracks(&mut self, tracks: Vec<Track>) {
        let previous = std::mem::take(&mut self.tracks);
        for kind in [TrackKind::Video, TrackKind::Audio] {
            let id = TrackId::base(kind);
            let base = previous.get(&id).cloned().unwrap_or_else(|| Track::new(id));
            self.tracks.insert(id, base);
        }
        for track in tracks {
            self.tracks.shift_remove(&track.id);
            self.reinstate(track);
        }
        self.assignments.retain(|_, id| self.tracks.contains_key(id));
    }

    /// Whether deleting this track is forbidden
    pub fn is_protected(&self, id: TrackId) -> bool {
        id.is_base() || self.count(id.kind) <= 1
    }

    /// Remove a track.
    ///
    /// Clip cascade is the caller's job; this only drops the lane and any
    /// assignment entries pointing at it.
    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        if !self.tracks.contains_key(&id) {
            return Err(TimelineError::TrackNotFound(id));
        }
        if self.is_protected(id) {
            return Err(TimelineError::ProtectedTrack(id));
        }
        let track = self
            .tracks
            .shift_remove(&id)
            .ok_or(TimelineError::TrackNotFound(id))?;
        self.assignments.retain(|_, track_id| *track_id != id);
        Ok(track)
    }

    /// Get a track
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Whether a track exists
    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Number of tracks of a kind
    pub fn count(&self, kind: TrackKind) -> usize {
        self.tracks.keys().filter(|id| id.kind == kind).count()
    }

    /// Total number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the registry holds no tracks (never true in practice)
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks in display order: video by ordinal, then audio by ordinal
    pub fn ordered(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.values().collect();
        tracks.sort_by_key(|t| t.id);
        tracks
    }

    /// Record a clip's track in the assignment map
    pub fn assign(&mut self, clip: ClipId, track: TrackId) {
        self.assignments.insert(clip, track);
    }

    /// Forget a clip's assignment
    pub fn unassign(&mut self, clip: ClipId) {
        self.assignments.remove(&clip);
    }

    /// Look up a clip's assignment
    pub fn assignment(&self, clip: ClipId) -> Option<TrackId> {
        self.assignments.get(&clip).copied()
    }

    /// Drop all assignments
    pub fn clear_assignments(&mut self) {
        self.assignments.clear();
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
