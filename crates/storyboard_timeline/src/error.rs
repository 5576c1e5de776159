// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline operations.

use crate::clip::ClipId;
use crate::history::HistoryError;
use crate::track::TrackId;
use thiserror::Error;

/// Errors produced by the timeline store, track registry and editor.
///
/// None of these are fatal: a failed operation leaves the timeline exactly as
/// it was before the call.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Requested duration is non-finite or not strictly positive
    #[error("Invalid clip duration: {requested}s")]
    InvalidDuration {
        /// The rejected duration in seconds
        requested: f64,
    },

    /// The first track of a kind, or the last remaining one, cannot be deleted
    #[error("Track {0} is protected and cannot be deleted")]
    ProtectedTrack(TrackId),

    /// Storyboard-derived clips are owned by the storyboard
    #[error("Clip {0} comes from the storyboard; remove its frame from the storyboard instead")]
    StoryboardClipDeletion(ClipId),

    /// A clip points at a track that no longer exists
    #[error("Clip {clip} references missing track {track}")]
    OrphanTrackReference {
        /// The clip holding the stale reference
        clip: ClipId,
        /// The missing track
        track: TrackId,
    },

    /// No clip with this ID
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    /// No track with this ID
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// A clip with this ID is already on the timeline
    #[error("Clip already exists: {0}")]
    DuplicateClip(ClipId),

    /// Clip media cannot live on this kind of track
    #[error("Clip {clip} cannot be placed on track {track}")]
    IncompatibleTrack {
        /// The clip being placed
        clip: ClipId,
        /// The rejected track
        track: TrackId,
    },

    /// Source reference does not fit the media kind
    #[error("Invalid clip source: {0}")]
    InvalidSource(String),

    /// Undo/redo failure
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Snapshot JSON could not be encoded or decoded
    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

impl TimelineError {
    /// Whether the error should be shown to the user as a refusal.
    ///
    /// Orphan references are recovered locally and never reach the user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::OrphanTrackReference { .. })
    }
}
