// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-track timeline core for storyboard previsualization.
//!
//! This crate provides the editing model behind the storyboard timeline:
//! - Clip store with derived total duration and playhead
//! - Video and audio track registry with protected base tracks
//! - Frame and clip-edge snapping
//! - Non-destructive audio trimming
//! - Pointer/keyboard interaction state machine with undo/redo
//!
//! ## Architecture
//!
//! The core is synchronous and owns no rendering. [`Editor::dispatch`]
//! turns input events into store mutations and returns [`SideEffect`]s as
//! data; a rendering collaborator applies them, or receives them through a
//! [`TimelineObserver`].

pub mod audio_trim;
pub mod clip;
pub mod error;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod playback;
pub mod selection;
pub mod settings;
pub mod snap;
pub mod timeline;
pub mod track;
pub mod waveform;

pub use audio_trim::AudioTrim;
pub use clip::{Clip, ClipId, ClipMedia, MediaKind, SourceRef, MIN_CLIP_DURATION};
pub use error::{Result, TimelineError};
pub use geometry::{hit_test, ClipZone, HitTarget, Point, Rect, TrackLayout, Viewport};
pub use history::{History, HistoryEntry, HistoryError, HistoryStats};
pub use interaction::{
    Dispatch, EditState, Editor, InputEvent, Key, PendingCommit, SideEffect, TimelineObserver,
};
pub use playback::{PlaybackController, PlaybackState};
pub use selection::Selection;
pub use settings::{EditorSettings, SnapSettings};
pub use snap::{SnapResolver, SnapTarget, Snapped};
pub use timeline::{
    MediaProbe, MoveOutcome, StoryboardFrame, SyncReport, Timeline, TimelineSnapshot, TrackRemoval,
};
pub use track::{Track, TrackId, TrackKind, TrackRegistry};
pub use waveform::Waveform;
