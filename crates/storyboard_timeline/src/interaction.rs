// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit interaction state machine.
//!
//! [`Editor::dispatch`] consumes one input event, drives the timeline through
//! the snap resolver and history, and returns the new state together with
//! the side effects for the rendering collaborator. Nothing is written to
//! the timeline before a pointer-up commits, so cancelling a drag is free.
//!
//! ```text
//! Idle -> Selecting ------------------------------> Idle
//! Idle -> PreparingDrag -> Moving ----------------> Idle | AwaitingConfirmation
//! Idle -> ResizingLeft | ResizingRight -----------> Idle
//! ```

use crate::clip::{Clip, ClipId, MIN_CLIP_DURATION};
use crate::error::{Result, TimelineError};
use crate::geometry::{
    clips_in_rect, hit_test, ClipZone, HitTarget, Point, Rect, TrackLayout, Viewport,
};
use crate::history::{History, HistoryError, HistoryStats};
use crate::playback::PlaybackController;
use crate::selection::Selection;
use crate::settings::EditorSettings;
use crate::snap::SnapResolver;
use crate::timeline::{MediaProbe, StoryboardFrame, Timeline};
use crate::track::{TrackId, TrackKind};
use serde::{Deserialize, Serialize};

/// Keyboard keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Cancel the current gesture
    Escape,
    /// Delete the selection
    Delete,
    /// Delete the selection
    Backspace,
}

/// Input delivered to the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Primary button pressed
    PointerDown {
        /// Pointer position
        position: Point,
        /// Shift held (toggle selection)
        #[serde(default)]
        shift: bool,
    },
    /// Pointer moved
    PointerMove {
        /// Pointer position
        position: Point,
    },
    /// Primary button released
    PointerUp {
        /// Pointer position
        position: Point,
    },
    /// Pointer capture lost
    PointerCancel,
    /// Key pressed
    Key(Key),
    /// Undo the last edit
    Undo,
    /// Redo the last undone edit
    Redo,
    /// Accept a pending confirmation
    Confirm,
    /// Reject a pending confirmation
    Cancel,
    /// Track header clicked
    SelectTrack(TrackId),
    /// Add a track
    AddTrack(TrackKind),
    /// Imported file dropped onto the timeline
    DropClip(Clip),
    /// Storyboard changed
    SyncStoryboard(Vec<StoryboardFrame>),
    /// Asynchronous decode finished
    MediaProbed {
        /// Clip the decode was started for
        clip: ClipId,
        /// Decoded data
        probe: MediaProbe,
    },
    /// Toggle ripple editing
    SetRippleMode(bool),
    /// Set horizontal zoom (pixels per second)
    SetZoom(f64),
    /// Scroll the view
    ScrollBy {
        /// Horizontal scroll (pixels)
        dx: f64,
        /// Vertical scroll (pixels)
        dy: f64,
    },
    /// Move the playhead
    Seek(f64),
    /// Play or pause
    TogglePlayback,
    /// Frame clock tick (seconds elapsed)
    Tick(f64),
}

/// Where a dragged clip would land
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPreview {
    /// Snapped start time
    pub start_time: f64,
    /// Destination track
    pub track: TrackId,
}

/// A body drag in progress
#[derive(Debug, Clone, PartialEq)]
pub struct MoveDrag {
    /// Dragged clip
    pub clip: ClipId,
    /// Pointer position at pointer-down
    pub origin: Point,
    /// Pointer offset from the clip's left edge (pixels)
    pub grab_offset_px: f64,
    /// Track the drag started on
    pub origin_track: TrackId,
    /// Start time before the drag
    pub original_start: f64,
    /// Shift held at pointer-down
    pub additive: bool,
    /// Current preview
    pub preview: DragPreview,
}

/// An edge drag in progress
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    /// Resized clip
    pub clip: ClipId,
    /// Pointer position at pointer-down
    pub origin: Point,
    /// Track of the clip
    pub track: TrackId,
    /// Start time before the drag
    pub original_start: f64,
    /// Duration before the drag
    pub original_duration: f64,
    /// Previewed start time
    pub preview_start: f64,
    /// Previewed duration
    pub preview_duration: f64,
}

impl ResizeDrag {
    fn original_end(&self) -> f64 {
        self.original_start + self.original_duration
    }

    fn unchanged(&self) -> bool {
        self.preview_start == self.original_start && self.preview_duration == self.original_duration
    }
}

/// An edit waiting for the user's go-ahead
#[derive(Debug, Clone, PartialEq)]
pub enum PendingCommit {
    /// Storyboard clip move needing scene/shot metadata reconciliation
    StoryboardMove {
        /// Moved clip
        clip: ClipId,
        /// New start time
        start_time: f64,
        /// Destination track
        track: TrackId,
    },
    /// Track deletion taking clips with it
    RemoveTrack {
        /// Track to delete
        track: TrackId,
        /// Clips that would be deleted
        clip_count: usize,
    },
}

/// Interaction state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    /// Waiting for input
    #[default]
    Idle,
    /// Rectangle selection
    Selecting {
        /// Corner where the drag started
        origin: Point,
        /// Opposite corner
        current: Point,
        /// Shift held at pointer-down
        additive: bool,
    },
    /// Pointer down on a clip body, below the drag threshold
    PreparingDrag(MoveDrag),
    /// Dragging a clip body
    Moving(MoveDrag),
    /// Dragging a clip's left edge
    ResizingLeft(ResizeDrag),
    /// Dragging a clip's right edge
    ResizingRight(ResizeDrag),
    /// Modal confirmation
    AwaitingConfirmation(PendingCommit),
}

impl EditState {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Selecting { .. } => "Selecting",
            Self::PreparingDrag(_) => "PreparingDrag",
            Self::Moving(_) => "Moving",
            Self::ResizingLeft(_) => "ResizingLeft",
            Self::ResizingRight(_) => "ResizingRight",
            Self::AwaitingConfirmation(_) => "AwaitingConfirmation",
        }
    }
}

/// Effects for collaborators, returned as data
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Draw a clip at a provisional position
    PreviewDrag {
        /// Dragged clip
        clip: ClipId,
        /// Provisional start time
        start_time: f64,
        /// Provisional track
        track: TrackId,
    },
    /// Draw a clip with provisional bounds
    PreviewResize {
        /// Resized clip
        clip: ClipId,
        /// Provisional start time
        start_time: f64,
        /// Provisional duration
        duration: f64,
    },
    /// Drop any provisional drawing
    ClearPreview,
    /// Selection changed
    SelectionChanged {
        /// Selected clips
        clips: Vec<ClipId>,
        /// Selected track
        track: Option<TrackId>,
    },
    /// An edit was committed and recorded
    HistoryRecorded {
        /// Edit description
        description: String,
    },
    /// Undo or redo restored a recorded state
    HistoryRestored {
        /// Description of the undone or redone edit
        description: String,
    },
    /// Playhead or timeline changed
    TimeUpdate(f64),
    /// Clip shown at the playhead
    FrameChange(Option<ClipId>),
    /// Audio clip needs its waveform redrawn
    RefreshWaveform(ClipId),
    /// Visual clip needs its thumbnail redrawn
    RefreshVisual(ClipId),
    /// Ask the user to reconcile storyboard metadata for a move
    ConfirmStoryboardMove {
        /// Moved clip
        clip: ClipId,
        /// New start time
        start_time: f64,
    },
    /// Ask the user before deleting a track with clips
    ConfirmTrackRemoval {
        /// Track to delete
        track: TrackId,
        /// Clips that would be deleted
        clip_count: usize,
    },
    /// An operation was refused
    Rejected(String),
}

/// Result of dispatching one event
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// State after the event
    pub state: EditState,
    /// Effects to apply
    pub effects: Vec<SideEffect>,
}

/// Rendering collaborator callbacks
pub trait TimelineObserver {
    /// Playhead moved or the timeline changed
    fn on_time_update(&mut self, time: f64);
    /// Clip at the playhead changed
    fn on_frame_change(&mut self, clip: Option<&Clip>);
}

/// Timeline editor: owns the store, history and interaction state
#[derive(Debug)]
pub struct Editor {
    timeline: Timeline,
    history: History,
    selection: Selection,
    playback: PlaybackController,
    viewport: Viewport,
    settings: EditorSettings,
    ripple_enabled: bool,
    state: EditState,
    frame_clip: Option<ClipId>,
}

impl Editor {
    /// Create an editor over an empty timeline
    pub fn new(settings: EditorSettings) -> Self {
        let timeline = Timeline::new(settings.frame_rate);
        Self::with_timeline(timeline, settings)
    }

    /// Create an editor over an existing timeline
    pub fn with_timeline(timeline: Timeline, settings: EditorSettings) -> Self {
        let frame_clip = timeline.clip_at_time(timeline.current_time()).map(|c| c.id);
        Self {
            history: History::with_max_depth(settings.max_history),
            selection: Selection::new(),
            playback: PlaybackController::new(),
            viewport: Viewport::new(settings.pixels_per_second),
            ripple_enabled: settings.ripple_enabled,
            state: EditState::Idle,
            frame_clip,
            timeline,
            settings,
        }
    }

    /// The timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current interaction state
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Current view
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Settings in effect
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Playback controller
    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Whether ripple editing is on
    pub fn ripple_enabled(&self) -> bool {
        self.ripple_enabled
    }

    /// History statistics
    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    /// Whether undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Row layout of the current tracks
    pub fn layout(&self) -> TrackLayout {
        TrackLayout::new(&self.timeline, self.settings.track_height_px)
    }

    /// Process one event
    pub fn dispatch(&mut self, event: InputEvent) -> Dispatch {
        let mut effects = Vec::new();
        let state = std::mem::take(&mut self.state);
        let previous = state.name();

        let next = match event {
            InputEvent::PointerDown { position, shift } => {
                self.pointer_down(state, position, shift, &mut effects)
            }
            InputEvent::PointerMove { position } => {
                self.pointer_move(state, position, &mut effects)
            }
            InputEvent::PointerUp { position } => self.pointer_up(state, position, &mut effects),
            InputEvent::PointerCancel => self.cancel_gesture(state, &mut effects),
            InputEvent::Key(Key::Escape) => self.escape(state, &mut effects),
            InputEvent::Key(Key::Delete | Key::Backspace) => {
                self.delete_selection(state, &mut effects)
            }
            InputEvent::Undo => self.step_history(state, true, &mut effects),
            InputEvent::Redo => self.step_history(state, false, &mut effects),
            InputEvent::Confirm => self.confirm(state, &mut effects),
            InputEvent::Cancel => self.cancel_confirmation(state),
            InputEvent::SelectTrack(track) => self.select_track(state, track, &mut effects),
            InputEvent::AddTrack(kind) => {
                self.add_track(kind, &mut effects);
                state
            }
            InputEvent::DropClip(clip) => {
                self.drop_clip(clip, &mut effects);
                state
            }
            InputEvent::SyncStoryboard(frames) => {
                self.sync_storyboard(&frames, &mut effects);
                state
            }
            InputEvent::MediaProbed { clip, probe } => {
                self.media_probed(clip, probe, &mut effects);
                state
            }
            InputEvent::SetRippleMode(enabled) => {
                self.ripple_enabled = enabled;
                tracing::debug!("Ripple editing {}", if enabled { "on" } else { "off" });
                state
            }
            InputEvent::SetZoom(pixels_per_second) => {
                self.viewport.pixels_per_second = self.settings.clamp_zoom(pixels_per_second);
                state
            }
            InputEvent::ScrollBy { dx, dy } => {
                self.scroll_by(dx, dy);
                state
            }
            InputEvent::Seek(time) => {
                self.playback.seek(time, &mut self.timeline);
                self.push_playhead_effects(&mut effects);
                state
            }
            InputEvent::TogglePlayback => {
                self.playback.toggle_playback(&mut self.timeline);
                self.push_playhead_effects(&mut effects);
                state
            }
            InputEvent::Tick(delta_time) => {
                if self.playback.tick(delta_time, &mut self.timeline).is_some() {
                    self.push_playhead_effects(&mut effects);
                }
                state
            }
        };

        if next.name() != previous {
            tracing::debug!("Edit state {previous} -> {}", next.name());
        }
        self.state = next;
        Dispatch {
            state: self.state.clone(),
            effects,
        }
    }

    /// Forward render effects to an observer
    pub fn notify(&self, effects: &[SideEffect], observer: &mut dyn TimelineObserver) {
        for effect in effects {
            match effect {
                SideEffect::TimeUpdate(time) => observer.on_time_update(*time),
                SideEffect::FrameChange(clip) => {
                    observer.on_frame_change(clip.and_then(|id| self.timeline.clip(id)));
                }
                _ => {}
            }
        }
    }

    fn pointer_down(
        &mut self,
        state: EditState,
        position: Point,
        shift: bool,
        effects: &mut Vec<SideEffect>,
    ) -> EditState {
        if state != EditState::Idle {
            return state;
        }

        let layout = self.layout();
        match hit_test(position, &self.timeline, &layout, &self.viewport, &self.settings) {
            HitTarget::Outside => EditState::Idle,
            HitTarget::EmptyTrack(_) => EditState::Selecting {
                origin: position,
                current: position,
                additive: shift,
            },
            HitTarget::Clip { id, zone } => {
                let Some(clip) = self.timeline.clip(id) else {
                    return EditState::Idle;
                };
                let track = self.timeline.resolve_track(clip);

                match zone {
                    ClipZone::Body => {
                        let preview = DragPreview {
                            start_time: clip.start_time(),
                            track,
                        };
                        EditState::PreparingDrag(MoveDrag {
                            clip: id,
                            origin: position,
                            grab_offset_px: position.x - self.viewport.time_to_x(clip.start_time()),
                            origin_track: track,
                            original_start: clip.start_time(),
                            additive: shift,
                            preview,
                        })
                    }
                    ClipZone::LeftHandle | ClipZone::RightHandle => {
                        let drag = ResizeDrag {
                            clip: id,
                            origin: position,
                            track,
                            original_start: clip.start_time(),
                            original_duration: clip.duration(),
                            preview_start: clip.start_time(),
                            preview_duration: clip.duration(),
                        };
                        if !self.selection.contains(id) {
                            self.selection.select_only(id);
                            self.push_selection(effects);
                        }
                        if zone == ClipZone::LeftHandle {
                            EditState::ResizingLeft(drag)
                        } else {
                            EditState::ResizingRight(drag)
                        }
                    }
                }
            }
        }
    }

    fn pointer_move(
        &mut self,
        state: EditState,
        position: Point,
        effects: &mut Vec<SideEffect>,
    ) -> EditState {
        match state {
            EditState::Selecting { origin, additive, .. } => EditState::Selecting {
                origin,
                current: position,
                additive,
            },
            EditState::PreparingDrag(drag) if !self.past_threshold(drag.origin, position) => {
                EditState::PreparingDrag(drag)
            }
            EditState::PreparingDrag(drag) | EditState::Moving(drag) => {
                self.update_move(drag, position, effects)
            }
            EditState::ResizingLeft(drag) => match self.preview_resize(drag, position, true) {
                Some(drag) => {
                    push_resize_preview(&drag, effects);
                    EditState::ResizingLeft(drag)
                }
                None => self.abort_missing(effects),
            },
            EditState::ResizingRight(drag) => match self.preview_resize(drag, position, false) {
                Some(drag) => {
                    push_resize_preview(&drag, effects);
                    EditState::ResizingRight(drag)
                }
                None => self.abort_missing(effects),
            },
            other => other,
        }
    }

    fn pointer_up(
        &mut self,
        state: EditState,
        position: Point,
        effects: &mut Vec<SideEffect>,
    ) -> EditState {
        match state {
            EditState::Selecting { origin, additive, .. } => {
                self.finish_rectangle(origin, position, additive, effects);
                EditState::Idle
            }
            EditState::PreparingDrag(drag) => {
                self.click_clip(drag.clip, drag.additive, effects);
                EditState::Idle
            }
            EditState::Moving(drag) => {
                effects.push(SideEffect::ClearPreview);
                if !self.past_threshold(drag.origin, position) {
                    self.click_clip(drag.clip, drag.additive, effects);
                    return EditState::Idle;
                }
                let drag = match self.update_move(drag, position, &mut Vec::new()) {
                    EditState::Moving(drag) => drag,
                    other => return other,
                };
                self.finish_move(drag, effects)
            }
            EditState::ResizingLeft(drag) => {
                effects.push(SideEffect::ClearPreview);
                if let Some(drag) = self.preview_resize(drag, position, true) {
                    self.commit_resize(&drag, true, effects);
                }
                EditState::Idle
            }
            EditState::ResizingRight(drag) => {
                effects.push(SideEffect::ClearPreview);
                if let Some(drag) = self.preview_resize(drag, position, false) {
                    self.commit_resize(&drag, false, effects);
                }
                EditState::Idle
            }
            other => other,
        }
    }

    fn past_threshold(&self, origin: Point, position: Point) -> bool {
        origin.distance(position) > self.settings.drag_threshold_px
    }

    fn update_move(
        &mut self,
        mut drag: MoveDrag,
        position: Point,
        effects: &mut Vec<SideEffect>,
    ) -> EditState {
        let Some(clip) = self.timeline.clip(drag.clip) else {
            return self.abort_missing(effects);
        };

        let kind = TrackKind::for_media(clip.kind());
        let layout = self.layout();
        let track = match layout.track_at_y(position.y, &self.viewport) {
            Some(track) if track.kind == kind => track,
            Some(_) => drag.preview.track,
            None => layout
                .nearest_track_of_kind(position.y, kind, &self.viewport)
                .unwrap_or(drag.preview.track),
        };
        let candidate = self.viewport.x_to_time(position.x - drag.grab_offset_px).max(0.0);
        let resolver = SnapResolver::new(
            &self.timeline,
            &self.settings.snap,
            self.viewport.pixels_per_second,
        );
        let start_time = resolver.snap(candidate, clip, track);

        drag.preview = DragPreview { start_time, track };
        effects.push(SideEffect::PreviewDrag {
            clip: drag.clip,
            start_time,
            track,
        });
        EditState::Moving(drag)
    }

    fn finish_move(&mut self, drag: MoveDrag, effects: &mut Vec<SideEffect>) -> EditState {
        let DragPreview { start_time, track } = drag.preview;
        if start_time == drag.original_start && track == drag.origin_track {
            return EditState::Idle;
        }
        let Some(clip) = self.timeline.clip(drag.clip) else {
            return EditState::Idle;
        };

        if clip.is_external() {
            self.commit_move(drag.clip, start_time, track, effects);
            EditState::Idle
        } else {
            effects.push(SideEffect::ConfirmStoryboardMove {
                clip: drag.clip,
                start_time,
            });
            EditState::AwaitingConfirmation(PendingCommit::StoryboardMove {
                clip: drag.clip,
                start_time,
                track,
            })
        }
    }

    fn commit_move(
        &mut self,
        id: ClipId,
        start_time: f64,
        track: TrackId,
        effects: &mut Vec<SideEffect>,
    ) {
        let ripple = self.ripple_enabled;
        let result = self.commit("Move clip", effects, |timeline| {
            let destination = (timeline.track_of(id)? != track).then_some(track);
            let outcome = timeline.move_clip_to_track(id, start_time, destination)?;
            if ripple && track.kind == TrackKind::Video {
                timeline.recalculate(Some(track));
            }
            Ok(outcome)
        });

        match result {
            Ok(outcome) => {
                self.push_refresh(id, effects);
                for trimmed in &outcome.trimmed {
                    effects.push(SideEffect::RefreshWaveform(*trimmed));
                }
                if !outcome.removed.is_empty() && self.selection.retain_existing(&self.timeline) {
                    self.push_selection(effects);
                }
            }
            Err(err) => self.reject(err, effects),
        }
    }

    fn preview_resize(
        &self,
        mut drag: ResizeDrag,
        position: Point,
        left: bool,
    ) -> Option<ResizeDrag> {
        let clip = self.timeline.clip(drag.clip)?;
        let delta = self.viewport.px_to_seconds(position.x - drag.origin.x);
        let resolver = SnapResolver::new(
            &self.timeline,
            &self.settings.snap,
            self.viewport.pixels_per_second,
        );
        let original_end = drag.original_end();

        if left {
            let earliest = clip
                .audio()
                .map_or(0.0, |trim| (drag.original_start - trim.source_in_offset()).max(0.0));
            let start = resolver
                .snap_edge(drag.original_start + delta, clip, drag.track)
                .max(earliest)
                .min(original_end - MIN_CLIP_DURATION);
            drag.preview_start = start;
            drag.preview_duration = original_end - start;
        } else {
            let end = resolver.snap_edge(original_end + delta, clip, drag.track);
            let mut duration = (end - drag.original_start).max(MIN_CLIP_DURATION);
            if let Some(trim) = clip.audio() {
                duration = duration.min(trim.max_duration());
            }
            drag.preview_start = drag.original_start;
            drag.preview_duration = duration;
        }
        Some(drag)
    }

    fn commit_resize(&mut self, drag: &ResizeDrag, left: bool, effects: &mut Vec<SideEffect>) {
        if drag.unchanged() {
            return;
        }
        let id = drag.clip;
        let ripple = self.ripple_enabled;
        let (start, duration) = (drag.preview_start, drag.preview_duration);
        let trim = start - drag.original_start;

        // a left trim keeps the right edge, so there is nothing to ripple
        let description = if left { "Trim clip start" } else { "Resize clip" };
        let result = self.commit(description, effects, |timeline| {
            if left {
                timeline.trim_clip_start(id, trim)?;
            } else if ripple {
                timeline.resize_clip_rippled(id, duration)?;
            } else {
                timeline.resize_clip(id, duration)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => self.push_refresh(id, effects),
            Err(err) => self.reject(err, effects),
        }
    }

    fn finish_rectangle(
        &mut self,
        origin: Point,
        position: Point,
        additive: bool,
        effects: &mut Vec<SideEffect>,
    ) {
        if !self.past_threshold(origin, position) {
            if !additive && !self.selection.is_empty() {
                self.selection.clear();
                self.push_selection(effects);
            }
            return;
        }

        let rect = Rect::from_corners(origin, position);
        let mut clips = if additive { self.selection.clips() } else { Vec::new() };
        for id in clips_in_rect(&rect, &self.timeline, &self.layout(), &self.viewport) {
            if !clips.contains(&id) {
                clips.push(id);
            }
        }
        self.selection.select_many(clips);
        self.push_selection(effects);
    }

    fn click_clip(&mut self, clip: ClipId, additive: bool, effects: &mut Vec<SideEffect>) {
        if additive {
            self.selection.toggle(clip);
        } else {
            self.selection.select_only(clip);
        }
        self.push_selection(effects);
    }

    fn select_track(
        &mut self,
        state: EditState,
        track: TrackId,
        effects: &mut Vec<SideEffect>,
    ) -> EditState {
        if state != EditState::Idle {
            return state;
        }
        if self.timeline.tracks().contains(track) {
            self.selection.select_track(track);
            self.push_selection(effects);
        } else {
            self.reject(TimelineError::TrackNotFound(track), effects);
        }
        EditState::Idle
    }

    fn cancel_gesture(&mut self, state: EditState, effects: &mut Vec<SideEffect>) -> EditState {
        match state {
            EditState::AwaitingConfirmation(_) | EditState::Idle => state,
            EditState::Moving(_) | EditState::ResizingLeft(_) | EditState::ResizingRight(_) => {
                effects.push(SideEffect::ClearPreview);
                EditState::Idle
            }
            EditState::Selecting { .. } | EditState::PreparingDrag(_) => EditState::Idle,
        }
    }

    fn escape(&mut self, state: EditState, effects: &mut Vec<SideEffect>) -> EditState {
        match state {
            EditState::AwaitingConfirmation(_) => self.cancel_confirmation(state),
            EditState::Idle => {
                if !self.selection.is_empty() {
                    self.selection.clear();
                    self.push_selection(effects);
                }
                EditState::Idle
            }
            other => self.cancel_gesture(other, effects),
        }
    }

    fn abort_missing(&mut self, effects: &mut Vec<SideEffect>) -> EditState {
        tracing::warn!("Dragged clip disappeared; cancelling gesture");
        effects.push(SideEffect::ClearPreview);
        EditState::Idle
    }

    fn delete_selection(&mut self, state: EditState, effects: &mut Vec<SideEffect>) -> EditState {
        if state != EditState::Idle {
            return state;
        }

        if let Some(track) = self.selection.track() {
            return match self.timeline.track_removal_impact(track) {
                Ok(0) => {
                    self.remove_track(track, effects);
                    EditState::Idle
                }
                Ok(clip_count) => {
                    effects.push(SideEffect::ConfirmTrackRemoval { track, clip_count });
                    EditState::AwaitingConfirmation(PendingCommit::RemoveTrack {
                        track,
                        clip_count,
                    })
                }
                Err(err) => {
                    self.reject(err, effects);
                    EditState::Idle
                }
            };
        }

        let mut deletable = Vec::new();
        for id in self.selection.clips() {
            match self.timeline.clip(id) {
                Some(clip) if clip.is_external() => deletable.push(id),
                Some(_) => self.reject(TimelineError::StoryboardClipDeletion(id), effects),
                None => {}
            }
        }
        if deletable.is_empty() {
            return EditState::Idle;
        }

        let description = if deletable.len() == 1 { "Delete clip" } else { "Delete clips" };
        let result = self.commit(description, effects, |timeline| {
            for id in &deletable {
                timeline.remove_clip(*id)?;
            }
            Ok(())
        });
        match result {
            Ok(()) => {
                self.selection.retain_existing(&self.timeline);
                self.push_selection(effects);
            }
            Err(err) => self.reject(err, effects),
        }
        EditState::Idle
    }

    fn remove_track(&mut self, track: TrackId, effects: &mut Vec<SideEffect>) {
        match self.commit("Delete track", effects, |timeline| timeline.remove_track(track)) {
            Ok(_) => {
                self.selection.retain_existing(&self.timeline);
                self.push_selection(effects);
            }
            Err(err) => self.reject(err, effects),
        }
    }

    fn confirm(&mut self, state: EditState, effects: &mut Vec<SideEffect>) -> EditState {
        let EditState::AwaitingConfirmation(pending) = state else {
            return state;
        };
        match pending {
            PendingCommit::StoryboardMove { clip, start_time, track } => {
                self.commit_move(clip, start_time, track, effects);
            }
            PendingCommit::RemoveTrack { track, .. } => self.remove_track(track, effects),
        }
        EditState::Idle
    }

    fn cancel_confirmation(&mut self, state: EditState) -> EditState {
        match state {
            EditState::AwaitingConfirmation(pending) => {
                tracing::debug!("Abandoned pending edit: {pending:?}");
                EditState::Idle
            }
            other => other,
        }
    }

    fn step_history(
        &mut self,
        state: EditState,
        undo: bool,
        effects: &mut Vec<SideEffect>,
    ) -> EditState {
        if state != EditState::Idle {
            let action = if undo { "undo" } else { "redo" };
            tracing::debug!("Ignoring {action} during {}", state.name());
            return state;
        }

        let description = if undo {
            self.history.undo_description()
        } else {
            self.history.redo_description()
        };
        let description = description.unwrap_or_default().to_string();
        let entry = if undo { self.history.undo() } else { self.history.redo() };

        match entry {
            Ok(entry) => match self.timeline.restore_entry(entry) {
                Ok(()) => {
                    tracing::info!("{} {description}", if undo { "Undo" } else { "Redo" });
                    effects.push(SideEffect::HistoryRestored { description });
                    if self.selection.retain_existing(&self.timeline) {
                        self.push_selection(effects);
                    }
                    self.push_render_effects(effects);
                }
                Err(err) => {
                    tracing::error!("Failed to restore history entry: {err}");
                    self.reject(err, effects);
                }
            },
            Err(HistoryError::NothingToUndo | HistoryError::NothingToRedo) => {
                tracing::debug!("Nothing to {}", if undo { "undo" } else { "redo" });
            }
            Err(err) => self.reject(err.into(), effects),
        }
        EditState::Idle
    }

    fn add_track(&mut self, kind: TrackKind, effects: &mut Vec<SideEffect>) {
        match self.commit("Add track", effects, |timeline| Ok(timeline.add_track(kind))) {
            Ok(track) => tracing::debug!("New {} track {track}", kind.name()),
            Err(err) => self.reject(err, effects),
        }
    }

    fn drop_clip(&mut self, clip: Clip, effects: &mut Vec<SideEffect>) {
        match self.commit("Add clip", effects, |timeline| timeline.add_clip(clip)) {
            Ok(id) => self.push_refresh(id, effects),
            Err(err) => self.reject(err, effects),
        }
    }

    fn sync_storyboard(&mut self, frames: &[StoryboardFrame], effects: &mut Vec<SideEffect>) {
        match self.commit("Sync storyboard", effects, |timeline| timeline.sync_storyboard(frames)) {
            Ok(report) => {
                for id in report.added.iter().chain(&report.updated) {
                    effects.push(SideEffect::RefreshVisual(*id));
                }
                if !report.removed.is_empty() && self.selection.retain_existing(&self.timeline) {
                    self.push_selection(effects);
                }
            }
            Err(err) => self.reject(err, effects),
        }
    }

    fn media_probed(&mut self, id: ClipId, probe: MediaProbe, effects: &mut Vec<SideEffect>) {
        match self.timeline.apply_media_probe(id, probe) {
            Ok(true) => {
                self.push_refresh(id, effects);
                self.push_render_effects(effects);
            }
            Ok(false) => {}
            Err(err) => self.reject(err, effects),
        }
    }

    fn scroll_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() {
            let offset = self.viewport.scroll_offset + self.viewport.px_to_seconds(dx);
            self.viewport.scroll_offset = offset.max(0.0);
        }
        if dy.is_finite() {
            self.viewport.vertical_scroll = (self.viewport.vertical_scroll + dy).max(0.0);
        }
    }

    /// Run an edit as a transaction.
    ///
    /// On error the pre-edit state is restored and nothing is recorded.
    fn commit<T>(
        &mut self,
        description: &str,
        effects: &mut Vec<SideEffect>,
        edit: impl FnOnce(&mut Timeline) -> Result<T>,
    ) -> Result<T> {
        let before = self.timeline.capture();
        let outcome = edit(&mut self.timeline).and_then(|value| {
            let after = self.timeline.capture();
            Ok((value, self.history.record(description, &before, &after)?))
        });

        match outcome {
            Ok((value, recorded)) => {
                if recorded.is_some() {
                    tracing::info!("{description}");
                    effects.push(SideEffect::HistoryRecorded {
                        description: description.to_string(),
                    });
                }
                self.push_render_effects(effects);
                Ok(value)
            }
            Err(err) => {
                if let Err(restore_err) = self.timeline.restore_entry(before) {
                    tracing::error!("Failed to roll back {description}: {restore_err}");
                }
                Err(err)
            }
        }
    }

    fn reject(&self, err: TimelineError, effects: &mut Vec<SideEffect>) {
        if err.is_user_facing() {
            tracing::warn!("Refused: {err}");
            effects.push(SideEffect::Rejected(err.to_string()));
        } else {
            tracing::debug!("Recovered: {err}");
        }
    }

    fn push_selection(&self, effects: &mut Vec<SideEffect>) {
        effects.push(SideEffect::SelectionChanged {
            clips: self.selection.clips(),
            track: self.selection.track(),
        });
    }

    fn push_refresh(&self, id: ClipId, effects: &mut Vec<SideEffect>) {
        match self.timeline.clip(id) {
            Some(clip) if clip.is_audio() => effects.push(SideEffect::RefreshWaveform(id)),
            Some(_) => effects.push(SideEffect::RefreshVisual(id)),
            None => {}
        }
    }

    /// Time and frame notifications after a committed change
    fn push_render_effects(&mut self, effects: &mut Vec<SideEffect>) {
        let time = self.timeline.current_time();
        self.frame_clip = self.timeline.clip_at_time(time).map(|c| c.id);
        effects.push(SideEffect::TimeUpdate(time));
        effects.push(SideEffect::FrameChange(self.frame_clip));
    }

    /// Time notification, plus a frame notification if the shown clip changed
    fn push_playhead_effects(&mut self, effects: &mut Vec<SideEffect>) {
        let time = self.timeline.current_time();
        effects.push(SideEffect::TimeUpdate(time));
        let frame = self.timeline.clip_at_time(time).map(|c| c.id);
        if frame != self.frame_clip {
            self.frame_clip = frame;
            effects.push(SideEffect::FrameChange(frame));
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

fn push_resize_preview(drag: &ResizeDrag, effects: &mut Vec<SideEffect>) {
    effects.push(SideEffect::PreviewResize {
        clip: drag.clip,
        start_time: drag.preview_start,
        duration: drag.preview_duration,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::MediaKind;

    // 100 px per second, 48 px rows: v1 is y 0..48, a1 is y 48..96

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn editor_with(clips: Vec<Clip>) -> (Editor, Vec<ClipId>) {
        let mut timeline = Timeline::default();
        let ids = clips
            .into_iter()
            .map(|clip| timeline.add_clip(clip).unwrap())
            .collect();
        (Editor::with_timeline(timeline, EditorSettings::default()), ids)
    }

    fn still(start: f64, duration: f64) -> Clip {
        Clip::imported_visual("still.png", MediaKind::Image, start, duration).unwrap()
    }

    fn down(editor: &mut Editor, x: f64, y: f64) -> Dispatch {
        editor.dispatch(InputEvent::PointerDown {
            position: Point::new(x, y),
            shift: false,
        })
    }

    fn drag(editor: &mut Editor, x: f64, y: f64) -> Dispatch {
        editor.dispatch(InputEvent::PointerMove {
            position: Point::new(x, y),
        })
    }

    fn up(editor: &mut Editor, x: f64, y: f64) -> Dispatch {
        editor.dispatch(InputEvent::PointerUp {
            position: Point::new(x, y),
        })
    }

    #[test]
    fn test_click_below_threshold_selects_without_moving() {
        let (mut editor, ids) = editor_with(vec![still(1.0, 2.0)]);

        let result = down(&mut editor, 200.0, 20.0);
        assert!(matches!(result.state, EditState::PreparingDrag(_)));
        let result = drag(&mut editor, 203.0, 20.0);
        assert!(matches!(result.state, EditState::PreparingDrag(_)));
        assert!(result.effects.is_empty());

        let result = up(&mut editor, 203.0, 20.0);
        assert_eq!(result.state, EditState::Idle);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 1.0);
        assert_eq!(editor.selection().clips(), ids);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_drag_previews_then_commits_on_release() {
        let (mut editor, ids) = editor_with(vec![still(1.0, 2.0)]);

        down(&mut editor, 150.0, 20.0);
        let result = drag(&mut editor, 250.0, 20.0);
        assert!(matches!(result.state, EditState::Moving(_)));
        assert_eq!(
            result.effects,
            vec![SideEffect::PreviewDrag {
                clip: ids[0],
                start_time: 2.0,
                track: TrackId::base(TrackKind::Video),
            }]
        );
        // preview never writes to the store
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 1.0);

        let result = up(&mut editor, 250.0, 20.0);
        assert_eq!(result.state, EditState::Idle);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 2.0);
        assert!(result.effects.contains(&SideEffect::HistoryRecorded {
            description: "Move clip".to_string()
        }));
    }

    #[test]
    fn test_move_snaps_to_frame_boundary() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 2.0)]);

        down(&mut editor, 100.0, 20.0);
        drag(&mut editor, 201.3, 20.0);
        up(&mut editor, 201.3, 20.0);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 1.0);
    }

    #[test]
    fn test_escape_cancels_drag_without_commit() {
        let (mut editor, ids) = editor_with(vec![still(1.0, 2.0)]);

        down(&mut editor, 150.0, 20.0);
        drag(&mut editor, 400.0, 20.0);
        let result = editor.dispatch(InputEvent::Key(Key::Escape));
        assert_eq!(result.state, EditState::Idle);
        assert_eq!(result.effects, vec![SideEffect::ClearPreview]);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 1.0);

        down(&mut editor, 150.0, 20.0);
        drag(&mut editor, 400.0, 20.0);
        editor.dispatch(InputEvent::PointerCancel);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 1.0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_drag_onto_other_kind_keeps_compatible_track() {
        let (mut editor, ids) = editor_with(vec![still(1.0, 2.0)]);

        down(&mut editor, 150.0, 20.0);
        let result = drag(&mut editor, 160.0, 70.0);
        let EditState::Moving(drag) = result.state else {
            panic!("expected Moving, got {:?}", result.state);
        };
        assert_eq!(drag.preview.track, TrackId::base(TrackKind::Video));
        up(&mut editor, 160.0, 70.0);
        assert_eq!(editor.timeline().track_of(ids[0]).unwrap(), TrackId::base(TrackKind::Video));
    }

    #[test]
    fn test_drag_to_another_track_updates_assignment() {
        let mut timeline = Timeline::default();
        let v2 = timeline.add_track(TrackKind::Video);
        let id = timeline.add_clip(still(1.0, 2.0)).unwrap();
        let mut editor = Editor::with_timeline(timeline, EditorSettings::default());

        // rows: v1 0..48, v2 48..96
        down(&mut editor, 150.0, 20.0);
        drag(&mut editor, 150.0, 70.0);
        up(&mut editor, 150.0, 70.0);

        let clip = editor.timeline().clip(id).unwrap();
        assert_eq!(clip.track_id, Some(v2));
        assert_eq!(editor.timeline().tracks().assignment(id), Some(v2));
        assert_eq!(clip.start_time(), 1.0);
    }

    #[test]
    fn test_drag_past_last_row_lands_on_nearest_compatible_track() {
        let mut timeline = Timeline::default();
        let v2 = timeline.add_track(TrackKind::Video);
        let id = timeline.add_clip(still(1.0, 2.0)).unwrap();
        let mut editor = Editor::with_timeline(timeline, EditorSettings::default());

        // rows: v1 0..48, v2 48..96, a1 96..144
        down(&mut editor, 150.0, 20.0);
        drag(&mut editor, 150.0, 500.0);
        up(&mut editor, 150.0, 500.0);

        assert_eq!(editor.timeline().track_of(id).unwrap(), v2);
    }

    #[test]
    fn test_undo_track_deletion_restores_track_and_clips() {
        let mut timeline = Timeline::default();
        let a2 = timeline.add_track(TrackKind::Audio);
        timeline
            .add_clip(
                Clip::imported_audio("song.wav", 0.0, 5.0)
                    .unwrap()
                    .with_track(TrackId::base(TrackKind::Audio)),
            )
            .unwrap();
        let fx = timeline
            .add_clip(Clip::imported_audio("fx.wav", 1.0, 3.0).unwrap().with_track(a2))
            .unwrap();
        let mut editor = Editor::with_timeline(timeline, EditorSettings::default());

        editor.dispatch(InputEvent::SelectTrack(a2));
        let result = editor.dispatch(InputEvent::Key(Key::Delete));
        assert!(matches!(result.state, EditState::AwaitingConfirmation(_)));
        editor.dispatch(InputEvent::Confirm);
        assert!(!editor.timeline().tracks().contains(a2));
        assert!(editor.timeline().clip(fx).is_none());

        editor.dispatch(InputEvent::Undo);
        let timeline = editor.timeline();
        assert!(timeline.tracks().contains(a2));
        assert_eq!(timeline.track_of(fx).unwrap(), a2);
        assert_eq!(timeline.clips_on_track(TrackId::base(TrackKind::Audio)).len(), 1);
        assert!(timeline.overlaps().is_empty());

        editor.dispatch(InputEvent::Redo);
        assert!(!editor.timeline().tracks().contains(a2));
        assert!(editor.timeline().clip(fx).is_none());
    }

    #[test]
    fn test_add_track_is_undoable() {
        let mut editor = Editor::default();
        let result = editor.dispatch(InputEvent::AddTrack(TrackKind::Video));
        assert!(result.effects.contains(&SideEffect::HistoryRecorded {
            description: "Add track".to_string()
        }));
        let v2 = TrackId::new(TrackKind::Video, 2);
        assert!(editor.timeline().tracks().contains(v2));

        editor.dispatch(InputEvent::Undo);
        assert!(!editor.timeline().tracks().contains(v2));
        editor.dispatch(InputEvent::Redo);
        assert!(editor.timeline().tracks().contains(v2));
    }

    #[test]
    fn test_storyboard_move_waits_for_confirmation() {
        let derived = Clip::from_storyboard("frame-1", MediaKind::Image, 0.0, 2.0).unwrap();
        let (mut editor, ids) = editor_with(vec![derived]);

        down(&mut editor, 100.0, 20.0);
        drag(&mut editor, 300.0, 20.0);
        let result = up(&mut editor, 300.0, 20.0);
        assert!(matches!(result.state, EditState::AwaitingConfirmation(_)));
        assert!(result.effects.contains(&SideEffect::ConfirmStoryboardMove {
            clip: ids[0],
            start_time: 2.0
        }));
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 0.0);

        let result = editor.dispatch(InputEvent::Confirm);
        assert_eq!(result.state, EditState::Idle);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 2.0);
    }

    #[test]
    fn test_cancelled_storyboard_move_changes_nothing() {
        let derived = Clip::from_storyboard("frame-1", MediaKind::Image, 0.0, 2.0).unwrap();
        let (mut editor, ids) = editor_with(vec![derived]);

        down(&mut editor, 100.0, 20.0);
        drag(&mut editor, 300.0, 20.0);
        up(&mut editor, 300.0, 20.0);
        let result = editor.dispatch(InputEvent::Key(Key::Escape));
        assert_eq!(result.state, EditState::Idle);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 0.0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_ripple_resize_shifts_downstream_clip() {
        let (mut editor, ids) =
            editor_with(vec![still(0.0, 2.0), still(2.0, 1.0), still(1.0, 0.5)]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        editor.dispatch(InputEvent::SetRippleMode(true));

        let result = down(&mut editor, 198.0, 20.0);
        assert!(matches!(result.state, EditState::ResizingRight(_)));
        drag(&mut editor, 398.0, 20.0);
        up(&mut editor, 398.0, 20.0);

        let timeline = editor.timeline();
        assert!(approx(timeline.clip(a).unwrap().duration(), 4.0));
        assert!(approx(timeline.clip(b).unwrap().start_time(), 4.0));
        assert!(approx(timeline.clip(c).unwrap().start_time(), 1.0));
    }

    #[test]
    fn test_ripple_resize_on_audio_track_shifts_neighbour() {
        let mut timeline = Timeline::default();
        let a1 = TrackId::base(TrackKind::Audio);
        let a = timeline
            .add_clip(Clip::imported_audio("a.wav", 0.0, 6.0).unwrap().with_track(a1))
            .unwrap();
        timeline.resize_clip(a, 2.0).unwrap();
        let b = timeline
            .add_clip(Clip::imported_audio("b.wav", 2.0, 1.5).unwrap().with_track(a1))
            .unwrap();
        let mut editor = Editor::with_timeline(timeline, EditorSettings::default());
        editor.dispatch(InputEvent::SetRippleMode(true));

        let result = down(&mut editor, 198.0, 70.0);
        assert!(matches!(result.state, EditState::ResizingRight(_)));
        drag(&mut editor, 398.0, 70.0);
        up(&mut editor, 398.0, 70.0);

        let timeline = editor.timeline();
        assert!(approx(timeline.clip(a).unwrap().duration(), 4.0));
        let b = timeline.clip(b).unwrap();
        assert!(approx(b.start_time(), 4.0));
        assert!(approx(b.duration(), 1.5));
        assert_eq!(b.audio().unwrap().source_in_offset(), 0.0);
        assert!(timeline.overlaps().is_empty());
    }

    #[test]
    fn test_ripple_shrink_pulls_downstream_clip_back() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 3.0), still(3.0, 1.0)]);
        editor.dispatch(InputEvent::SetRippleMode(true));

        down(&mut editor, 298.0, 20.0);
        drag(&mut editor, 198.0, 20.0);
        up(&mut editor, 198.0, 20.0);

        assert!(approx(editor.timeline().clip(ids[0]).unwrap().duration(), 2.0));
        assert!(approx(editor.timeline().clip(ids[1]).unwrap().start_time(), 2.0));
    }

    #[test]
    fn test_left_trim_with_ripple_leaves_neighbours() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 2.0), still(2.0, 1.0)]);
        editor.dispatch(InputEvent::SetRippleMode(true));

        let result = down(&mut editor, 2.0, 20.0);
        assert!(matches!(result.state, EditState::ResizingLeft(_)));
        drag(&mut editor, 52.0, 20.0);
        up(&mut editor, 52.0, 20.0);

        let timeline = editor.timeline();
        assert!(approx(timeline.clip(ids[0]).unwrap().start_time(), 0.5));
        assert!(approx(timeline.clip(ids[0]).unwrap().end_time(), 2.0));
        assert_eq!(timeline.clip(ids[1]).unwrap().start_time(), 2.0);
    }

    #[test]
    fn test_resize_without_ripple_leaves_neighbours() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 2.0), still(2.0, 1.0)]);

        down(&mut editor, 198.0, 20.0);
        drag(&mut editor, 398.0, 20.0);
        up(&mut editor, 398.0, 20.0);

        assert!(approx(editor.timeline().clip(ids[0]).unwrap().duration(), 4.0));
        assert_eq!(editor.timeline().clip(ids[1]).unwrap().start_time(), 2.0);
    }

    #[test]
    fn test_left_trim_of_audio_moves_in_offset() {
        let song = Clip::imported_audio("song.wav", 0.0, 5.0)
            .unwrap()
            .with_track(TrackId::base(TrackKind::Audio));
        let (mut editor, ids) = editor_with(vec![song]);
        let out_before = editor
            .timeline()
            .clip(ids[0])
            .unwrap()
            .audio()
            .unwrap()
            .source_out_offset();

        let result = down(&mut editor, 2.0, 70.0);
        assert!(matches!(result.state, EditState::ResizingLeft(_)));
        drag(&mut editor, 52.0, 70.0);
        let result = up(&mut editor, 52.0, 70.0);
        assert!(result.effects.contains(&SideEffect::RefreshWaveform(ids[0])));

        let clip = editor.timeline().clip(ids[0]).unwrap();
        let trim = clip.audio().unwrap();
        assert!(approx(trim.source_in_offset(), 0.5));
        assert!(approx(clip.duration(), 4.5));
        assert!(approx(trim.source_out_offset(), out_before));
    }

    #[test]
    fn test_resize_drag_ignores_scroll_during_drag() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 2.0)]);

        down(&mut editor, 198.0, 20.0);
        editor.dispatch(InputEvent::ScrollBy { dx: 300.0, dy: 0.0 });
        drag(&mut editor, 298.0, 20.0);
        up(&mut editor, 298.0, 20.0);
        assert!(approx(editor.timeline().clip(ids[0]).unwrap().duration(), 3.0));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let (mut editor, ids) = editor_with(vec![still(1.0, 2.0)]);
        let original = editor.timeline().snapshot();

        down(&mut editor, 150.0, 20.0);
        drag(&mut editor, 350.0, 20.0);
        up(&mut editor, 350.0, 20.0);
        let edited = editor.timeline().snapshot();
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 3.0);

        let result = editor.dispatch(InputEvent::Undo);
        assert!(result.effects.contains(&SideEffect::HistoryRestored {
            description: "Move clip".to_string()
        }));
        assert_eq!(editor.timeline().snapshot(), original);

        editor.dispatch(InputEvent::Redo);
        assert_eq!(editor.timeline().snapshot(), edited);

        let result = editor.dispatch(InputEvent::Redo);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_delete_refuses_storyboard_clips() {
        let derived = Clip::from_storyboard("frame-1", MediaKind::Image, 0.0, 2.0).unwrap();
        let (mut editor, ids) = editor_with(vec![derived, still(3.0, 1.0)]);

        down(&mut editor, 100.0, 20.0);
        up(&mut editor, 100.0, 20.0);
        editor.dispatch(InputEvent::PointerDown {
            position: Point::new(350.0, 20.0),
            shift: true,
        });
        up(&mut editor, 350.0, 20.0);
        assert_eq!(editor.selection().clips(), ids);

        let result = editor.dispatch(InputEvent::Key(Key::Delete));
        assert!(result
            .effects
            .iter()
            .any(|e| matches!(e, SideEffect::Rejected(msg) if msg.contains("storyboard"))));
        assert!(editor.timeline().clip(ids[0]).is_some());
        assert!(editor.timeline().clip(ids[1]).is_none());
    }

    #[test]
    fn test_protected_track_delete_is_rejected() {
        let (mut editor, _) = editor_with(vec![still(0.0, 1.0)]);
        let tracks_before = editor.timeline().tracks().len();

        editor.dispatch(InputEvent::SelectTrack(TrackId::base(TrackKind::Video)));
        let result = editor.dispatch(InputEvent::Key(Key::Backspace));
        assert_eq!(result.state, EditState::Idle);
        assert!(matches!(result.effects.as_slice(), [SideEffect::Rejected(_)]));
        assert_eq!(editor.timeline().tracks().len(), tracks_before);
    }

    #[test]
    fn test_track_delete_with_clips_needs_confirmation() {
        let mut timeline = Timeline::default();
        let v2 = timeline.add_track(TrackKind::Video);
        let id = timeline.add_clip(still(0.0, 1.0).with_track(v2)).unwrap();
        let mut editor = Editor::with_timeline(timeline, EditorSettings::default());

        editor.dispatch(InputEvent::SelectTrack(v2));
        let result = editor.dispatch(InputEvent::Key(Key::Delete));
        assert!(result.effects.contains(&SideEffect::ConfirmTrackRemoval {
            track: v2,
            clip_count: 1
        }));
        assert!(editor.timeline().tracks().contains(v2));

        editor.dispatch(InputEvent::Confirm);
        assert!(!editor.timeline().tracks().contains(v2));
        assert!(editor.timeline().clip(id).is_none());
    }

    #[test]
    fn test_rectangle_select() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 1.0), still(3.0, 1.0)]);

        let result = down(&mut editor, 150.0, 10.0);
        assert!(matches!(result.state, EditState::Selecting { .. }));
        drag(&mut editor, 500.0, 30.0);
        let result = up(&mut editor, 500.0, 30.0);
        assert_eq!(
            result.effects,
            vec![SideEffect::SelectionChanged {
                clips: vec![ids[1]],
                track: None
            }]
        );
    }

    #[test]
    fn test_probe_for_deleted_clip_is_dropped() {
        let song = Clip::imported_audio("song.wav", 0.0, 5.0).unwrap();
        let (mut editor, ids) = editor_with(vec![song]);
        down(&mut editor, 250.0, 70.0);
        up(&mut editor, 250.0, 70.0);
        editor.dispatch(InputEvent::Key(Key::Delete));

        let result = editor.dispatch(InputEvent::MediaProbed {
            clip: ids[0],
            probe: MediaProbe {
                duration: Some(9.0),
                waveform: None,
            },
        });
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_playback_ticks_report_frame_changes() {
        let (mut editor, ids) = editor_with(vec![still(0.0, 1.0), still(1.0, 1.0)]);

        editor.dispatch(InputEvent::TogglePlayback);
        let result = editor.dispatch(InputEvent::Tick(0.5));
        assert_eq!(result.effects, vec![SideEffect::TimeUpdate(0.5)]);

        let result = editor.dispatch(InputEvent::Tick(0.75));
        assert_eq!(
            result.effects,
            vec![SideEffect::TimeUpdate(1.25), SideEffect::FrameChange(Some(ids[1]))]
        );
    }

    #[test]
    fn test_observer_receives_render_callbacks() {
        #[derive(Default)]
        struct Recorder {
            times: Vec<f64>,
            frames: Vec<Option<ClipId>>,
        }
        impl TimelineObserver for Recorder {
            fn on_time_update(&mut self, time: f64) {
                self.times.push(time);
            }
            fn on_frame_change(&mut self, clip: Option<&Clip>) {
                self.frames.push(clip.map(|c| c.id));
            }
        }

        let (mut editor, ids) = editor_with(vec![still(0.0, 2.0)]);
        let result = editor.dispatch(InputEvent::Seek(1.0));
        let mut recorder = Recorder::default();
        editor.notify(&result.effects, &mut recorder);
        assert_eq!(recorder.times, vec![1.0]);
        assert!(recorder.frames.is_empty());

        let result = editor.dispatch(InputEvent::Seek(2.05));
        editor.notify(&result.effects, &mut recorder);
        assert_eq!(recorder.frames, vec![None]);
        assert_eq!(editor.timeline().clip(ids[0]).unwrap().start_time(), 0.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut editor = Editor::default();
        editor.dispatch(InputEvent::SetZoom(1e9));
        assert_eq!(editor.viewport().pixels_per_second, editor.settings().max_zoom);
    }
}
