// SPDX-License-Identifier: MIT OR Apache-2.0
//! Session replay.
//!
//! A session file is RON describing an initial timeline and a list of input
//! events. Replaying it drives the editor core exactly as a UI would and
//! logs every side effect along the way.

use serde::Deserialize;
use std::path::Path;
use storyboard_timeline::{
    Clip, ClipId, Editor, EditorSettings, InputEvent, MediaKind, SideEffect, StoryboardFrame,
    Timeline, TimelineError, TimelineObserver, TrackId, TrackKind,
};
use thiserror::Error;

/// Replay driver errors
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file could not be parsed
    #[error("Session parse error: {0}")]
    Parse(String),

    /// The session's initial timeline was invalid
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),
}

/// Result type for replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;

/// An imported file placed on the timeline before replay starts
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClip {
    /// Fixed ID, so events such as `MediaProbed` can refer to the clip
    #[serde(default)]
    pub id: Option<ClipId>,
    /// File handle
    pub file: String,
    /// Media kind
    pub kind: MediaKind,
    /// Start time (seconds)
    pub start: f64,
    /// Clip length, or source length for audio (seconds)
    pub duration: f64,
    /// Track; the base track of the kind when absent
    #[serde(default)]
    pub track: Option<TrackId>,
}

impl SessionClip {
    fn into_clip(self) -> storyboard_timeline::Result<Clip> {
        let mut clip = match self.kind {
            MediaKind::Audio => Clip::imported_audio(self.file, self.start, self.duration)?,
            kind => Clip::imported_visual(self.file, kind, self.start, self.duration)?,
        };
        if let Some(id) = self.id {
            clip = clip.with_id(id);
        }
        if let Some(track) = self.track {
            clip = clip.with_track(track);
        }
        Ok(clip)
    }
}

/// A recorded editing session
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Tracks to add beyond the two base tracks
    pub tracks: Vec<TrackKind>,
    /// Storyboard frames, laid out on the first video track
    pub storyboard: Vec<StoryboardFrame>,
    /// Imported clips
    pub clips: Vec<SessionClip>,
    /// Input to replay, in order
    pub events: Vec<InputEvent>,
}

impl Session {
    /// Parse a session from RON
    pub fn from_ron_str(content: &str) -> Result<Self> {
        ron::from_str(content).map_err(|e| ReplayError::Parse(e.to_string()))
    }

    /// Load a session file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let session = Self::from_ron_str(&content)?;
        tracing::info!(
            "Loaded session from {:?}: {} clips, {} frames, {} events",
            path,
            session.clips.len(),
            session.storyboard.len(),
            session.events.len()
        );
        Ok(session)
    }

    /// Build the initial timeline
    pub fn timeline(&self, frame_rate: f64) -> Result<Timeline> {
        let mut timeline = Timeline::new(frame_rate);
        for kind in &self.tracks {
            timeline.add_track(*kind);
        }
        if !self.storyboard.is_empty() {
            timeline.sync_storyboard(&self.storyboard)?;
        }
        for clip in &self.clips {
            timeline.add_clip(clip.clone().into_clip()?)?;
        }
        Ok(timeline)
    }
}

/// Playhead and frame as a renderer would see them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderLog {
    /// Last reported time
    pub time: f64,
    /// Last reported frame clip
    pub frame: Option<ClipId>,
    /// Number of frame changes seen
    pub frame_changes: usize,
}

impl TimelineObserver for RenderLog {
    fn on_time_update(&mut self, time: f64) {
        self.time = time;
    }

    fn on_frame_change(&mut self, clip: Option<&Clip>) {
        self.frame = clip.map(|c| c.id);
        self.frame_changes += 1;
        if let Some(clip) = clip {
            tracing::trace!("Frame shows {} ({})", clip.source.handle(), clip.kind().name());
        }
    }
}

/// Outcome of a replay
#[derive(Debug)]
pub struct Replay {
    /// Editor in its final state
    pub editor: Editor,
    /// Renderer view at the end
    pub render: RenderLog,
    /// Number of refused operations
    pub rejected: usize,
}

/// Replay a session from scratch
pub fn run(session: Session, settings: EditorSettings) -> Result<Replay> {
    let timeline = session.timeline(settings.frame_rate)?;
    let mut editor = Editor::with_timeline(timeline, settings);
    let mut render = RenderLog::default();
    let mut rejected = 0;

    for (index, event) in session.events.into_iter().enumerate() {
        let dispatch = editor.dispatch(event);
        for effect in &dispatch.effects {
            if let SideEffect::Rejected(reason) = effect {
                rejected += 1;
                tracing::warn!("[{index}] rejected: {reason}");
            } else {
                tracing::debug!("[{index}] {effect:?}");
            }
        }
        editor.notify(&dispatch.effects, &mut render);
    }

    let stats = editor.history_stats();
    tracing::info!(
        "Replay finished: {} clips, {} undoable edits ({} bytes), {rejected} rejected",
        editor.timeline().clip_count(),
        stats.undo_count,
        stats.memory_used
    );

    Ok(Replay {
        editor,
        render,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"(
        tracks: [video],
        clips: [
            (
                id: Some("7d1f0c3e-2b4a-4c5d-9e6f-0a1b2c3d4e5f"),
                file: "shot.png",
                kind: image,
                start: 1.0,
                duration: 2.0,
            ),
        ],
        events: [
            PointerDown(position: (x: 150.0, y: 20.0)),
            PointerMove(position: (x: 250.0, y: 20.0)),
            PointerUp(position: (x: 250.0, y: 20.0)),
            SelectTrack("v1"),
            Key(Delete),
            Seek(2.5),
        ],
    )"#;

    fn shot_id() -> ClipId {
        ClipId("7d1f0c3e-2b4a-4c5d-9e6f-0a1b2c3d4e5f".parse().unwrap())
    }

    #[test]
    fn test_session_parses() {
        let session = Session::from_ron_str(SESSION).unwrap();
        assert_eq!(session.tracks, vec![TrackKind::Video]);
        assert_eq!(session.clips.len(), 1);
        assert_eq!(session.events.len(), 6);
        assert!(session.storyboard.is_empty());
    }

    #[test]
    fn test_replay_applies_events() {
        let session = Session::from_ron_str(SESSION).unwrap();
        let replay = run(session, EditorSettings::default()).unwrap();

        let clip = replay.editor.timeline().clip(shot_id()).unwrap();
        assert_eq!(clip.start_time(), 2.0);
        // deleting the protected base track is refused
        assert_eq!(replay.rejected, 1);
        assert_eq!(replay.render.time, 2.5);
        assert_eq!(replay.render.frame, Some(shot_id()));
    }

    #[test]
    fn test_storyboard_frames_become_clips() {
        let session = Session::from_ron_str(
            r#"(storyboard: [
                (frameId: "f1", kind: image, duration: 2.0),
                (frameId: "f2", kind: video, duration: 3.0),
            ])"#,
        )
        .unwrap();
        let replay = run(session, EditorSettings::default()).unwrap();
        let timeline = replay.editor.timeline();

        assert_eq!(timeline.clip_count(), 2);
        assert!(timeline.clips().all(|c| !c.is_external()));
        assert_eq!(timeline.max_end_time(), 5.0);
    }

    #[test]
    fn test_bad_session_is_a_parse_error() {
        assert!(matches!(
            Session::from_ron_str("(events: [Wiggle])"),
            Err(ReplayError::Parse(_))
        ));
    }
}
