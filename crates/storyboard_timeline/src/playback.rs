// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback controller.
//!
//! Drives the timeline's playhead. The playhead itself lives on the
//! [`Timeline`] so history entries capture it.

use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Stopped at the start
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused at current position
    Paused,
}

/// Playback controller for the timeline
#[derive(Debug, Clone)]
pub struct PlaybackController {
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f64,
    /// Wrap to the start instead of stopping at the end
    pub looping: bool,
}

impl PlaybackController {
    /// Create a new playback controller
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            speed: 1.0,
            looping: false,
        }
    }

    /// Advance the playhead by `delta_time` seconds.
    ///
    /// Returns the new time when the playhead moved.
    pub fn tick(&mut self, delta_time: f64, timeline: &mut Timeline) -> Option<f64> {
        if self.state != PlaybackState::Playing || !delta_time.is_finite() || delta_time <= 0.0 {
            return None;
        }

        let end_time = timeline.total_duration();
        let mut time = timeline.current_time() + delta_time * self.speed;
        if time >= end_time {
            if self.looping && end_time > 0.0 {
                time = (time - end_time) % end_time;
            } else {
                time = end_time;
                self.state = PlaybackState::Stopped;
                tracing::debug!("Playback reached end at {end_time}s");
            }
        }

        timeline.set_current_time(time);
        Some(timeline.current_time())
    }

    /// Play from current position
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and reset to beginning
    pub fn stop(&mut self, timeline: &mut Timeline) {
        self.state = PlaybackState::Stopped;
        timeline.set_current_time(0.0);
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self, timeline: &mut Timeline) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => {
                // restart from the top once the end was reached
                if timeline.current_time() >= timeline.total_duration() {
                    timeline.set_current_time(0.0);
                }
                self.play();
            }
        }
    }

    /// Seek to specific time, returning the clamped playhead
    pub fn seek(&self, time: f64, timeline: &mut Timeline) -> f64 {
        timeline.set_current_time(time);
        timeline.current_time()
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current frame number at the timeline's frame rate
    pub fn current_frame(&self, timeline: &Timeline) -> u64 {
        (timeline.current_time() * timeline.frame_rate()).floor() as u64
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Clip, MediaKind};

    fn timeline_of(duration: f64) -> Timeline {
        let mut timeline = Timeline::default();
        timeline
            .add_clip(Clip::imported_visual("a.png", MediaKind::Image, 0.0, duration).unwrap())
            .unwrap();
        timeline
    }

    #[test]
    fn test_tick_only_advances_while_playing() {
        let mut timeline = timeline_of(10.0);
        let mut playback = PlaybackController::new();

        assert_eq!(playback.tick(0.5, &mut timeline), None);
        playback.play();
        assert_eq!(playback.tick(0.5, &mut timeline), Some(0.5));
        playback.pause();
        assert_eq!(playback.tick(0.5, &mut timeline), None);
        assert_eq!(timeline.current_time(), 0.5);
    }

    #[test]
    fn test_playback_stops_at_end() {
        let mut timeline = timeline_of(2.0);
        let mut playback = PlaybackController::new();
        playback.play();

        let end = timeline.total_duration();
        assert_eq!(playback.tick(100.0, &mut timeline), Some(end));
        assert_eq!(playback.state, PlaybackState::Stopped);
    }

    #[test]
    fn test_looping_wraps() {
        let mut timeline = timeline_of(10.0);
        let mut playback = PlaybackController::new();
        playback.looping = true;
        playback.play();

        // total duration is 10.5
        let time = playback.tick(11.0, &mut timeline).unwrap();
        assert!((time - 0.5).abs() < 1e-9);
        assert!(playback.is_playing());
    }

    #[test]
    fn test_seek_clamps_and_reports_frame() {
        let mut timeline = timeline_of(4.0);
        let playback = PlaybackController::new();

        assert_eq!(playback.seek(-3.0, &mut timeline), 0.0);
        assert_eq!(playback.seek(1.5, &mut timeline), 1.5);
        assert_eq!(playback.current_frame(&timeline), 36);
    }

    #[test]
    fn test_toggle_at_end_restarts() {
        let mut timeline = timeline_of(1.0);
        let mut playback = PlaybackController::new();
        playback.seek(100.0, &mut timeline);

        playback.toggle_playback(&mut timeline);
        assert!(playback.is_playing());
        assert_eq!(timeline.current_time(), 0.0);
        playback.toggle_playback(&mut timeline);
        assert_eq!(playback.state, PlaybackState::Paused);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut timeline = timeline_of(4.0);
        let mut playback = PlaybackController::new();
        playback.seek(2.0, &mut timeline);
        playback.stop(&mut timeline);
        assert_eq!(timeline.current_time(), 0.0);
    }
}
