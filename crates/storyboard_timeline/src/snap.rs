// SPDX-License-Identifier: MIT OR Apache-2.0
//! Snap resolver.
//!
//! Corrects a candidate time for a moving clip to the nearest frame boundary
//! or same-family clip edge within a tolerance derived from the zoom level.
//! The resolver only reads the timeline.

use crate::clip::Clip;
use crate::settings::SnapSettings;
use crate::timeline::Timeline;
use crate::track::TrackId;

/// Which kind of candidate won a snap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapTarget {
    /// Nothing within tolerance; the candidate was kept
    None,
    /// A frame boundary
    Frame,
    /// Another clip's start or end
    ClipEdge,
}

/// A corrected time and what it snapped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapped {
    /// Corrected time (seconds)
    pub time: f64,
    /// Winning candidate kind
    pub target: SnapTarget,
}

/// Read-only snapping view over a timeline
pub struct SnapResolver<'a> {
    timeline: &'a Timeline,
    settings: &'a SnapSettings,
    pixels_per_second: f64,
}

impl<'a> SnapResolver<'a> {
    /// Create a resolver at the given zoom level
    pub fn new(timeline: &'a Timeline, settings: &'a SnapSettings, pixels_per_second: f64) -> Self {
        Self {
            timeline,
            settings,
            pixels_per_second,
        }
    }

    /// Snap tolerance in seconds for the given clip
    pub fn tolerance(&self, clip: &Clip) -> f64 {
        let px = if clip.is_audio() {
            self.settings.audio_tolerance_px
        } else {
            self.settings.tolerance_px
        };
        if self.pixels_per_second > 0.0 && self.pixels_per_second.is_finite() {
            (px / self.pixels_per_second).max(0.0)
        } else {
            0.0
        }
    }

    /// Snap a candidate start time for `clip` placed on `track`
    pub fn snap(&self, candidate: f64, clip: &Clip, track: TrackId) -> f64 {
        self.resolve(candidate, clip, track).time
    }

    /// Snap a candidate start time, reporting what it snapped to
    pub fn resolve(&self, candidate: f64, clip: &Clip, track: TrackId) -> Snapped {
        let candidate = candidate.max(0.0);
        let duration = clip.duration();
        let mut best = Candidate::new(self.tolerance(clip));

        if !clip.is_audio() && self.settings.frame_snap {
            best.offer(self.frame_boundary(candidate), candidate, SnapTarget::Frame);
        }
        if self.settings.clip_snap {
            for edge in self.edges(clip, track) {
                // align start with the edge, or end with the edge
                best.offer(edge, candidate, SnapTarget::ClipEdge);
                best.offer(edge - duration, candidate, SnapTarget::ClipEdge);
            }
        }

        best.finish(candidate)
    }

    /// Snap a single edge (used while resizing)
    pub fn snap_edge(&self, candidate: f64, clip: &Clip, track: TrackId) -> f64 {
        let candidate = candidate.max(0.0);
        let mut best = Candidate::new(self.tolerance(clip));

        if !clip.is_audio() && self.settings.frame_snap {
            best.offer(self.frame_boundary(candidate), candidate, SnapTarget::Frame);
        }
        if self.settings.clip_snap {
            for edge in self.edges(clip, track) {
                best.offer(edge, candidate, SnapTarget::ClipEdge);
            }
        }

        best.finish(candidate).time
    }

    fn frame_boundary(&self, time: f64) -> f64 {
        let fps = self.timeline.frame_rate();
        (time * fps).round() / fps
    }

    /// Edges of other clips the moving clip may snap to
    fn edges(&self, clip: &Clip, track: TrackId) -> Vec<f64> {
        let others: Vec<&Clip> = if clip.is_audio() {
            self.timeline.clips_on_track(track)
        } else {
            self.timeline
                .clips()
                .filter(|other| other.kind().same_family(clip.kind()))
                .collect()
        };

        others
            .into_iter()
            .filter(|other| other.id != clip.id)
            .flat_map(|other| [other.start_time(), other.end_time()])
            .collect()
    }
}

/// Closest candidate so far
struct Candidate {
    tolerance: f64,
    best: Option<(f64, f64, SnapTarget)>,
}

impl Candidate {
    fn new(tolerance: f64) -> Self {
        Self { tolerance, best: None }
    }

    /// Earlier offers win ties
    fn offer(&mut self, time: f64, candidate: f64, target: SnapTarget) {
        if time < 0.0 || !time.is_finite() {
            return;
        }
        let distance = (time - candidate).abs();
        if distance > self.tolerance {
            return;
        }
        if self.best.map_or(true, |(_, best, _)| distance < best) {
            self.best = Some((time, distance, target));
        }
    }

    fn finish(self, candidate: f64) -> Snapped {
        match self.best {
            Some((time, _, target)) => Snapped { time, target },
            None => Snapped {
                time: candidate,
                target: SnapTarget::None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::MediaKind;
    use crate::track::TrackKind;

    fn v1() -> TrackId {
        TrackId::base(TrackKind::Video)
    }

    fn a1() -> TrackId {
        TrackId::base(TrackKind::Audio)
    }

    #[test]
    fn test_frame_snap_at_24_fps() {
        let timeline = Timeline::new(24.0);
        let settings = SnapSettings::default();
        let resolver = SnapResolver::new(&timeline, &settings, 100.0);
        let clip = Clip::imported_visual("a.png", MediaKind::Image, 0.0, 2.0).unwrap();

        assert_eq!(resolver.snap(1.013, &clip, v1()), 1.0);
    }

    #[test]
    fn test_clip_edge_snap_aligns_end() {
        let mut timeline = Timeline::new(24.0);
        timeline
            .add_clip(Clip::imported_visual("a.png", MediaKind::Image, 5.0, 1.0).unwrap())
            .unwrap();
        let settings = SnapSettings {
            frame_snap: false,
            ..SnapSettings::default()
        };
        let resolver = SnapResolver::new(&timeline, &settings, 100.0);
        let moving = Clip::imported_visual("b.png", MediaKind::Video, 0.0, 2.0).unwrap();

        let snapped = resolver.resolve(2.97, &moving, v1());
        assert_eq!(snapped.time, 3.0);
        assert_eq!(snapped.target, SnapTarget::ClipEdge);
    }

    #[test]
    fn test_tie_prefers_frame_boundary() {
        let mut timeline = Timeline::new(4.0);
        // edge at 1.125 and frame boundary at 1.0 are equidistant from 1.0625
        timeline
            .add_clip(Clip::imported_visual("a.png", MediaKind::Image, 0.5, 0.625).unwrap())
            .unwrap();
        let settings = SnapSettings::default();
        let resolver = SnapResolver::new(&timeline, &settings, 100.0);
        let moving = Clip::imported_visual("b.png", MediaKind::Image, 3.0, 5.0).unwrap();

        let snapped = resolver.resolve(1.0625, &moving, v1());
        assert_eq!(snapped.target, SnapTarget::Frame);
        assert_eq!(snapped.time, 1.0);
    }

    #[test]
    fn test_tolerance_shrinks_with_zoom() {
        let timeline = Timeline::new(1.0);
        let settings = SnapSettings::default();
        let clip = Clip::imported_visual("a.png", MediaKind::Image, 0.0, 1.0).unwrap();

        let wide = SnapResolver::new(&timeline, &settings, 10.0);
        assert_eq!(wide.snap(2.3, &clip, v1()), 2.0);

        let close = SnapResolver::new(&timeline, &settings, 1000.0);
        assert_eq!(close.snap(2.3, &clip, v1()), 2.3);
    }

    #[test]
    fn test_audio_ignores_frames_and_visual_edges() {
        let mut timeline = Timeline::new(24.0);
        timeline
            .add_clip(Clip::imported_visual("a.png", MediaKind::Image, 0.0, 3.0).unwrap())
            .unwrap();
        let settings = SnapSettings::default();
        let resolver = SnapResolver::new(&timeline, &settings, 100.0);
        let song = Clip::imported_audio("song.wav", 0.0, 4.0).unwrap();

        assert_eq!(resolver.snap(1.013, &song, a1()), 1.013);
        assert_eq!(resolver.snap(3.005, &song, a1()), 3.005);
    }

    #[test]
    fn test_audio_snaps_only_when_very_close_on_same_track() {
        let mut timeline = Timeline::new(24.0);
        timeline
            .add_clip(Clip::imported_audio("a.wav", 0.0, 3.0).unwrap().with_track(a1()))
            .unwrap();
        let a2 = timeline.add_track(TrackKind::Audio);
        let settings = SnapSettings::default();
        let resolver = SnapResolver::new(&timeline, &settings, 100.0);
        let song = Clip::imported_audio("b.wav", 10.0, 2.0).unwrap();

        assert_eq!(resolver.snap(3.01, &song, a1()), 3.0);
        assert_eq!(resolver.snap(3.1, &song, a1()), 3.1);
        assert_eq!(resolver.snap(3.01, &song, a2), 3.01);
    }

    #[test]
    fn test_resolver_never_mutates() {
        let mut timeline = Timeline::new(24.0);
        timeline
            .add_clip(Clip::imported_visual("a.png", MediaKind::Image, 1.0, 1.0).unwrap())
            .unwrap();
        let before = timeline.snapshot();
        let settings = SnapSettings::default();
        let resolver = SnapResolver::new(&timeline, &settings, 100.0);
        let moving = Clip::imported_visual("b.png", MediaKind::Image, 0.0, 1.0).unwrap();

        let first = resolver.snap(1.98, &moving, v1());
        let second = resolver.snap(1.98, &moving, v1());
        assert_eq!(first, second);
        assert_eq!(timeline.snapshot(), before);
    }
}
