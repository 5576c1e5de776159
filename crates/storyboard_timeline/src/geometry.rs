// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pixel/time conversion and hit-testing.
//!
//! Pure functions over explicit zoom, scroll and row parameters, so the
//! interaction layer can be driven headlessly.

use crate::clip::{Clip, ClipId};
use crate::settings::EditorSettings;
use crate::timeline::Timeline;
use crate::track::{TrackId, TrackKind};
use serde::{Deserialize, Serialize};

/// A pointer position in timeline-area pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
}

impl Point {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in timeline-area pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub min_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Right edge
    pub max_x: f64,
    /// Bottom edge
    pub max_y: f64,
}

impl Rect {
    /// Rectangle spanned by two corners in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Whether two rectangles share any area or edge
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Horizontal zoom and scroll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Horizontal zoom level (pixels per second)
    pub pixels_per_second: f64,
    /// Scroll offset (in seconds)
    pub scroll_offset: f64,
    /// Vertical scroll offset (in pixels)
    pub vertical_scroll: f64,
}

impl Viewport {
    /// Create a viewport at the given zoom, scrolled to the origin
    pub fn new(pixels_per_second: f64) -> Self {
        Self {
            pixels_per_second,
            scroll_offset: 0.0,
            vertical_scroll: 0.0,
        }
    }

    /// Convert time to x position
    pub fn time_to_x(&self, time: f64) -> f64 {
        (time - self.scroll_offset) * self.pixels_per_second
    }

    /// Convert x position to time
    pub fn x_to_time(&self, x: f64) -> f64 {
        x / self.pixels_per_second + self.scroll_offset
    }

    /// Convert a pixel distance to seconds
    pub fn px_to_seconds(&self, px: f64) -> f64 {
        px / self.pixels_per_second
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(EditorSettings::default().pixels_per_second)
    }
}

/// Stacked track rows, video tracks first then audio
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    rows: Vec<TrackId>,
    track_height: f64,
}

impl TrackLayout {
    /// Lay out the timeline's current tracks
    pub fn new(timeline: &Timeline, track_height: f64) -> Self {
        Self {
            rows: timeline.tracks().ordered().iter().map(|t| t.id).collect(),
            track_height,
        }
    }

    /// Tracks in row order
    pub fn rows(&self) -> &[TrackId] {
        &self.rows
    }

    /// Height of a row (pixels)
    pub fn track_height(&self) -> f64 {
        self.track_height
    }

    /// Top edge of a track row, before vertical scroll
    pub fn track_top(&self, track: TrackId) -> Option<f64> {
        self.rows
            .iter()
            .position(|row| *row == track)
            .map(|index| index as f64 * self.track_height)
    }

    /// Track whose vertical bounds contain `y`
    pub fn track_at_y(&self, y: f64, viewport: &Viewport) -> Option<TrackId> {
        let y = y + viewport.vertical_scroll;
        if y < 0.0 || !y.is_finite() {
            return None;
        }
        let index = (y / self.track_height).floor() as usize;
        self.rows.get(index).copied()
    }

    /// Nearest row of `kind` to `y`, for drags that stray onto the other kind
    pub fn nearest_track_of_kind(
        &self,
        y: f64,
        kind: TrackKind,
        viewport: &Viewport,
    ) -> Option<TrackId> {
        let y = y + viewport.vertical_scroll;
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.kind == kind)
            .min_by(|(a, _), (b, _)| {
                let da = ((*a as f64 + 0.5) * self.track_height - y).abs();
                let db = ((*b as f64 + 0.5) * self.track_height - y).abs();
                da.total_cmp(&db)
            })
            .map(|(_, row)| *row)
    }
}

/// Part of a clip under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipZone {
    /// Body (move)
    Body,
    /// Left edge band (trim start)
    LeftHandle,
    /// Right edge band (resize end)
    RightHandle,
}

/// Result of hit-testing a pointer position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Over a clip
    Clip {
        /// The clip under the pointer
        id: ClipId,
        /// Which part of it
        zone: ClipZone,
    },
    /// Over a track row with no clip
    EmptyTrack(TrackId),
    /// Outside every track row
    Outside,
}

/// Pixel extent of a clip and its handle bands
#[derive(Debug, Clone, Copy, PartialEq)]
struct ClipBands {
    left: f64,
    right: f64,
    hit_left: f64,
    hit_right: f64,
    handle: f64,
}

impl ClipBands {
    fn new(clip: &Clip, viewport: &Viewport, settings: &EditorSettings) -> Self {
        let left = viewport.time_to_x(clip.start_time());
        let right = viewport.time_to_x(clip.end_time());
        let width = right - left;
        let handle = settings.handle_width_px.min(width / 3.0);
        // narrow clips grow their grabbable area outward
        let grow = ((settings.narrow_clip_px - width) / 2.0).max(0.0);

        Self {
            left,
            right,
            hit_left: left - grow,
            hit_right: right + grow,
            handle,
        }
    }

    fn zone(&self, x: f64) -> Option<ClipZone> {
        if x < self.hit_left || x > self.hit_right {
            return None;
        }
        if x < self.left + self.handle {
            Some(ClipZone::LeftHandle)
        } else if x > self.right - self.handle {
            Some(ClipZone::RightHandle)
        } else {
            Some(ClipZone::Body)
        }
    }

    fn inside(&self, x: f64) -> bool {
        x >= self.left && x <= self.right
    }
}

/// Find what lies under `point`.
///
/// A clip's own extent wins over a neighbour's outward-grown handle.
pub fn hit_test(
    point: Point,
    timeline: &Timeline,
    layout: &TrackLayout,
    viewport: &Viewport,
    settings: &EditorSettings,
) -> HitTarget {
    let Some(track) = layout.track_at_y(point.y, viewport) else {
        return HitTarget::Outside;
    };

    let mut grown = None;
    for clip in timeline.clips_on_track(track).into_iter().rev() {
        let bands = ClipBands::new(clip, viewport, settings);
        let Some(zone) = bands.zone(point.x) else {
            continue;
        };
        if bands.inside(point.x) {
            return HitTarget::Clip { id: clip.id, zone };
        }
        grown.get_or_insert(HitTarget::Clip { id: clip.id, zone });
    }

    grown.unwrap_or(HitTarget::EmptyTrack(track))
}

/// On-screen rectangle of a clip, or `None` if its track is not laid out
pub fn clip_rect(
    clip: &Clip,
    track: TrackId,
    layout: &TrackLayout,
    viewport: &Viewport,
) -> Option<Rect> {
    let top = layout.track_top(track)? - viewport.vertical_scroll;
    Some(Rect {
        min_x: viewport.time_to_x(clip.start_time()),
        min_y: top,
        max_x: viewport.time_to_x(clip.end_time()),
        max_y: top + layout.track_height(),
    })
}

/// Clips whose on-screen rectangle intersects `rect`, in row then time order
pub fn clips_in_rect(
    rect: &Rect,
    timeline: &Timeline,
    layout: &TrackLayout,
    viewport: &Viewport,
) -> Vec<ClipId> {
    layout
        .rows()
        .iter()
        .flat_map(|&track| {
            timeline
                .clips_on_track(track)
                .into_iter()
                .filter(move |clip| {
                    clip_rect(clip, track, layout, viewport).is_some_and(|r| r.intersects(rect))
                })
                .map(|clip| clip.id)
        })
        .collect()
}
