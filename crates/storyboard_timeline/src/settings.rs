// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings, persisted as RON.

use crate::error::{Result, TimelineError};
use crate::history::MAX_HISTORY;
use crate::timeline::DEFAULT_FRAME_RATE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Snapping behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Snap visual clips to frame boundaries
    pub frame_snap: bool,
    /// Snap to edges of other clips
    pub clip_snap: bool,
    /// Snap distance for visual clips (pixels)
    pub tolerance_px: f64,
    /// Snap distance for audio clips (pixels), kept tiny so audio floats
    pub audio_tolerance_px: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            frame_snap: true,
            clip_snap: true,
            tolerance_px: 8.0,
            audio_tolerance_px: 2.0,
        }
    }
}

/// Complete editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Settings format version
    pub version: u32,
    /// Project frame rate
    pub frame_rate: f64,
    /// Initial horizontal zoom (pixels per second)
    pub pixels_per_second: f64,
    /// Lowest zoom
    pub min_zoom: f64,
    /// Highest zoom
    pub max_zoom: f64,
    /// Pointer travel separating a click from a drag (pixels)
    pub drag_threshold_px: f64,
    /// Height of one track row (pixels)
    pub track_height_px: f64,
    /// Width of a resize handle (pixels)
    pub handle_width_px: f64,
    /// Clips narrower than this get handles extending outward (pixels)
    pub narrow_clip_px: f64,
    /// Ripple downstream clips on resize
    pub ripple_enabled: bool,
    /// Undo depth
    pub max_history: usize,
    /// Snapping
    pub snap: SnapSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            frame_rate: DEFAULT_FRAME_RATE,
            pixels_per_second: 100.0,
            min_zoom: 10.0,
            max_zoom: 1000.0,
            drag_threshold_px: 5.0,
            track_height_px: 48.0,
            handle_width_px: 6.0,
            narrow_clip_px: 24.0,
            ripple_enabled: false,
            max_history: MAX_HISTORY,
            snap: SnapSettings::default(),
        }
    }
}

impl EditorSettings {
    /// Parse settings from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let settings: EditorSettings =
            ron::from_str(content).map_err(|e| TimelineError::Settings(e.to_string()))?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(TimelineError::Settings(format!(
                "Settings version {} is newer than supported version {}",
                settings.version, SETTINGS_FORMAT_VERSION
            )));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Render settings as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        ron::ser::to_string_pretty(self, config).map_err(|e| TimelineError::Settings(e.to_string()))
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TimelineError::Settings(format!("{}: {e}", path.display())))?;
        Self::from_ron_str(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_ron_string()?;
        std::fs::write(path, content)
            .map_err(|e| TimelineError::Settings(format!("{}: {e}", path.display())))
    }

    /// Clamp a zoom level to the configured range
    pub fn clamp_zoom(&self, pixels_per_second: f64) -> f64 {
        if !pixels_per_second.is_finite() {
            return self.pixels_per_second;
        }
        pixels_per_second.clamp(self.min_zoom, self.max_zoom)
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("frame_rate", self.frame_rate),
            ("pixels_per_second", self.pixels_per_second),
            ("min_zoom", self.min_zoom),
            ("track_height_px", self.track_height_px),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TimelineError::Settings(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.max_zoom < self.min_zoom {
            return Err(TimelineError::Settings(format!(
                "max_zoom {} is below min_zoom {}",
                self.max_zoom, self.min_zoom
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EditorSettings::default();
        assert_eq!(settings.frame_rate, 24.0);
        assert_eq!(settings.drag_threshold_px, 5.0);
        assert_eq!(settings.max_history, 100);
        assert!(!settings.ripple_enabled);
        assert!(settings.snap.frame_snap);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut settings = EditorSettings::default();
        settings.ripple_enabled = true;
        settings.snap.tolerance_px = 12.0;

        let ron_str = settings.to_ron_string().unwrap();
        assert!(ron_str.contains("EditorSettings"));
        assert_eq!(EditorSettings::from_ron_str(&ron_str).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings = EditorSettings::from_ron_str("(frame_rate: 30.0)").unwrap();
        assert_eq!(settings.frame_rate, 30.0);
        assert_eq!(settings.pixels_per_second, 100.0);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = EditorSettings::from_ron_str("(version: 99)").unwrap_err();
        assert!(matches!(err, TimelineError::Settings(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(EditorSettings::from_ron_str("(frame_rate: 0.0)").is_err());
        assert!(EditorSettings::from_ron_str("(min_zoom: 50.0, max_zoom: 10.0)").is_err());
    }

    #[test]
    fn test_zoom_clamps_to_range() {
        let settings = EditorSettings::default();
        assert_eq!(settings.clamp_zoom(1.0), settings.min_zoom);
        assert_eq!(settings.clamp_zoom(1e9), settings.max_zoom);
        assert_eq!(settings.clamp_zoom(f64::NAN), settings.pixels_per_second);
    }
}
