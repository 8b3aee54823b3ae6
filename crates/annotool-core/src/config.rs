//! Tool configuration.

use serde::{Deserialize, Serialize};

use crate::error::AnnotError;

/// Sizes and tolerances shared by the editor tools.
///
/// All pixel values are screen pixels; tools divide them by the current zoom
/// so handles and hit radii stay constant on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Edge length of corner handles and radius of the rotation handle.
    pub control_pixel_size: f64,
    /// Hit radius for control points and features.
    pub hit_tolerance_px: f64,
    /// Upper bound for the rotation dial radius.
    pub dial_max_radius: f64,
    /// Inner radius of the dial as a fraction of its radius.
    pub dial_inner_ratio: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            control_pixel_size: 12.0,
            hit_tolerance_px: 5.0,
            dial_max_radius: 30.0,
            dial_inner_ratio: 0.3,
        }
    }
}

impl ToolConfig {
    /// Parses a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, AnnotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Hit tolerance in logical units at the given zoom.
    pub fn hit_tolerance(&self, zoom: f64) -> f64 {
        self.hit_tolerance_px / zoom
    }
}
