//! Annotation modes and the store shared with the toolbar layer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::ToolKind;

/// Mode string published by the annotation toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnnotationMode {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "Point:Ellipse")]
    PointEllipse,
    #[serde(rename = "Point:Rectangle")]
    PointRectangle,
    #[serde(rename = "Point")]
    Point,
    #[default]
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "multiselection")]
    MultiSelection,
    #[serde(rename = "MultiPolygon")]
    MultiPolygon,
    #[serde(rename = "LineString")]
    LineString,
    #[serde(rename = "GeometryCollection:Raster")]
    GeometryCollectionRaster,
    #[serde(rename = "transform")]
    Transform,
}

impl AnnotationMode {
    pub const ALL: [AnnotationMode; 10] = [
        Self::New,
        Self::PointEllipse,
        Self::PointRectangle,
        Self::Point,
        Self::Select,
        Self::MultiSelection,
        Self::MultiPolygon,
        Self::LineString,
        Self::GeometryCollectionRaster,
        Self::Transform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::PointEllipse => "Point:Ellipse",
            Self::PointRectangle => "Point:Rectangle",
            Self::Point => "Point",
            Self::Select => "select",
            Self::MultiSelection => "multiselection",
            Self::MultiPolygon => "MultiPolygon",
            Self::LineString => "LineString",
            Self::GeometryCollectionRaster => "GeometryCollection:Raster",
            Self::Transform => "transform",
        }
    }
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown annotation mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for AnnotationMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Mode state shared between the tool box and a toolbar layer.
///
/// The toolbar requests mode changes with [`ModeStore::set_mode`]; the tool
/// box drains them with [`ModeStore::take_pending_mode`] and publishes its
/// own state back with [`ModeStore::sync_from_toolbox`].
#[derive(Clone, Default)]
pub struct ModeStore {
    inner: Arc<RwLock<ModeStoreInner>>,
}

#[derive(Default)]
struct ModeStoreInner {
    mode: AnnotationMode,
    active_tool: Option<ToolKind>,
    instructions: Option<String>,
    version: u64,
    /// Pending mode change from the toolbar.
    pending_mode: Option<AnnotationMode>,
}

impl ModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current mode.
    pub fn get_mode(&self) -> AnnotationMode {
        self.inner.read().mode
    }

    /// Request a mode change (from the toolbar).
    pub fn set_mode(&self, mode: AnnotationMode) {
        let mut inner = self.inner.write();
        inner.pending_mode = Some(mode);
        inner.version += 1;
    }

    /// Take the pending mode change (called by the tool box).
    pub fn take_pending_mode(&self) -> Option<AnnotationMode> {
        self.inner.write().pending_mode.take()
    }

    pub fn get_active_tool(&self) -> Option<ToolKind> {
        self.inner.read().active_tool
    }

    pub fn get_instructions(&self) -> Option<String> {
        self.inner.read().instructions.clone()
    }

    /// Get version for change detection.
    pub fn get_version(&self) -> u64 {
        self.inner.read().version
    }

    /// Update state from the tool box.
    pub fn sync_from_toolbox(
        &self,
        mode: AnnotationMode,
        active_tool: Option<ToolKind>,
        instructions: Option<&str>,
    ) {
        let mut inner = self.inner.write();
        inner.mode = mode;
        inner.active_tool = active_tool;
        inner.instructions = instructions.map(str::to_string);
        inner.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_strings_roundtrip() {
        for mode in AnnotationMode::ALL {
            assert_eq!(mode.as_str().parse::<AnnotationMode>(), Ok(mode));
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
        assert!("Polygon".parse::<AnnotationMode>().is_err());
    }

    #[test]
    fn test_pending_mode_is_drained_once() {
        let store = ModeStore::new();
        let ui_side = store.clone();
        ui_side.set_mode(AnnotationMode::PointEllipse);
        assert_eq!(store.get_version(), 1);
        assert_eq!(store.take_pending_mode(), Some(AnnotationMode::PointEllipse));
        assert_eq!(store.take_pending_mode(), None);

        store.sync_from_toolbox(
            AnnotationMode::PointEllipse,
            Some(ToolKind::Ellipse),
            Some("Drag a point to resize"),
        );
        assert_eq!(ui_side.get_mode(), AnnotationMode::PointEllipse);
        assert_eq!(ui_side.get_active_tool(), Some(ToolKind::Ellipse));
        assert_eq!(ui_side.get_instructions().as_deref(), Some("Drag a point to resize"));
    }
}
