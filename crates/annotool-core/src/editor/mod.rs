//! Interactive editing tools.
//!
//! These modules handle:
//! - Ellipse creation and point-drag resizing
//! - Free transform (resize, rotate, translate) of the selection
//! - The image rotation dial
//! - Routing pointer and keyboard input to the active tool

mod ellipse;
mod handles;
mod mode;
mod rotation;
mod toolbox;
mod transform;

pub use ellipse::*;
pub use handles::*;
pub use mode::*;
pub use rotation::*;
pub use toolbox::*;
pub use transform::*;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::scene::Scene;
use crate::viewport::Viewport;

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub command: bool,
    pub control: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Command or control: locks drags to an axis or keeps proportions.
    pub fn axis_lock(&self) -> bool {
        self.command || self.control
    }
}

/// Pointer event in the coordinate frame of the receiving tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub point: DVec2,
    /// Where the current press started.
    pub down_point: DVec2,
    /// Movement since the previous event.
    pub delta: DVec2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Event at `point` with no press history.
    pub fn at(point: DVec2) -> Self {
        Self {
            point,
            down_point: point,
            delta: DVec2::ZERO,
            modifiers: Modifiers::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Char(char),
}

/// Cursor the embedding layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorHint {
    #[default]
    Default,
    Resize,
    Rotate,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Ellipse,
    Transform,
    Rotation,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ellipse => "ellipse",
            Self::Transform => "transform",
            Self::Rotation => "rotation",
        }
    }
}

/// Mutable view of the world handed to a tool for one event.
pub struct ToolContext<'a> {
    pub scene: &'a mut Scene,
    pub viewport: &'a mut dyn Viewport,
}

/// An interactive tool driven by the [`ToolBox`].
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Whether pointer events should be delivered in screen pixels instead
    /// of logical coordinates.
    fn screen_space(&self) -> bool {
        false
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>);

    /// `finished` is false when the tool is only paused.
    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>, finished: bool);

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    /// Returns true when the key was handled.
    fn key_down(&mut self, _ctx: &mut ToolContext<'_>, _key: Key) -> bool {
        false
    }

    fn is_enabled_for_mode(&self, mode: AnnotationMode, scene: &Scene) -> bool;

    /// Help text for the toolbar, if the tool has any.
    fn instructions(&self) -> Option<&'static str> {
        None
    }

    fn cursor(&self) -> CursorHint {
        CursorHint::Default
    }
}
