//! Annotool Core Library
//!
//! Interactive transform engine for vector annotations drawn over a zoomable,
//! rotatable image viewport.
//!
//! The crate is organised leaf-first:
//! - Geometry primitives and the owned shape/scene model
//! - A `Viewport` adapter trait plus a headless implementation
//! - Editor tools (ellipse, transform, rotation dial) driven by pointer events
//! - Binary mask dilation

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod scene;
pub mod shape;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::ToolConfig;
pub use editor::{
    AnnotationMode, CursorHint, EllipseMode, EllipseTool, Key, ModeStore, Modifiers,
    PointerEvent, RotationControl, Tool, ToolBox, ToolContext, ToolKind, TransformEvent,
    TransformState, TransformTool,
};
pub use error::AnnotError;
pub use geometry::{Corner, Rect};
pub use mask::Mask;
pub use scene::{GroupId, HitKind, HitOptions, HitResult, Scene, ShapeId};
pub use shape::{Shape, ShapeKind};
pub use viewport::{SimpleViewport, ViewerEvent, ViewerEventKind, Viewport};
