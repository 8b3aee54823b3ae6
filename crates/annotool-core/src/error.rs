//! Error types for the annotation core.

use crate::scene::ShapeId;

/// Errors raised by constructors and lookups in the annotation core.
///
/// Geometry operations never fail: degenerate drags are silent no-ops.
#[derive(Debug, thiserror::Error)]
pub enum AnnotError {
    #[error("mask dimension error: {width}x{height} does not match {len} cells")]
    MaskDimension {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("unknown shape: {0:?}")]
    UnknownShape(ShapeId),
}
