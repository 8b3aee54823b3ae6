//! Ellipse tool: click-drag creation and point-drag resizing.

use glam::{DAffine2, DVec2};

use super::{AnnotationMode, CursorHint, PointerEvent, Tool, ToolContext, ToolKind};
use crate::config::ToolConfig;
use crate::geometry::{self, EPSILON, Rect};
use crate::scene::{Scene, ShapeId};
use crate::shape::{ShapeKind, ellipse_points};
use crate::viewport::Viewport;

const INSTRUCTIONS_NEW: &str = "Click and drag to create an ellipse";
const INSTRUCTIONS_RESIZE: &str = "Drag a point to resize";
const INSTRUCTIONS_UNKNOWN: &str = "???";

/// Diagonal directions tried by the axis lock, before view rotation.
const DIAGONALS: [DVec2; 4] = [
    DVec2::new(1.0, 1.0),
    DVec2::new(1.0, -1.0),
    DVec2::new(-1.0, -1.0),
    DVec2::new(-1.0, 1.0),
];

// ============================================================================
// Construction math
// ============================================================================

/// Projects a drag onto a diagonal of the frame rotated by `frame_angle`.
///
/// The diagonal with the smallest dot product is chosen. It is anti-parallel
/// to the best match, and both span the same line, so the projection equals
/// the projection onto the closest diagonal.
pub fn constrain_diagonal(delta: DVec2, frame_angle: f64) -> DVec2 {
    DIAGONALS
        .iter()
        .map(|d| geometry::rotate_vec(*d, frame_angle))
        .min_by(|a, b| a.dot(delta).total_cmp(&b.dot(delta)))
        .and_then(|axis| geometry::project(delta, axis))
        .unwrap_or(DVec2::ZERO)
}

/// Ellipse spanned by a drag from `down` to `current`, aligned with a view
/// rotated by `view_rotation` degrees.
///
/// Returns the control points and the (possibly constrained) drag end.
pub fn creation_segments(
    down: DVec2,
    current: DVec2,
    view_rotation: f64,
    axis_lock: bool,
) -> (Vec<DVec2>, DVec2) {
    let angle = -view_rotation;
    let end = if axis_lock {
        down + constrain_diagonal(current - down, angle)
    } else {
        current
    };
    let pivot = (down + end) / 2.0;
    let rect = Rect::from_points(
        geometry::rotate_about(down, -angle, pivot),
        geometry::rotate_about(end, -angle, pivot),
    );
    (ellipse_points(rect.center(), rect.size() / 2.0, angle), end)
}

/// Points captured when a segment drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDragRefs {
    pub opposite: DVec2,
    pub drag: DVec2,
    pub next: DVec2,
}

impl SegmentDragRefs {
    /// References for dragging segment `idx` of a four-point ellipse.
    pub fn capture(segments: &[DVec2], idx: usize) -> Option<Self> {
        let len = segments.len();
        if len != 4 || idx >= len {
            return None;
        }
        Some(Self {
            opposite: segments[(idx + 2) % len],
            drag: segments[idx],
            next: segments[(idx + 1) % len],
        })
    }
}

/// Ellipse after dragging the captured point to `point`.
///
/// The opposite point stays fixed. With `proportional` the other radius
/// scales with the dragged one. `None` when the drag projects to nothing.
pub fn resize_segments(refs: &SegmentDragRefs, point: DVec2, proportional: bool) -> Option<Vec<DVec2>> {
    let axis = refs.drag - refs.opposite;
    let proj = geometry::project(point - refs.opposite, axis)?;
    let length = proj.length();
    if length < EPSILON {
        return None;
    }

    let half = proj / 2.0;
    let center = refs.opposite + half;
    let r1 = half.length();
    let mut side = refs.next - refs.opposite;
    if proportional {
        side *= length / axis.length();
    }
    let r2 = side.perp_dot(proj / length).abs();

    Some(ellipse_points(center, DVec2::new(r1, r2), geometry::angle_of(axis)))
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EllipseMode {
    #[default]
    Idle,
    Creating,
    SegmentDrag,
    Modifying,
}

/// Full-view guide lines through the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crosshair {
    pub visible: bool,
    pub horizontal: [DVec2; 2],
    pub vertical: [DVec2; 2],
}

impl Crosshair {
    fn place(&mut self, viewport: &dyn Viewport, point: DVec2) {
        let size = viewport.container_size();
        let pt = viewport.logical_to_pixel(point);
        self.horizontal = [
            viewport.pixel_to_logical(DVec2::new(0.0, pt.y)),
            viewport.pixel_to_logical(DVec2::new(size.x, pt.y)),
        ];
        self.vertical = [
            viewport.pixel_to_logical(DVec2::new(pt.x, 0.0)),
            viewport.pixel_to_logical(DVec2::new(pt.x, size.y)),
        ];
    }
}

#[derive(Debug, Clone)]
pub struct EllipseTool {
    config: ToolConfig,
    mode: EllipseMode,
    /// Selected annotation the tool works on.
    item: Option<ShapeId>,
    /// Placeholder waiting to become an ellipse.
    item_to_create: Option<ShapeId>,
    /// Ellipse created by the current press.
    creating: Option<ShapeId>,
    drag_refs: Option<SegmentDragRefs>,
    crosshair: Crosshair,
    cursor: CursorHint,
    instructions: &'static str,
}

impl EllipseTool {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            mode: EllipseMode::Idle,
            item: None,
            item_to_create: None,
            creating: None,
            drag_refs: None,
            crosshair: Crosshair::default(),
            cursor: CursorHint::Default,
            instructions: INSTRUCTIONS_NEW,
        }
    }

    pub fn mode(&self) -> EllipseMode {
        self.mode
    }

    pub fn crosshair(&self) -> &Crosshair {
        &self.crosshair
    }

    pub fn item(&self) -> Option<ShapeId> {
        self.item.or(self.item_to_create)
    }

    fn update_instructions(&mut self, mode: AnnotationMode) {
        self.instructions = match mode {
            AnnotationMode::New => INSTRUCTIONS_NEW,
            AnnotationMode::PointEllipse => INSTRUCTIONS_RESIZE,
            _ => INSTRUCTIONS_UNKNOWN,
        };
    }

    /// Re-derives the mode from the current selection.
    pub fn on_selection_changed(&mut self, scene: &Scene) {
        let selected = scene.selected_annotations();
        let single = match selected.as_slice() {
            [id] => Some(*id),
            _ => None,
        };
        let kind = single.and_then(|id| scene.get(id)).map(|shape| shape.kind);
        self.item_to_create = single.filter(|_| kind == Some(ShapeKind::Placeholder));
        self.item = single.filter(|_| kind == Some(ShapeKind::Ellipse));

        if self.item_to_create.is_some() {
            self.mode = EllipseMode::Creating;
            self.crosshair.visible = true;
            self.creating = None;
            self.update_instructions(AnnotationMode::New);
        } else if self.creating.is_some() && self.creating == self.item {
            self.mode = EllipseMode::Creating;
            self.crosshair.visible = true;
            self.update_instructions(AnnotationMode::New);
        } else if self.item.is_some() {
            self.creating = None;
            self.mode = EllipseMode::Modifying;
            self.crosshair.visible = false;
            self.update_instructions(AnnotationMode::PointEllipse);
        } else {
            self.creating = None;
            self.mode = EllipseMode::Idle;
            self.crosshair.visible = false;
            self.update_instructions(AnnotationMode::PointEllipse);
        }
        tracing::debug!("[ellipse] selection changed, mode={:?}", self.mode);
    }

    fn hit_segment(&self, scene: &Scene, zoom: f64, point: DVec2) -> Option<(ShapeId, usize)> {
        let id = self.item?;
        let shape = scene.get(id)?;
        shape
            .hit_segment(point, self.config.hit_tolerance(zoom))
            .map(|idx| (id, idx))
    }
}

impl Tool for EllipseTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Ellipse
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>) {
        self.on_selection_changed(ctx.scene);
    }

    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>, finished: bool) {
        if finished {
            self.creating = None;
        }
        self.crosshair.visible = false;
        self.mode = EllipseMode::Idle;
        self.drag_refs = None;
        self.cursor = CursorHint::Default;
    }

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if let Some(id) = self.item_to_create.take() {
            let Some(shape) = ctx.scene.get_mut(id) else {
                return;
            };
            shape.matrix = DAffine2::IDENTITY;
            shape.set_geometry(ShapeKind::Ellipse, vec![event.point; 4]);
            self.item = Some(id);
            self.creating = Some(id);
            self.mode = EllipseMode::Creating;
            tracing::debug!("[ellipse] creating {:?} at {:?}", id, event.point);
            return;
        }

        let Some((id, idx)) = self.hit_segment(ctx.scene, ctx.viewport.zoom(), event.point) else {
            return;
        };
        let Some(shape) = ctx.scene.get_mut(id) else {
            return;
        };
        shape.bake();
        self.drag_refs = SegmentDragRefs::capture(shape.segments(), idx);
        if self.drag_refs.is_some() {
            self.mode = EllipseMode::SegmentDrag;
            tracing::debug!("[ellipse] segment drag {:?} point {}", id, idx);
        }
    }

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        match self.mode {
            EllipseMode::Creating => {
                let Some(shape) = self.creating.and_then(|id| ctx.scene.get_mut(id)) else {
                    self.crosshair.place(ctx.viewport, event.point);
                    return;
                };
                let (segments, end) = creation_segments(
                    event.down_point,
                    event.point,
                    ctx.viewport.rotation(),
                    event.modifiers.axis_lock(),
                );
                shape.set_segments(segments);
                self.crosshair.place(ctx.viewport, end);
            }
            EllipseMode::SegmentDrag => {
                let (Some(refs), Some(id)) = (self.drag_refs, self.item) else {
                    return;
                };
                if let (Some(segments), Some(shape)) = (
                    resize_segments(&refs, event.point, event.modifiers.axis_lock()),
                    ctx.scene.get_mut(id),
                ) {
                    shape.set_segments(segments);
                }
                self.crosshair.place(ctx.viewport, event.point);
            }
            EllipseMode::Idle | EllipseMode::Modifying => {
                self.crosshair.place(ctx.viewport, event.point);
            }
        }
    }

    fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        self.crosshair.place(ctx.viewport, event.point);
        if self.mode == EllipseMode::Modifying {
            self.cursor = if self
                .hit_segment(ctx.scene, ctx.viewport.zoom(), event.point)
                .is_some()
            {
                CursorHint::Resize
            } else {
                CursorHint::Default
            };
        }
    }

    fn pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _event: &PointerEvent) {
        self.drag_refs = None;
        self.creating = None;
        self.crosshair.visible = false;
        if self.item.is_some() {
            self.mode = EllipseMode::Modifying;
        }
        self.update_instructions(AnnotationMode::PointEllipse);
    }

    fn is_enabled_for_mode(&self, mode: AnnotationMode, _scene: &Scene) -> bool {
        matches!(mode, AnnotationMode::New | AnnotationMode::PointEllipse)
    }

    fn instructions(&self) -> Option<&'static str> {
        Some(self.instructions)
    }

    fn cursor(&self) -> CursorHint {
        self.cursor
    }
}
