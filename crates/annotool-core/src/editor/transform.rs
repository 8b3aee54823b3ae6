//! Transform tool: resize, rotate and move the selected annotations.
//!
//! While a gesture runs, every participating shape accumulates the transform
//! in its own matrix. The tool keeps a matching frame in its [`HandleSet`]
//! (rotation and translation only). Releasing the pointer bakes the matrices
//! into the shapes; the frame and handles carry over to the next gesture and
//! are only re-measured when the session changes.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

use super::{AnnotationMode, CursorHint, HandleHit, HandleSet, PointerEvent, Tool, ToolContext, ToolKind};
use crate::config::ToolConfig;
use crate::geometry::{self, Corner, EPSILON, Rect};
use crate::scene::{HitOptions, HitResult, Scene, ShapeId};

/// Modes in which the transform tool can be picked.
const ENABLED_MODES: [AnnotationMode; 8] = [
    AnnotationMode::Select,
    AnnotationMode::MultiSelection,
    AnnotationMode::MultiPolygon,
    AnnotationMode::PointRectangle,
    AnnotationMode::PointEllipse,
    AnnotationMode::Point,
    AnnotationMode::LineString,
    AnnotationMode::GeometryCollectionRaster,
];

/// Notification for the embedding layer, one per participating shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformEvent {
    Scale {
        shape: ShapeId,
        /// Global position of the fixed corner.
        pivot: DVec2,
        /// Rotation of the tool frame in degrees.
        rotation: f64,
        /// Scale applied in the global frame.
        matrix: DAffine2,
    },
    Rotate {
        shape: ShapeId,
        angle: f64,
        center: DVec2,
    },
    Translate {
        shape: ShapeId,
        delta: DVec2,
    },
    Complete {
        shape: ShapeId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformState {
    #[default]
    Idle,
    Resizing(Corner),
    Rotating,
    Translating,
}

#[derive(Debug, Clone)]
pub struct TransformTool {
    config: ToolConfig,
    handles: HandleSet,
    transforming: Vec<ShapeId>,
    state: TransformState,
    events: Vec<TransformEvent>,
    visible: bool,
    overlay_front: bool,
    cursor: CursorHint,
}

impl TransformTool {
    pub fn new(config: ToolConfig) -> Self {
        let handles = HandleSet::new(config.control_pixel_size, 1.0);
        Self {
            config,
            handles,
            transforming: Vec::new(),
            state: TransformState::Idle,
            events: Vec::new(),
            visible: false,
            overlay_front: false,
            cursor: CursorHint::Default,
        }
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    pub fn handles(&self) -> &HandleSet {
        &self.handles
    }

    /// Shapes in the current session.
    pub fn items(&self) -> &[ShapeId] {
        &self.transforming
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the handle overlay is drawn above the scene.
    pub fn overlay_front(&self) -> bool {
        self.overlay_front
    }

    /// Drains queued transform events.
    pub fn take_events(&mut self) -> Vec<TransformEvent> {
        std::mem::take(&mut self.events)
    }

    /// Finishes the current session and starts a new one for `items`.
    ///
    /// Previous items get their matrices baked and a `Complete` event. New
    /// items are baked and measured into a fresh, unrotated tool frame.
    pub fn transform_items(&mut self, scene: &mut Scene, items: Vec<ShapeId>) {
        self.commit(scene);

        self.transforming = items.into_iter().filter(|id| scene.contains(*id)).collect();
        for id in &self.transforming {
            if let Some(shape) = scene.get_mut(*id) {
                shape.bake();
            }
        }
        let bounds = scene.union_bounds(&self.transforming).unwrap_or_default();
        self.handles.set_bounds(Some(bounds));
        tracing::debug!(
            "[transform] session with {} items, bounds {:?}",
            self.transforming.len(),
            bounds
        );
    }

    /// Feature under `point`: annotations, or shapes inside an annotation group.
    pub fn hit_test(&self, scene: &Scene, point: DVec2, zoom: f64) -> Option<HitResult> {
        scene.hit_test(
            point,
            &HitOptions {
                fill: true,
                stroke: true,
                segments: true,
                tolerance: self.config.hit_tolerance(zoom),
                annotations_only: true,
            },
        )
    }

    /// Drags `corner` by a global `delta`, scaling about the opposite corner.
    pub fn resize(&mut self, scene: &mut Scene, corner: Corner, delta: DVec2, axis_lock: bool) {
        let rotation = self.handles.rotation();
        let handle = *self.handles.corner(corner);
        let opposite = *self.handles.corner(handle.opposite);
        let ref_local = opposite.position;

        let mut delta = geometry::rotate_vec(delta, -rotation);
        if axis_lock {
            let Some(projected) = geometry::project(delta, handle.position - ref_local) else {
                return;
            };
            delta = projected;
        }

        let old_size = Rect::from_points(ref_local, handle.position).size();
        let new_size = Rect::from_points(ref_local, handle.position + delta).size();
        let factors = DVec2::new(
            scale_factor(old_size.x, new_size.x),
            scale_factor(old_size.y, new_size.y),
        );
        if factors == DVec2::ONE {
            return;
        }

        // scale in the tool frame, applied to shapes in the global frame
        let pivot = self.handles.to_global(ref_local);
        let frame = self.handles.matrix();
        let scale = geometry::scale_about(factors, self.handles.to_local(opposite.ref_pos));
        let matrix = frame * scale * frame.inverse();
        for id in &self.transforming {
            if let Some(shape) = scene.get_mut(*id) {
                shape.transform(matrix);
                self.events.push(TransformEvent::Scale {
                    shape: *id,
                    pivot,
                    rotation,
                    matrix,
                });
            }
        }
        self.handles.scale_bounds(factors, ref_local);
    }

    /// Rotates about the bounding box centre by the angle swept from
    /// `point - delta` to `point`.
    pub fn rotate(&mut self, scene: &mut Scene, point: DVec2, delta: DVec2) {
        let center = self.handles.global_center();
        let angle = geometry::angle_of(point - center) - geometry::angle_of(point - delta - center);
        if angle == 0.0 {
            return;
        }

        self.handles.rotate(angle, center);
        for id in &self.transforming {
            if let Some(shape) = scene.get_mut(*id) {
                shape.rotate(angle, center);
                self.events.push(TransformEvent::Rotate {
                    shape: *id,
                    angle,
                    center,
                });
            }
        }
    }

    pub fn translate(&mut self, scene: &mut Scene, delta: DVec2) {
        if delta == DVec2::ZERO {
            return;
        }
        self.handles.translate(delta);
        for id in &self.transforming {
            if let Some(shape) = scene.get_mut(*id) {
                shape.translate(delta);
                self.events.push(TransformEvent::Translate { shape: *id, delta });
            }
        }
    }

    /// Bakes every shape of the session and emits `Complete` for each.
    ///
    /// The tool frame, bounding rectangle and `ref_pos` are kept, so a
    /// rotated selection keeps its rotated handles.
    pub fn commit(&mut self, scene: &mut Scene) {
        for id in &self.transforming {
            if let Some(shape) = scene.get_mut(*id) {
                shape.bake();
                self.events.push(TransformEvent::Complete { shape: *id });
            }
        }
    }
}

/// Ratio of new to old extent. Axes that have or would reach zero size keep 1.
fn scale_factor(old: f64, new: f64) -> f64 {
    if old.abs() < EPSILON || new.abs() < EPSILON {
        1.0
    } else {
        new / old
    }
}

impl Tool for TransformTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Transform
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>) {
        self.handles.rescale(ctx.viewport.zoom());
        self.overlay_front = true;
        self.visible = true;
        let items = ctx.scene.selected_annotations();
        self.transform_items(ctx.scene, items);
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>, finished: bool) {
        self.cursor = CursorHint::Default;
        self.state = TransformState::Idle;
        if finished {
            self.overlay_front = false;
            self.transform_items(ctx.scene, Vec::new());
            self.visible = false;
        }
    }

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if !self.visible {
            return;
        }
        self.handles.rescale(ctx.viewport.zoom());
        self.state = match self.handles.hit(event.point) {
            Some(HandleHit::Corner(corner)) => TransformState::Resizing(corner),
            Some(HandleHit::Rotation) => TransformState::Rotating,
            None if self.handles.display_contains(event.point) => TransformState::Translating,
            None => TransformState::Idle,
        };
        tracing::debug!("[transform] pointer down, state={:?}", self.state);
    }

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        match self.state {
            TransformState::Resizing(corner) => {
                self.resize(ctx.scene, corner, event.delta, event.modifiers.axis_lock());
            }
            TransformState::Rotating => self.rotate(ctx.scene, event.point, event.delta),
            TransformState::Translating => self.translate(ctx.scene, event.delta),
            TransformState::Idle => {}
        }
    }

    fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if !self.visible {
            return;
        }
        self.handles.rescale(ctx.viewport.zoom());
        self.cursor = match self.handles.hit(event.point) {
            Some(HandleHit::Corner(_)) => CursorHint::Resize,
            Some(HandleHit::Rotation) => CursorHint::Rotate,
            None if self.handles.display_contains(event.point) => CursorHint::Move,
            None => CursorHint::Default,
        };
    }

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, _event: &PointerEvent) {
        if self.state == TransformState::Idle {
            return;
        }
        tracing::debug!("[transform] committing {:?}", self.state);
        self.state = TransformState::Idle;
        self.commit(ctx.scene);
    }

    fn is_enabled_for_mode(&self, mode: AnnotationMode, scene: &Scene) -> bool {
        !scene.selected().is_empty() && ENABLED_MODES.contains(&mode)
    }

    fn cursor(&self) -> CursorHint {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Modifiers;
    use crate::shape::Shape;
    use crate::test_utils::{ToolHarness, assert_near, assert_vec_near};

    fn harness_with_rect(min: DVec2, max: DVec2) -> (ToolHarness, ShapeId) {
        let mut harness = ToolHarness::new();
        let id = harness
            .scene
            .add(Shape::rectangle(Rect::from_points(min, max)).annotation());
        harness.select(&[id]);
        harness.set_mode(AnnotationMode::Select);
        assert!(harness.activate(ToolKind::Transform));
        (harness, id)
    }

    #[test]
    fn test_incremental_resize_matches_direct_geometry() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        harness.down(DVec2::new(100.0, 50.0));
        assert_eq!(
            harness.toolbox.transform().state(),
            TransformState::Resizing(Corner::BottomRight)
        );
        harness.drag(DVec2::new(150.0, 50.0));
        harness.drag(DVec2::new(200.0, 100.0));
        harness.up(DVec2::new(200.0, 100.0));

        let shape = harness.scene.get(id).unwrap();
        assert!(!shape.has_pending_transform());
        let direct = Shape::rectangle(Rect::from_points(DVec2::ZERO, DVec2::new(200.0, 100.0)));
        for (got, want) in shape.segments().iter().zip(direct.segments()) {
            assert_vec_near(*got, *want);
        }

        let events = harness.toolbox.take_transform_events();
        assert_eq!(events.iter().filter(|e| matches!(e, TransformEvent::Scale { .. })).count(), 2);
        assert_eq!(events.last(), Some(&TransformEvent::Complete { shape: id }));

        // handles follow the scaled rectangle
        let bounds = harness.toolbox.transform().handles().bounding_rect();
        assert_vec_near(bounds.max, DVec2::new(200.0, 100.0));
    }

    #[test]
    fn test_axis_lock_resize_is_proportional() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        let lock = Modifiers {
            command: true,
            ..Modifiers::default()
        };
        harness.down(DVec2::new(100.0, 50.0));
        harness.drag_with(DVec2::new(130.0, 50.0), lock);
        harness.up(DVec2::new(130.0, 50.0));

        let bounds = harness.scene.get(id).unwrap().bounds().unwrap();
        assert_vec_near(bounds.min, DVec2::ZERO);
        assert_vec_near(bounds.max, DVec2::new(124.0, 62.0));
    }

    #[test]
    fn test_rotate_then_back_restores_points() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        let before = harness.scene.get(id).unwrap().segments().to_vec();

        let center = DVec2::new(50.0, 25.0);
        let grip = DVec2::new(50.0, -24.0);
        harness.down(grip);
        assert_eq!(harness.toolbox.transform().state(), TransformState::Rotating);
        harness.drag(geometry::rotate_about(grip, 30.0, center));
        let rotation = harness.toolbox.transform().handles().rotation();
        assert_near(rotation, 30.0);
        harness.drag(grip);
        harness.up(grip);

        let after = harness.scene.get(id).unwrap().segments().to_vec();
        for (a, b) in before.iter().zip(&after) {
            assert_vec_near(*a, *b);
        }
    }

    #[test]
    fn test_zero_angle_rotation_is_noop() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        harness.down(DVec2::new(50.0, -24.0));
        // radial drag sweeps no angle
        harness.drag(DVec2::new(50.0, -40.0));

        let shape = harness.scene.get(id).unwrap();
        assert_eq!(shape.matrix, DAffine2::IDENTITY);
        assert!(harness.toolbox.take_transform_events().is_empty());
    }

    #[test]
    fn test_translate_inside_bounds() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        harness.move_to(DVec2::new(50.0, 25.0));
        assert_eq!(harness.toolbox.cursor(), CursorHint::Move);

        harness.down(DVec2::new(50.0, 25.0));
        assert_eq!(harness.toolbox.transform().state(), TransformState::Translating);
        harness.drag(DVec2::new(60.0, 35.0));
        harness.up(DVec2::new(60.0, 35.0));

        let bounds = harness.scene.get(id).unwrap().bounds().unwrap();
        assert_vec_near(bounds.min, DVec2::new(10.0, 10.0));
        assert_vec_near(bounds.max, DVec2::new(110.0, 60.0));
        let events = harness.toolbox.take_transform_events();
        assert!(events.contains(&TransformEvent::Translate {
            shape: id,
            delta: DVec2::new(10.0, 10.0)
        }));
    }

    #[test]
    fn test_resize_in_rotated_frame() {
        let mut scene = Scene::new();
        let id = scene.add(Shape::rectangle(Rect::from_points(DVec2::ZERO, DVec2::new(100.0, 50.0))));
        let mut tool = TransformTool::new(ToolConfig::default());
        tool.transform_items(&mut scene, vec![id]);

        tool.rotate(&mut scene, DVec2::new(50.0, 125.0), DVec2::new(-100.0, 100.0));
        assert_near(tool.handles().rotation(), 90.0);
        assert_vec_near(tool.handles().corner(Corner::TopLeft).ref_pos, DVec2::new(75.0, -25.0));

        // global +y is local +x after a quarter turn
        tool.resize(&mut scene, Corner::BottomRight, DVec2::new(0.0, 10.0), false);
        tool.commit(&mut scene);

        let bounds = scene.get(id).unwrap().bounds().unwrap();
        assert_vec_near(bounds.min, DVec2::new(25.0, -25.0));
        assert_vec_near(bounds.max, DVec2::new(75.0, 85.0));
    }

    #[test]
    fn test_rotated_frame_survives_release() {
        let (mut harness, id) = harness_with_rect(DVec2::new(100.0, 100.0), DVec2::new(200.0, 150.0));
        let center = DVec2::new(150.0, 125.0);
        let grip = DVec2::new(150.0, 76.0);
        harness.down(grip);
        harness.drag(geometry::rotate_about(grip, 30.0, center));
        harness.up(geometry::rotate_about(grip, 30.0, center));

        let handles = harness.toolbox.transform().handles().clone();
        assert_eq!(harness.toolbox.transform().state(), TransformState::Idle);
        assert_near(handles.rotation(), 30.0);
        assert!(!harness.scene.get(id).unwrap().has_pending_transform());

        let corner = handles.to_global(handles.corner(Corner::BottomRight).position);
        let fixed = handles.to_global(handles.corner(Corner::TopLeft).position);
        harness.down(corner);
        assert_eq!(
            harness.toolbox.transform().state(),
            TransformState::Resizing(Corner::BottomRight)
        );
        harness.drag(corner + DVec2::new(40.0, 0.0));
        harness.up(corner + DVec2::new(40.0, 0.0));

        // still a rectangle, scaled in the rotated frame about the fixed corner
        let segments = harness.scene.get(id).unwrap().segments().to_vec();
        for i in 0..4 {
            let a = segments[(i + 1) % 4] - segments[i];
            let b = segments[(i + 3) % 4] - segments[i];
            assert!(a.dot(b).abs() < 1e-6, "corner {i} is not square");
        }
        assert_vec_near(segments[1], fixed);
        assert_near(harness.toolbox.transform().handles().rotation(), 30.0);
    }

    #[test]
    fn test_second_resize_pivots_on_moved_corner() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        harness.down(DVec2::new(100.0, 50.0));
        harness.drag(DVec2::new(200.0, 100.0));
        harness.up(DVec2::new(200.0, 100.0));

        harness.down(DVec2::ZERO);
        assert_eq!(
            harness.toolbox.transform().state(),
            TransformState::Resizing(Corner::TopLeft)
        );
        harness.drag(DVec2::new(-100.0, 0.0));
        harness.up(DVec2::new(-100.0, 0.0));

        let bounds = harness.scene.get(id).unwrap().bounds().unwrap();
        assert_vec_near(bounds.min, DVec2::new(-100.0, 0.0));
        assert_vec_near(bounds.max, DVec2::new(200.0, 100.0));
    }

    #[test]
    fn test_handle_cursor_hints() {
        let (mut harness, _) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        harness.move_to(DVec2::new(2.0, 2.0));
        assert_eq!(harness.toolbox.cursor(), CursorHint::Resize);
        harness.move_to(DVec2::new(50.0, -24.0));
        assert_eq!(harness.toolbox.cursor(), CursorHint::Rotate);
        harness.move_to(DVec2::new(300.0, 300.0));
        assert_eq!(harness.toolbox.cursor(), CursorHint::Default);
    }

    #[test]
    fn test_enabled_modes_need_selection() {
        let tool = TransformTool::new(ToolConfig::default());
        let mut scene = Scene::new();
        assert!(!tool.is_enabled_for_mode(AnnotationMode::Select, &scene));
        let id = scene.add(Shape::polyline(vec![DVec2::ZERO, DVec2::ONE]).annotation());
        scene.select(id);
        assert!(tool.is_enabled_for_mode(AnnotationMode::Select, &scene));
        assert!(tool.is_enabled_for_mode(AnnotationMode::GeometryCollectionRaster, &scene));
        assert!(!tool.is_enabled_for_mode(AnnotationMode::New, &scene));
        assert!(!tool.is_enabled_for_mode(AnnotationMode::Transform, &scene));
    }

    #[test]
    fn test_hit_test_matches_annotation_groups() {
        let mut scene = Scene::new();
        let overlay = scene.add(Shape::rectangle(Rect::from_points(DVec2::ZERO, DVec2::splat(10.0))));
        let part = scene.add(Shape::rectangle(Rect::from_points(DVec2::splat(20.0), DVec2::splat(30.0))));
        let group = scene.add_group("feature", true);
        scene.set_parent(part, Some(group)).unwrap();
        let tool = TransformTool::new(ToolConfig::default());

        assert!(tool.hit_test(&scene, DVec2::splat(5.0), 1.0).is_none());
        let hit = tool.hit_test(&scene, DVec2::new(31.0, 25.0), 1.0).unwrap();
        assert_eq!(hit.shape, part);
        assert_eq!(hit.group, Some(group));
        // tolerance shrinks when zoomed in
        assert!(tool.hit_test(&scene, DVec2::new(31.0, 25.0), 10.0).is_none());
        assert!(scene.get(overlay).is_some());
    }

    #[test]
    fn test_finished_deactivation_hides_and_bakes() {
        let (mut harness, id) = harness_with_rect(DVec2::ZERO, DVec2::new(100.0, 50.0));
        harness.down(DVec2::new(50.0, 25.0));
        harness.drag(DVec2::new(55.0, 25.0));
        harness.key(crate::editor::Key::Escape);

        assert!(!harness.toolbox.transform().is_visible());
        assert!(harness.toolbox.transform().items().is_empty());
        assert!(!harness.scene.get(id).unwrap().has_pending_transform());
        let bounds = harness.scene.get(id).unwrap().bounds().unwrap();
        assert_vec_near(bounds.min, DVec2::new(5.0, 0.0));
    }
}
