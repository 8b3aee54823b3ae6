//! Rotation dial for the image viewer.
//!
//! The dial lives in screen space. It shows the current view rotation with an
//! indicator dot, offers four cardinal quick-set regions, and a guide line with
//! an arrow that can be grabbed to rotate freely. Rotation always happens about
//! the dial centre so the image point under it stays put.

use std::sync::Arc;

use glam::DVec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{AnnotationMode, CursorHint, PointerEvent, Tool, ToolContext, ToolKind};
use crate::config::ToolConfig;
use crate::geometry;
use crate::scene::Scene;
use crate::viewport::{HandlerId, ViewerEvent, ViewerEventKind, Viewport};

/// Angle of north, the dial's zero direction.
const BASE_ANGLE: f64 = -90.0;

/// Absolute rotations of the cardinal regions (north, east, south, west).
pub const CARDINAL_ANGLES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

/// Opacity of a paused dial.
const PAUSED_OPACITY: f64 = 0.3;

/// Rotates the view to `degrees` about a screen point, keeping the image
/// point under `pivot_px` at the same pixel.
pub fn rotate_about_screen_point(viewport: &mut dyn Viewport, degrees: f64, pivot_px: DVec2) {
    let pivot = viewport.pixel_to_logical(pivot_px);
    let reference = viewport.logical_to_pixel(pivot);
    viewport.pan_to(pivot);
    viewport.set_rotation(degrees);
    let moved = viewport.pixel_to_logical(reference);
    viewport.pan_by(pivot - moved);
}

/// Rotates by a multiple of 90 degrees without rounding error.
fn quarter_turns(v: DVec2, turns: usize) -> DVec2 {
    (0..turns % 4).fold(v, |acc, _| acc.perp())
}

/// Part of the dial under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialPart {
    Arrow,
    Indicator,
    Circle,
    /// Index into [`CARDINAL_ANGLES`].
    Cardinal(usize),
}

/// Screen-space geometry of the dial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationDial {
    pub center: DVec2,
    pub radius: f64,
    pub inner_radius: f64,
    /// Current view rotation shown by the indicator.
    pub indicator_angle: f64,
    /// Direction of the guide line relative to north.
    pub line_angle: f64,
    pub line_length: f64,
    pub line_visible: bool,
    pub visible: bool,
    pub opacity: f64,
    view_size: DVec2,
}

impl RotationDial {
    /// Dial centred in a view whose centre is `view_center`.
    pub fn new(view_center: DVec2, max_radius: f64, inner_ratio: f64) -> Self {
        let size = view_center * 2.0;
        let radius = (size.x / 5.0).min(size.y / 5.0).min(max_radius);
        Self {
            center: view_center,
            radius,
            inner_radius: radius * inner_ratio,
            indicator_angle: 0.0,
            line_angle: 0.0,
            line_length: 0.0,
            line_visible: false,
            visible: false,
            opacity: 1.0,
            view_size: size,
        }
    }

    pub fn indicator_position(&self) -> DVec2 {
        self.center + geometry::rotate_vec(DVec2::new(0.0, -self.radius), self.indicator_angle)
    }

    pub fn indicator_radius(&self) -> f64 {
        self.inner_radius / 1.5
    }

    pub fn arrow_position(&self) -> DVec2 {
        self.center + geometry::rotate_vec(DVec2::new(0.0, -self.line_length), self.line_angle)
    }

    /// Distance beyond which the guide line shows.
    fn line_threshold(&self) -> f64 {
        self.radius + self.inner_radius * 1.5
    }

    /// Cardinal region containing a screen point.
    ///
    /// Each region is a bar of width `2 * inner_radius` reaching from the
    /// centre to `radius + 1.5 * inner_radius`, minus the circle.
    pub fn cardinal_at(&self, point: DVec2) -> Option<usize> {
        let v = point - self.center;
        if v.length() <= self.radius {
            return None;
        }
        (0..CARDINAL_ANGLES.len()).find(|&idx| {
            let local = quarter_turns(v, 4 - idx);
            local.x.abs() <= self.inner_radius && local.y <= 0.0 && local.y >= -self.line_threshold()
        })
    }

    /// Centre of a cardinal region's bounds.
    pub fn cardinal_center(&self, idx: usize) -> DVec2 {
        let r = self.radius;
        let i = self.inner_radius;
        let y = (-self.line_threshold() - (r * r - i * i).sqrt()) / 2.0;
        self.center + quarter_turns(DVec2::new(0.0, y), idx)
    }

    /// Topmost dial part under a screen point.
    pub fn hit(&self, point: DVec2) -> Option<DialPart> {
        if self.line_visible {
            let local = geometry::rotate_vec(point - self.center, -self.line_angle)
                - DVec2::new(0.0, -self.line_length);
            if local.x.abs() <= self.inner_radius * 2.0 && local.y.abs() <= self.inner_radius {
                return Some(DialPart::Arrow);
            }
        }
        if point.distance(self.indicator_position()) <= self.indicator_radius() {
            return Some(DialPart::Indicator);
        }
        if point.distance(self.center) <= self.radius {
            return Some(DialPart::Circle);
        }
        self.cardinal_at(point).map(DialPart::Cardinal)
    }

    pub fn set_current_rotation(&mut self, degrees: f64) {
        self.indicator_angle = degrees;
    }

    /// Points the guide line at `point`.
    pub fn set_line_orientation(&mut self, point: DVec2, make_visible: bool) {
        let v = point - self.center;
        self.line_angle = geometry::angle_of(v) - BASE_ANGLE;
        self.line_length = v.length();
        self.line_visible = make_visible || self.line_length > self.line_threshold();
    }

    pub fn move_by(&mut self, delta: DVec2) {
        self.center += delta;
    }

    /// Keeps the dial at the same relative position in a resized view.
    pub fn on_resize(&mut self, size: DVec2) {
        if self.view_size.x > 0.0 && self.view_size.y > 0.0 {
            self.center = self.center / self.view_size * size;
        }
        self.view_size = size;
    }
}

/// Dial state shared with viewer event handlers.
#[derive(Clone)]
pub struct DialStateStore {
    inner: Arc<RwLock<DialStateInner>>,
}

struct DialStateInner {
    dial: RotationDial,
    version: u64,
}

impl DialStateStore {
    pub fn new(dial: RotationDial) -> Self {
        Self {
            inner: Arc::new(RwLock::new(DialStateInner { dial, version: 0 })),
        }
    }

    pub fn get(&self) -> RotationDial {
        self.inner.read().dial.clone()
    }

    /// Get version for change detection.
    pub fn get_version(&self) -> u64 {
        self.inner.read().version
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut RotationDial) -> R) -> R {
        let mut inner = self.inner.write();
        inner.version += 1;
        f(&mut inner.dial)
    }
}

/// Drag in progress on the dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialDrag {
    Indicator,
    /// Offset between the view rotation and the pointer angle at press time.
    Arrow { offset: f64 },
    Circle,
    Cardinal(usize),
}

/// Tool that drives the rotation dial.
pub struct RotationControl {
    store: DialStateStore,
    drag: Option<DialDrag>,
    handlers: Vec<HandlerId>,
    cursor: CursorHint,
}

impl RotationControl {
    /// Creates the dial and subscribes it to the viewer's rotate and resize events.
    pub fn new(config: &ToolConfig, viewport: &mut dyn Viewport) -> Self {
        let mut dial = RotationDial::new(
            viewport.container_size() / 2.0,
            config.dial_max_radius,
            config.dial_inner_ratio,
        );
        dial.set_current_rotation(viewport.rotation());
        let store = DialStateStore::new(dial);

        let rotate_store = store.clone();
        let rotate = viewport.add_handler(
            ViewerEventKind::Rotate,
            Box::new(move |event| {
                if let ViewerEvent::Rotate { degrees } = event {
                    rotate_store.update(|dial| dial.set_current_rotation(*degrees));
                }
            }),
        );
        let resize_store = store.clone();
        let resize = viewport.add_handler(
            ViewerEventKind::Resize,
            Box::new(move |event| {
                if let ViewerEvent::Resize { size } = event {
                    resize_store.update(|dial| dial.on_resize(*size));
                }
            }),
        );

        Self {
            store,
            drag: None,
            handlers: vec![rotate, resize],
            cursor: CursorHint::Default,
        }
    }

    /// Snapshot of the dial.
    pub fn dial(&self) -> RotationDial {
        self.store.get()
    }

    pub fn store(&self) -> DialStateStore {
        self.store.clone()
    }

    pub fn drag(&self) -> Option<DialDrag> {
        self.drag
    }

    /// Unsubscribes from viewer events.
    pub fn detach(&mut self, viewport: &mut dyn Viewport) {
        for id in self.handlers.drain(..) {
            viewport.remove_handler(id);
        }
    }

    fn set_angle(&self, viewport: &mut dyn Viewport, degrees: f64) {
        let pivot = self.store.get().center;
        tracing::debug!("[rotation] set angle {:.2} about {:?}", degrees, pivot);
        rotate_about_screen_point(viewport, degrees, pivot);
    }
}

impl Tool for RotationControl {
    fn kind(&self) -> ToolKind {
        ToolKind::Rotation
    }

    fn screen_space(&self) -> bool {
        true
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>) {
        let view_center = ctx.viewport.container_size() / 2.0;
        self.store.update(|dial| {
            // recenter a hidden dial so it cannot stay lost off screen
            if !dial.visible {
                dial.center = view_center;
            }
            dial.visible = true;
            dial.opacity = 1.0;
        });
    }

    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>, finished: bool) {
        self.drag = None;
        self.cursor = CursorHint::Default;
        self.store.update(|dial| {
            if finished {
                dial.visible = false;
            }
            dial.opacity = PAUSED_OPACITY;
        });
    }

    fn pointer_down(&mut self, _ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let dial = self.store.get();
        self.drag = dial.hit(event.point).map(|part| match part {
            DialPart::Arrow => DialDrag::Arrow {
                offset: dial.indicator_angle - geometry::angle_of(event.point - dial.center),
            },
            DialPart::Indicator => DialDrag::Indicator,
            DialPart::Circle => DialDrag::Circle,
            DialPart::Cardinal(idx) => DialDrag::Cardinal(idx),
        });
    }

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let Some(drag) = self.drag else {
            return;
        };
        let dial = self.store.get();
        match drag {
            DialDrag::Indicator => {
                let angle = geometry::angle_of(event.point - dial.center) - BASE_ANGLE;
                self.set_angle(ctx.viewport, angle);
            }
            DialDrag::Arrow { offset } => {
                // over a cardinal region the line snaps to that direction
                let point = dial
                    .cardinal_at(event.point)
                    .map_or(event.point, |idx| dial.cardinal_center(idx));
                let angle = geometry::angle_of(point - dial.center) + offset;
                self.set_angle(ctx.viewport, angle);
                self.store.update(|dial| dial.set_line_orientation(point, true));
            }
            DialDrag::Circle => {
                self.store.update(|dial| dial.move_by(event.delta));
            }
            DialDrag::Cardinal(_) => {}
        }
    }

    fn pointer_move(&mut self, _ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let part = self.store.update(|dial| {
            dial.set_line_orientation(event.point, false);
            dial.hit(event.point)
        });
        self.cursor = match part {
            Some(DialPart::Arrow | DialPart::Indicator) => CursorHint::Rotate,
            Some(DialPart::Circle) => CursorHint::Move,
            Some(DialPart::Cardinal(_)) | None => CursorHint::Default,
        };
    }

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if let Some(DialDrag::Cardinal(idx)) = self.drag.take() {
            if self.store.get().cardinal_at(event.point) == Some(idx) {
                self.set_angle(ctx.viewport, CARDINAL_ANGLES[idx]);
            }
        }
    }

    fn is_enabled_for_mode(&self, _mode: AnnotationMode, _scene: &Scene) -> bool {
        true
    }

    fn cursor(&self) -> CursorHint {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Key;
    use crate::test_utils::{ToolHarness, assert_near, assert_vec_near};
    use crate::viewport::SimpleViewport;

    #[test]
    fn test_rotate_about_screen_point_keeps_pivot() {
        let mut viewport = SimpleViewport::new(DVec2::new(800.0, 600.0));
        viewport.set_zoom(2.0);
        viewport.pan_to(DVec2::new(1000.0, 250.0));
        viewport.set_rotation(-20.0);

        for (pivot_px, degrees) in [
            (DVec2::new(100.0, 450.0), 37.0),
            (DVec2::new(400.0, 300.0), 180.0),
            (DVec2::new(799.0, 1.0), -75.0),
        ] {
            let logical = viewport.pixel_to_logical(pivot_px);
            rotate_about_screen_point(&mut viewport, degrees, pivot_px);
            assert_near(viewport.rotation(), degrees);
            assert_vec_near(viewport.logical_to_pixel(logical), pivot_px);
        }
    }

    #[test]
    fn test_dial_radius_from_view() {
        let dial = RotationDial::new(DVec2::new(400.0, 300.0), 30.0, 0.3);
        assert_near(dial.radius, 30.0);
        assert_near(dial.inner_radius, 9.0);

        let small = RotationDial::new(DVec2::new(50.0, 25.0), 30.0, 0.3);
        assert_near(small.radius, 10.0);
        assert_near(small.inner_radius, 3.0);
    }

    #[test]
    fn test_cardinal_regions() {
        let dial = RotationDial::new(DVec2::new(400.0, 300.0), 30.0, 0.3);
        assert_eq!(dial.cardinal_at(DVec2::new(400.0, 262.0)), Some(0));
        assert_eq!(dial.cardinal_at(DVec2::new(438.0, 303.0)), Some(1));
        assert_eq!(dial.cardinal_at(DVec2::new(400.0, 338.0)), Some(2));
        assert_eq!(dial.cardinal_at(DVec2::new(362.0, 300.0)), Some(3));
        // inside the circle, beyond the bar, and between bars
        assert_eq!(dial.cardinal_at(DVec2::new(400.0, 280.0)), None);
        assert_eq!(dial.cardinal_at(DVec2::new(400.0, 250.0)), None);
        assert_eq!(dial.cardinal_at(DVec2::new(430.0, 270.0)), None);

        let east = dial.cardinal_center(1) - dial.center;
        assert_eq!(east.y, 0.0);
        assert!(east.x > dial.radius);
    }

    #[test]
    fn test_line_orientation_visibility() {
        let mut dial = RotationDial::new(DVec2::new(400.0, 300.0), 30.0, 0.3);
        dial.set_line_orientation(DVec2::new(400.0, 320.0), false);
        assert!(!dial.line_visible);
        assert_near(dial.line_angle, 180.0);
        dial.set_line_orientation(DVec2::new(500.0, 300.0), false);
        assert!(dial.line_visible);
        assert_near(dial.line_angle, 90.0);
        assert_vec_near(dial.arrow_position(), DVec2::new(500.0, 300.0));
    }

    #[test]
    fn test_arrow_drag_snaps_to_cardinal() {
        let mut harness = ToolHarness::new();
        assert!(harness.activate(ToolKind::Rotation));
        let center = DVec2::new(400.0, 300.0);
        let logical_center = harness.viewport.pixel_to_logical(center);

        harness.move_to(DVec2::new(400.0, 100.0));
        assert!(harness.toolbox.rotation().dial().line_visible);
        assert_eq!(harness.toolbox.cursor(), CursorHint::Rotate);

        harness.down(DVec2::new(400.0, 100.0));
        let Some(DialDrag::Arrow { offset }) = harness.toolbox.rotation().drag() else {
            panic!("expected an arrow drag");
        };
        assert_near(offset, 90.0);
        harness.drag(DVec2::new(438.0, 303.0));
        assert_near(harness.viewport.rotation(), 90.0);
        harness.up(DVec2::new(438.0, 303.0));

        let dial = harness.toolbox.rotation().dial();
        assert_near(dial.indicator_angle, 90.0);
        assert_near(dial.line_angle, 90.0);
        assert_vec_near(harness.viewport.logical_to_pixel(logical_center), center);
    }

    #[test]
    fn test_cardinal_click_sets_absolute_angle() {
        let mut harness = ToolHarness::new();
        harness.viewport.set_rotation(33.0);
        assert!(harness.activate(ToolKind::Rotation));
        assert_near(harness.toolbox.rotation().dial().indicator_angle, 33.0);

        harness.down(DVec2::new(400.0, 338.0));
        harness.up(DVec2::new(400.0, 338.0));
        assert_near(harness.viewport.rotation(), 180.0);
    }

    #[test]
    fn test_indicator_drag() {
        let mut harness = ToolHarness::new();
        assert!(harness.activate(ToolKind::Rotation));
        harness.down(DVec2::new(400.0, 270.0));
        assert_eq!(harness.toolbox.rotation().drag(), Some(DialDrag::Indicator));
        harness.drag(DVec2::new(460.0, 300.0));
        assert_near(harness.viewport.rotation(), 90.0);
    }

    #[test]
    fn test_circle_drag_moves_dial_and_reactivation() {
        let mut harness = ToolHarness::new();
        assert!(harness.activate(ToolKind::Rotation));
        harness.down(DVec2::new(400.0, 300.0));
        harness.drag(DVec2::new(410.0, 320.0));
        harness.up(DVec2::new(410.0, 320.0));
        assert_vec_near(harness.toolbox.rotation().dial().center, DVec2::new(410.0, 320.0));
        assert_eq!(harness.viewport.rotation(), 0.0);

        harness.deactivate(false);
        let dial = harness.toolbox.rotation().dial();
        assert!(dial.visible);
        assert_near(dial.opacity, 0.3);

        assert!(harness.activate(ToolKind::Rotation));
        assert_vec_near(harness.toolbox.rotation().dial().center, DVec2::new(410.0, 320.0));

        harness.key(Key::Escape);
        assert!(!harness.toolbox.rotation().dial().visible);
        assert!(harness.activate(ToolKind::Rotation));
        assert_vec_near(harness.toolbox.rotation().dial().center, DVec2::new(400.0, 300.0));
    }

    #[test]
    fn test_viewer_resize_keeps_relative_position() {
        let mut harness = ToolHarness::new();
        let version = harness.toolbox.rotation().store().get_version();
        harness.viewport.resize(DVec2::new(400.0, 300.0));
        assert_vec_near(harness.toolbox.rotation().dial().center, DVec2::new(200.0, 150.0));
        assert!(harness.toolbox.rotation().store().get_version() > version);
    }
}
