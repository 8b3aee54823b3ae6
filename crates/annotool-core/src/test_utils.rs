//! Shared helpers for unit tests.

use glam::DVec2;

use crate::config::ToolConfig;
use crate::editor::{AnnotationMode, Key, Modifiers, ToolBox, ToolContext, ToolKind};
use crate::scene::{Scene, ShapeId};
use crate::viewport::SimpleViewport;

const TOLERANCE: f64 = 1e-9;

#[track_caller]
pub(crate) fn assert_near(a: f64, b: f64) {
    assert!((a - b).abs() < TOLERANCE, "{a} != {b}");
}

#[track_caller]
pub(crate) fn assert_vec_near(a: DVec2, b: DVec2) {
    assert!(a.distance(b) < TOLERANCE, "{a} != {b}");
}

/// Scene, an 800x600 viewport and a toolbox wired together.
///
/// Pointer positions are screen pixels, as delivered by a real viewer.
pub(crate) struct ToolHarness {
    pub scene: Scene,
    pub viewport: SimpleViewport,
    pub toolbox: ToolBox,
}

impl ToolHarness {
    pub fn new() -> Self {
        let mut viewport = SimpleViewport::new(DVec2::new(800.0, 600.0));
        let toolbox = ToolBox::new(ToolConfig::default(), &mut viewport);
        Self {
            scene: Scene::new(),
            viewport,
            toolbox,
        }
    }

    pub fn with_ctx<R>(&mut self, f: impl FnOnce(&mut ToolBox, &mut ToolContext<'_>) -> R) -> R {
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            viewport: &mut self.viewport,
        };
        f(&mut self.toolbox, &mut ctx)
    }

    pub fn select(&mut self, ids: &[ShapeId]) {
        self.scene.clear_selection();
        for id in ids {
            self.scene.select(*id);
        }
        self.with_ctx(|toolbox, ctx| toolbox.selection_changed(ctx));
    }

    pub fn set_mode(&mut self, mode: AnnotationMode) {
        self.with_ctx(|toolbox, ctx| toolbox.set_mode(ctx, mode));
    }

    pub fn activate(&mut self, kind: ToolKind) -> bool {
        self.with_ctx(|toolbox, ctx| toolbox.activate(ctx, kind))
    }

    pub fn deactivate(&mut self, finished: bool) {
        self.with_ctx(|toolbox, ctx| toolbox.deactivate(ctx, finished));
    }

    pub fn down(&mut self, pixel: DVec2) {
        self.with_ctx(|toolbox, ctx| toolbox.pointer_down(ctx, pixel, Modifiers::default()));
    }

    pub fn drag(&mut self, pixel: DVec2) {
        self.drag_with(pixel, Modifiers::default());
    }

    pub fn drag_with(&mut self, pixel: DVec2, modifiers: Modifiers) {
        self.with_ctx(|toolbox, ctx| toolbox.pointer_move(ctx, pixel, modifiers));
    }

    pub fn up(&mut self, pixel: DVec2) {
        self.with_ctx(|toolbox, ctx| toolbox.pointer_up(ctx, pixel, Modifiers::default()));
    }

    /// Hover without a press.
    pub fn move_to(&mut self, pixel: DVec2) {
        self.with_ctx(|toolbox, ctx| toolbox.pointer_move(ctx, pixel, Modifiers::default()));
    }

    pub fn key(&mut self, key: Key) -> bool {
        self.with_ctx(|toolbox, ctx| toolbox.key_down(ctx, key))
    }
}
