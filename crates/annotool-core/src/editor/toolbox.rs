//! Tool box: owns the tools and routes input to the active one.

use glam::DVec2;

use super::{
    AnnotationMode, CursorHint, EllipseTool, Key, ModeStore, Modifiers, PointerEvent,
    RotationControl, Tool, ToolContext, ToolKind, TransformEvent, TransformTool,
};
use crate::config::ToolConfig;
use crate::scene::Scene;
use crate::viewport::Viewport;

/// Owns one instance of every tool; at most one is active.
///
/// Pointer input arrives in screen pixels. Tools that work on the scene get
/// logical coordinates, screen-space tools get the pixels unchanged.
pub struct ToolBox {
    ellipse: EllipseTool,
    transform: TransformTool,
    rotation: RotationControl,
    active: Option<ToolKind>,
    mode: AnnotationMode,
    mode_store: ModeStore,
    /// Viewer mouse navigation at activation time.
    saved_mouse_nav: Option<bool>,
    press: Option<DVec2>,
    last: Option<DVec2>,
}

impl ToolBox {
    pub fn new(config: ToolConfig, viewport: &mut dyn Viewport) -> Self {
        tracing::info!("[toolbox] Creating tools with {:?}", config);
        Self {
            ellipse: EllipseTool::new(config.clone()),
            transform: TransformTool::new(config.clone()),
            rotation: RotationControl::new(&config, viewport),
            active: None,
            mode: AnnotationMode::default(),
            mode_store: ModeStore::new(),
            saved_mouse_nav: None,
            press: None,
            last: None,
        }
    }

    fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::Ellipse => &self.ellipse,
            ToolKind::Transform => &self.transform,
            ToolKind::Rotation => &self.rotation,
        }
    }

    fn tool_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Ellipse => &mut self.ellipse,
            ToolKind::Transform => &mut self.transform,
            ToolKind::Rotation => &mut self.rotation,
        }
    }

    pub fn active(&self) -> Option<ToolKind> {
        self.active
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    /// Store shared with the toolbar layer.
    pub fn mode_store(&self) -> ModeStore {
        self.mode_store.clone()
    }

    pub fn ellipse(&self) -> &EllipseTool {
        &self.ellipse
    }

    pub fn transform(&self) -> &TransformTool {
        &self.transform
    }

    pub fn rotation(&self) -> &RotationControl {
        &self.rotation
    }

    pub fn take_transform_events(&mut self) -> Vec<TransformEvent> {
        self.transform.take_events()
    }

    pub fn cursor(&self) -> CursorHint {
        self.active
            .map_or(CursorHint::Default, |kind| self.tool(kind).cursor())
    }

    pub fn instructions(&self) -> Option<&'static str> {
        self.active.and_then(|kind| self.tool(kind).instructions())
    }

    /// Tools that can be picked in the current mode.
    pub fn enabled_tools(&self, scene: &Scene) -> Vec<ToolKind> {
        [ToolKind::Ellipse, ToolKind::Transform, ToolKind::Rotation]
            .into_iter()
            .filter(|kind| self.tool(*kind).is_enabled_for_mode(self.mode, scene))
            .collect()
    }

    fn publish(&self) {
        self.mode_store
            .sync_from_toolbox(self.mode, self.active, self.instructions());
    }

    /// Switches mode, deactivating the active tool if it does not support it.
    pub fn set_mode(&mut self, ctx: &mut ToolContext<'_>, mode: AnnotationMode) {
        tracing::debug!("[toolbox] mode {} -> {}", self.mode, mode);
        self.mode = mode;
        if let Some(kind) = self.active {
            if !self.tool(kind).is_enabled_for_mode(mode, ctx.scene) {
                self.deactivate(ctx, true);
            }
        }
        self.publish();
    }

    /// Applies a mode change requested through the store.
    pub fn sync_mode(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(mode) = self.mode_store.take_pending_mode() {
            self.set_mode(ctx, mode);
        }
    }

    /// Activates a tool. Returns false when it is not enabled in the current mode.
    pub fn activate(&mut self, ctx: &mut ToolContext<'_>, kind: ToolKind) -> bool {
        if self.active == Some(kind) {
            return true;
        }
        if !self.tool(kind).is_enabled_for_mode(self.mode, ctx.scene) {
            tracing::warn!(
                "[toolbox] {} is not enabled in mode {}",
                kind.as_str(),
                self.mode
            );
            return false;
        }
        if self.active.is_some() {
            self.deactivate(ctx, true);
        }

        self.saved_mouse_nav = Some(ctx.viewport.mouse_nav_enabled());
        ctx.viewport.set_mouse_nav_enabled(false);
        self.press = None;
        self.last = None;
        self.tool_mut(kind).on_activate(ctx);
        self.active = Some(kind);
        tracing::info!("[toolbox] Activated {}", kind.as_str());
        self.publish();
        true
    }

    /// Deactivates the active tool and restores viewer mouse navigation.
    ///
    /// With `finished` false the tool is only paused and keeps its overlays.
    pub fn deactivate(&mut self, ctx: &mut ToolContext<'_>, finished: bool) {
        let Some(kind) = self.active.take() else {
            return;
        };
        self.tool_mut(kind).on_deactivate(ctx, finished);
        if let Some(enabled) = self.saved_mouse_nav.take() {
            ctx.viewport.set_mouse_nav_enabled(enabled);
        }
        self.press = None;
        self.last = None;
        tracing::info!(
            "[toolbox] Deactivated {} (finished={})",
            kind.as_str(),
            finished
        );
        self.publish();
    }

    /// Toolbar button behaviour: activate, or finish if already active.
    pub fn toggle(&mut self, ctx: &mut ToolContext<'_>, kind: ToolKind) -> bool {
        if self.active == Some(kind) {
            self.deactivate(ctx, true);
            false
        } else {
            self.activate(ctx, kind)
        }
    }

    /// Must be called after the scene selection changes.
    pub fn selection_changed(&mut self, ctx: &mut ToolContext<'_>) {
        if self.active == Some(ToolKind::Ellipse) {
            self.ellipse.on_selection_changed(ctx.scene);
            self.publish();
        }
    }

    fn event(
        &self,
        kind: ToolKind,
        viewport: &dyn Viewport,
        pixel: DVec2,
        modifiers: Modifiers,
    ) -> PointerEvent {
        let screen = self.tool(kind).screen_space();
        let map = |p: DVec2| {
            if screen {
                p
            } else {
                viewport.pixel_to_logical(p)
            }
        };
        let point = map(pixel);
        PointerEvent {
            point,
            down_point: self.press.map_or(point, map),
            delta: self.last.map_or(DVec2::ZERO, |last| point - map(last)),
            modifiers,
        }
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, pixel: DVec2, modifiers: Modifiers) {
        let Some(kind) = self.active else {
            return;
        };
        self.press = Some(pixel);
        self.last = Some(pixel);
        let event = self.event(kind, &*ctx.viewport, pixel, modifiers);
        self.tool_mut(kind).pointer_down(ctx, &event);
    }

    /// Pointer motion; delivered as a drag while a press is held.
    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, pixel: DVec2, modifiers: Modifiers) {
        let Some(kind) = self.active else {
            return;
        };
        let event = self.event(kind, &*ctx.viewport, pixel, modifiers);
        if self.press.is_some() {
            self.tool_mut(kind).pointer_drag(ctx, &event);
            self.last = Some(pixel);
        } else {
            self.tool_mut(kind).pointer_move(ctx, &event);
        }
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, pixel: DVec2, modifiers: Modifiers) {
        let Some(kind) = self.active else {
            return;
        };
        let event = self.event(kind, &*ctx.viewport, pixel, modifiers);
        self.tool_mut(kind).pointer_up(ctx, &event);
        self.press = None;
        self.last = None;
        self.publish();
    }

    /// Escape finishes the active tool; other keys go to the tool.
    pub fn key_down(&mut self, ctx: &mut ToolContext<'_>, key: Key) -> bool {
        let Some(kind) = self.active else {
            return false;
        };
        if key == Key::Escape {
            self.deactivate(ctx, true);
            return true;
        }
        self.tool_mut(kind).key_down(ctx, key)
    }

    /// Unsubscribes the tools from viewer events.
    pub fn detach(&mut self, viewport: &mut dyn Viewport) {
        self.rotation.detach(viewport);
    }
}
