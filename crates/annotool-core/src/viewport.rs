//! Viewer abstraction used by the tools.
//!
//! The editing tools never talk to a concrete image viewer. They go through
//! [`Viewport`], which exposes zoom, rotation, coordinate conversion, panning
//! and named event handlers. [`SimpleViewport`] implements the math headlessly.

use glam::DVec2;

use crate::geometry;

/// Identifier returned by [`Viewport::add_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Event kinds a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerEventKind {
    Rotate,
    Resize,
}

/// Event raised by the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    /// Rotation changed to `degrees`.
    Rotate { degrees: f64 },
    /// Container resized to `size` pixels.
    Resize { size: DVec2 },
}

impl ViewerEvent {
    pub fn kind(&self) -> ViewerEventKind {
        match self {
            Self::Rotate { .. } => ViewerEventKind::Rotate,
            Self::Resize { .. } => ViewerEventKind::Resize,
        }
    }
}

pub type ViewerHandler = Box<dyn FnMut(&ViewerEvent)>;

/// Zoomable, rotatable view onto the logical image plane.
pub trait Viewport {
    /// Pixels per logical unit.
    fn zoom(&self) -> f64;

    /// View rotation in degrees.
    fn rotation(&self) -> f64;

    /// Sets the view rotation, raising a rotate event when it changes.
    fn set_rotation(&mut self, degrees: f64);

    /// Logical point shown at the centre of the container.
    fn center(&self) -> DVec2;

    /// Container size in pixels.
    fn container_size(&self) -> DVec2;

    fn pixel_to_logical(&self, pixel: DVec2) -> DVec2;

    fn logical_to_pixel(&self, point: DVec2) -> DVec2;

    /// Centres the view on a logical point.
    fn pan_to(&mut self, point: DVec2);

    /// Moves the view centre by a logical delta.
    fn pan_by(&mut self, delta: DVec2);

    fn mouse_nav_enabled(&self) -> bool;

    fn set_mouse_nav_enabled(&mut self, enabled: bool);

    fn add_handler(&mut self, kind: ViewerEventKind, handler: ViewerHandler) -> HandlerId;

    /// Returns false when the id is unknown.
    fn remove_handler(&mut self, id: HandlerId) -> bool;
}

/// Headless viewport with plain pan/zoom/rotate math.
pub struct SimpleViewport {
    center: DVec2,
    zoom: f64,
    rotation: f64,
    size: DVec2,
    mouse_nav: bool,
    handlers: Vec<(HandlerId, ViewerEventKind, ViewerHandler)>,
    next_handler: u64,
}

impl std::fmt::Debug for SimpleViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleViewport")
            .field("center", &self.center)
            .field("zoom", &self.zoom)
            .field("rotation", &self.rotation)
            .field("size", &self.size)
            .field("mouse_nav", &self.mouse_nav)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl SimpleViewport {
    /// Viewport of `size` pixels centred on the middle of the image at zoom 1.
    pub fn new(size: DVec2) -> Self {
        Self {
            center: size / 2.0,
            zoom: 1.0,
            rotation: 0.0,
            size,
            mouse_nav: true,
            handlers: Vec::new(),
            next_handler: 0,
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    /// Resizes the container and raises a resize event.
    pub fn resize(&mut self, size: DVec2) {
        self.size = size;
        self.emit(ViewerEvent::Resize { size });
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn emit(&mut self, event: ViewerEvent) {
        let kind = event.kind();
        for (_, handler_kind, handler) in &mut self.handlers {
            if *handler_kind == kind {
                handler(&event);
            }
        }
    }
}

impl Viewport for SimpleViewport {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn set_rotation(&mut self, degrees: f64) {
        if self.rotation == degrees {
            return;
        }
        self.rotation = degrees;
        self.emit(ViewerEvent::Rotate { degrees });
    }

    fn center(&self) -> DVec2 {
        self.center
    }

    fn container_size(&self) -> DVec2 {
        self.size
    }

    fn pixel_to_logical(&self, pixel: DVec2) -> DVec2 {
        self.center + geometry::rotate_vec((pixel - self.size / 2.0) / self.zoom, -self.rotation)
    }

    fn logical_to_pixel(&self, point: DVec2) -> DVec2 {
        geometry::rotate_vec(point - self.center, self.rotation) * self.zoom + self.size / 2.0
    }

    fn pan_to(&mut self, point: DVec2) {
        self.center = point;
    }

    fn pan_by(&mut self, delta: DVec2) {
        self.center += delta;
    }

    fn mouse_nav_enabled(&self) -> bool {
        self.mouse_nav
    }

    fn set_mouse_nav_enabled(&mut self, enabled: bool) {
        self.mouse_nav = enabled;
    }

    fn add_handler(&mut self, kind: ViewerEventKind, handler: ViewerHandler) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push((id, kind, handler));
        id
    }

    fn remove_handler(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _, _)| *handler_id != id);
        self.handlers.len() != before
    }
}
