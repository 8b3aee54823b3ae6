//! Handle geometry for the transform tool.
//!
//! The handle set keeps its bounding rectangle in its own local frame and a
//! matrix (rotation and translation only) that places that frame in the scene.
//! Handle sizes are divided by the zoom so they stay constant on screen.

use glam::{DAffine2, DVec2};

use crate::geometry::{self, Corner, Rect};

/// Corner handle of the bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerHandle {
    pub anchor: Corner,
    pub opposite: Corner,
    /// Centre of the handle in the tool frame.
    pub position: DVec2,
    /// Global position of the corner. Follows every rotation, translation
    /// and scale of the frame.
    pub ref_pos: DVec2,
}

/// Handle hit by a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleHit {
    Corner(Corner),
    Rotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandleSet {
    base_size: f64,
    size: f64,
    bounding_rect: Rect,
    matrix: DAffine2,
    corners: [CornerHandle; 4],
    rotation_handle: DVec2,
}

impl HandleSet {
    pub fn new(base_size: f64, zoom: f64) -> Self {
        let corners = Corner::ALL.map(|anchor| CornerHandle {
            anchor,
            opposite: anchor.opposite(),
            position: DVec2::ZERO,
            ref_pos: DVec2::ZERO,
        });
        let mut handles = Self {
            base_size,
            size: base_size / zoom,
            bounding_rect: Rect::default(),
            matrix: DAffine2::IDENTITY,
            corners,
            rotation_handle: DVec2::ZERO,
        };
        handles.layout(true);
        handles
    }

    /// Edge length of the corner handles in logical units.
    pub fn handle_size(&self) -> f64 {
        self.size
    }

    /// Radius of the rotation handle in logical units.
    pub fn rotation_radius(&self) -> f64 {
        self.size
    }

    /// Recomputes sizes for a new zoom. Positions in the tool frame are kept.
    pub fn rescale(&mut self, zoom: f64) {
        let size = self.base_size / zoom;
        if (size - self.size).abs() > f64::EPSILON {
            self.size = size;
            self.layout(false);
        }
    }

    pub fn matrix(&self) -> DAffine2 {
        self.matrix
    }

    /// Rotation of the tool frame in degrees.
    pub fn rotation(&self) -> f64 {
        geometry::matrix_rotation(&self.matrix)
    }

    pub fn bounding_rect(&self) -> Rect {
        self.bounding_rect
    }

    /// Centre of the bounding rectangle in the global frame.
    pub fn global_center(&self) -> DVec2 {
        self.to_global(self.bounding_rect.center())
    }

    pub fn corner(&self, corner: Corner) -> &CornerHandle {
        &self.corners[corner.index()]
    }

    pub fn corners(&self) -> &[CornerHandle; 4] {
        &self.corners
    }

    /// Centre of the rotation handle in the tool frame.
    pub fn rotation_handle(&self) -> DVec2 {
        self.rotation_handle
    }

    pub fn to_global(&self, point: DVec2) -> DVec2 {
        self.matrix.transform_point2(point)
    }

    pub fn to_local(&self, point: DVec2) -> DVec2 {
        self.matrix.inverse().transform_point2(point)
    }

    /// Sets new bounds and resets the tool frame, or re-lays out the current
    /// rectangle when `bounds` is `None`.
    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        match bounds {
            Some(rect) => {
                self.matrix = DAffine2::IDENTITY;
                self.bounding_rect = rect;
                self.layout(true);
            }
            None => self.layout(false),
        }
    }

    fn layout(&mut self, refresh_refs: bool) {
        let rect = self.bounding_rect;
        for handle in &mut self.corners {
            handle.position = rect.corner(handle.anchor);
            if refresh_refs {
                handle.ref_pos = self.matrix.transform_point2(handle.position);
            }
        }
        let radius = self.rotation_radius();
        self.rotation_handle = rect.center() - DVec2::new(0.0, rect.size().y / 2.0 + radius * 2.0);
    }

    /// Scales the bounding rectangle about a point in the tool frame.
    ///
    /// The rectangle is not re-measured from the shapes; the corners' global
    /// positions are refreshed so any of them can be the next pivot.
    pub fn scale_bounds(&mut self, factors: DVec2, pivot: DVec2) {
        self.bounding_rect = self.bounding_rect.scale_about(factors, pivot);
        self.layout(true);
    }

    /// Rotates the tool frame and every `ref_pos` about a global point.
    pub fn rotate(&mut self, degrees: f64, center: DVec2) {
        self.matrix = geometry::rotation_about(degrees, center) * self.matrix;
        for handle in &mut self.corners {
            handle.ref_pos = geometry::rotate_about(handle.ref_pos, degrees, center);
        }
    }

    /// Moves the tool frame and every `ref_pos` by a global delta.
    pub fn translate(&mut self, delta: DVec2) {
        self.matrix = DAffine2::from_translation(delta) * self.matrix;
        for handle in &mut self.corners {
            handle.ref_pos += delta;
        }
    }

    /// Handle under a global point. The rotation handle wins over corners.
    pub fn hit(&self, point: DVec2) -> Option<HandleHit> {
        let local = self.to_local(point);
        if local.distance(self.rotation_handle) <= self.rotation_radius() {
            return Some(HandleHit::Rotation);
        }
        let half = self.size / 2.0;
        self.corners
            .iter()
            .find(|handle| {
                let d = (local - handle.position).abs();
                d.x <= half && d.y <= half
            })
            .map(|handle| HandleHit::Corner(handle.anchor))
    }

    /// Whether a global point falls inside the bounding display.
    pub fn display_contains(&self, point: DVec2) -> bool {
        self.bounding_rect.contains(self.to_local(point))
    }
}
