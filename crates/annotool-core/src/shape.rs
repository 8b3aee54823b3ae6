//! Owned vector shape model.
//!
//! A shape keeps its control points in a local construction frame together
//! with a 2x3 affine matrix that maps them to the global frame. Tools preview
//! transforms by composing into the matrix and bake them into the points once
//! a gesture ends.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, EPSILON, Rect};
use crate::scene::GroupId;

/// Number of samples used to approximate an ellipse outline.
const ELLIPSE_OUTLINE_SAMPLES: usize = 64;

/// Kind of vector primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Four points on the curve: left, top, right, bottom of its construction frame.
    Ellipse,
    /// Closed four-point outline.
    Rectangle,
    /// Open polyline.
    Polyline,
    /// Closed polygon.
    Polygon,
    /// Annotation without geometry yet; a tool decides what it becomes.
    Placeholder,
}

/// Centre and conjugate semi-diameters of an ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseFrame {
    pub center: DVec2,
    pub axis_a: DVec2,
    pub axis_b: DVec2,
}

impl EllipseFrame {
    /// Point on the ellipse at parameter `t` (radians).
    pub fn point_at(&self, t: f64) -> DVec2 {
        self.center + self.axis_a * t.cos() + self.axis_b * t.sin()
    }

    /// Exact axis-aligned bounds.
    pub fn bounds(&self) -> Rect {
        let half = DVec2::new(
            self.axis_a.x.hypot(self.axis_b.x),
            self.axis_a.y.hypot(self.axis_b.y),
        );
        Rect {
            min: self.center - half,
            max: self.center + half,
        }
    }

    pub fn contains(&self, point: DVec2) -> bool {
        let det = self.axis_a.perp_dot(self.axis_b);
        if det.abs() < EPSILON {
            return false;
        }
        let rel = point - self.center;
        let u = rel.perp_dot(self.axis_b) / det;
        let v = self.axis_a.perp_dot(rel) / det;
        u * u + v * v <= 1.0
    }
}

/// Ellipse control points for a centre, radii and rotation in degrees.
pub fn ellipse_points(center: DVec2, radii: DVec2, degrees: f64) -> Vec<DVec2> {
    [
        DVec2::new(-radii.x, 0.0),
        DVec2::new(0.0, -radii.y),
        DVec2::new(radii.x, 0.0),
        DVec2::new(0.0, radii.y),
    ]
    .into_iter()
    .map(|offset| center + geometry::rotate_vec(offset, degrees))
    .collect()
}

/// A vector primitive with its own affine matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    segments: Vec<DVec2>,
    #[serde(default)]
    pub matrix: DAffine2,
    #[serde(default)]
    pub parent: Option<GroupId>,
    #[serde(default)]
    pub is_annotation: bool,
}

impl Shape {
    fn with_segments(kind: ShapeKind, segments: Vec<DVec2>) -> Self {
        Self {
            kind,
            segments,
            matrix: DAffine2::IDENTITY,
            parent: None,
            is_annotation: false,
        }
    }

    /// Ellipse inscribed in `rect`.
    pub fn ellipse(rect: Rect) -> Self {
        Self::with_segments(
            ShapeKind::Ellipse,
            ellipse_points(rect.center(), rect.size() / 2.0, 0.0),
        )
    }

    /// Ellipse from centre, radii and rotation in degrees.
    pub fn ellipse_with_radii(center: DVec2, radii: DVec2, degrees: f64) -> Self {
        Self::with_segments(ShapeKind::Ellipse, ellipse_points(center, radii, degrees))
    }

    pub fn rectangle(rect: Rect) -> Self {
        Self::with_segments(
            ShapeKind::Rectangle,
            vec![
                rect.corner(geometry::Corner::BottomLeft),
                rect.corner(geometry::Corner::TopLeft),
                rect.corner(geometry::Corner::TopRight),
                rect.corner(geometry::Corner::BottomRight),
            ],
        )
    }

    pub fn polyline(points: Vec<DVec2>) -> Self {
        Self::with_segments(ShapeKind::Polyline, points)
    }

    pub fn polygon(points: Vec<DVec2>) -> Self {
        Self::with_segments(ShapeKind::Polygon, points)
    }

    /// Annotation placeholder awaiting geometry.
    pub fn placeholder() -> Self {
        Self::with_segments(ShapeKind::Placeholder, Vec::new()).annotation()
    }

    /// Marks the shape as an annotation feature.
    #[must_use]
    pub fn annotation(mut self) -> Self {
        self.is_annotation = true;
        self
    }

    /// Control points in the local construction frame.
    pub fn segments(&self) -> &[DVec2] {
        &self.segments
    }

    /// Replaces the control points and kind, keeping matrix and flags.
    pub fn set_geometry(&mut self, kind: ShapeKind, segments: Vec<DVec2>) {
        self.kind = kind;
        self.segments = segments;
    }

    pub fn set_segments(&mut self, segments: Vec<DVec2>) {
        self.segments = segments;
    }

    /// Control points mapped through the matrix.
    pub fn global_segments(&self) -> Vec<DVec2> {
        self.segments
            .iter()
            .map(|p| self.matrix.transform_point2(*p))
            .collect()
    }

    /// Ellipse frame in the global coordinate system.
    pub fn ellipse_frame(&self) -> Option<EllipseFrame> {
        if self.kind != ShapeKind::Ellipse || self.segments.len() != 4 {
            return None;
        }
        let pts = self.global_segments();
        let center = (pts[0] + pts[2]) / 2.0;
        Some(EllipseFrame {
            center,
            axis_a: pts[2] - center,
            axis_b: pts[3] - center,
        })
    }

    /// Axis-aligned bounds in the global frame.
    pub fn bounds(&self) -> Option<Rect> {
        if let Some(frame) = self.ellipse_frame() {
            return Some(frame.bounds());
        }
        Rect::bounding(self.global_segments())
    }

    /// Outline as a polyline in the global frame (closed shapes repeat the first point).
    pub fn outline(&self) -> Vec<DVec2> {
        if let Some(frame) = self.ellipse_frame() {
            return (0..=ELLIPSE_OUTLINE_SAMPLES)
                .map(|i| {
                    let t = std::f64::consts::TAU * i as f64 / ELLIPSE_OUTLINE_SAMPLES as f64;
                    frame.point_at(t)
                })
                .collect();
        }
        let mut points = self.global_segments();
        if self.is_closed() {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        points
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::Ellipse | ShapeKind::Rectangle | ShapeKind::Polygon
        )
    }

    /// Index of the control point nearest to `point` within `tolerance`.
    pub fn hit_segment(&self, point: DVec2, tolerance: f64) -> Option<usize> {
        self.global_segments()
            .into_iter()
            .enumerate()
            .map(|(i, p)| (i, p.distance(point)))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Distance from `point` to the outline.
    pub fn stroke_distance(&self, point: DVec2) -> Option<f64> {
        let outline = self.outline();
        match outline.len() {
            0 => None,
            1 => Some(outline[0].distance(point)),
            _ => outline
                .windows(2)
                .map(|w| geometry::point_to_segment_distance(point, w[0], w[1]))
                .min_by(f64::total_cmp),
        }
    }

    /// Whether the filled interior contains `point`. Open shapes have no fill.
    pub fn contains(&self, point: DVec2) -> bool {
        if let Some(frame) = self.ellipse_frame() {
            return frame.contains(point);
        }
        if !self.is_closed() {
            return false;
        }
        let pts = self.global_segments();
        let mut inside = false;
        let mut j = pts.len().wrapping_sub(1);
        for i in 0..pts.len() {
            let (a, b) = (pts[i], pts[j]);
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Composes `m` after the current matrix, in the local frame.
    pub fn append(&mut self, m: DAffine2) {
        self.matrix = self.matrix * m;
    }

    /// Applies `m` in the global frame.
    pub fn transform(&mut self, m: DAffine2) {
        self.matrix = m * self.matrix;
    }

    pub fn rotate(&mut self, degrees: f64, center: DVec2) {
        self.transform(geometry::rotation_about(degrees, center));
    }

    pub fn translate(&mut self, delta: DVec2) {
        self.transform(DAffine2::from_translation(delta));
    }

    /// Whether the matrix differs from identity.
    pub fn has_pending_transform(&self) -> bool {
        !self.matrix.abs_diff_eq(DAffine2::IDENTITY, EPSILON)
    }

    /// Folds the matrix into the control points and resets it.
    pub fn bake(&mut self) {
        if !self.has_pending_transform() {
            self.matrix = DAffine2::IDENTITY;
            return;
        }
        self.segments = self.global_segments();
        self.matrix = DAffine2::IDENTITY;
    }
}
