//! Geometry primitives shared by the shape model and the editor tools.
//!
//! Coordinates are y-down. Angles are in degrees, measured like `atan2(y, x)`,
//! so a positive rotation turns clockwise on screen.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero.
pub const EPSILON: f64 = 1e-9;

/// Named corner of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }

    /// Index into [`Corner::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }
}

/// Axis-aligned rectangle stored as normalised min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    /// Rectangle spanned by two arbitrary points.
    pub fn from_points(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest rectangle containing all points, `None` for an empty iterator.
    pub fn bounding<I: IntoIterator<Item = DVec2>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self { min: p, max: p }),
            Some(rect) => Some(Self {
                min: rect.min.min(p),
                max: rect.max.max(p),
            }),
        })
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }

    pub fn corner(&self, corner: Corner) -> DVec2 {
        match corner {
            Corner::TopLeft => self.min,
            Corner::TopRight => DVec2::new(self.max.x, self.min.y),
            Corner::BottomRight => self.max,
            Corner::BottomLeft => DVec2::new(self.min.x, self.max.y),
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Scales the rectangle component-wise about `pivot`.
    pub fn scale_about(&self, factors: DVec2, pivot: DVec2) -> Rect {
        Rect::from_points(
            pivot + (self.min - pivot) * factors,
            pivot + (self.max - pivot) * factors,
        )
    }
}

/// Angle of a vector in degrees.
pub fn angle_of(v: DVec2) -> f64 {
    v.y.atan2(v.x).to_degrees()
}

/// Rotates a vector by `degrees`.
pub fn rotate_vec(v: DVec2, degrees: f64) -> DVec2 {
    DVec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Rotates a point by `degrees` about `center`.
pub fn rotate_about(point: DVec2, degrees: f64, center: DVec2) -> DVec2 {
    center + rotate_vec(point - center, degrees)
}

/// Orthogonal projection of `v` onto the line spanned by `onto`.
///
/// Returns `None` when `onto` has no direction.
pub fn project(v: DVec2, onto: DVec2) -> Option<DVec2> {
    let len_sq = onto.length_squared();
    if len_sq < EPSILON {
        return None;
    }
    Some(onto * (v.dot(onto) / len_sq))
}

/// Rotation by `degrees` about `center`.
pub fn rotation_about(degrees: f64, center: DVec2) -> DAffine2 {
    DAffine2::from_translation(center)
        * DAffine2::from_angle(degrees.to_radians())
        * DAffine2::from_translation(-center)
}

/// Component-wise scale about `pivot`.
pub fn scale_about(factors: DVec2, pivot: DVec2) -> DAffine2 {
    DAffine2::from_translation(pivot) * DAffine2::from_scale(factors) * DAffine2::from_translation(-pivot)
}

/// Rotation part of an affine matrix in degrees.
pub fn matrix_rotation(matrix: &DAffine2) -> f64 {
    angle_of(matrix.matrix2.x_axis)
}

/// Distance from a point to a line segment.
pub fn point_to_segment_distance(point: DVec2, seg_start: DVec2, seg_end: DVec2) -> f64 {
    let line = seg_end - seg_start;
    let len_sq = line.length_squared();
    if len_sq < EPSILON {
        return point.distance(seg_start);
    }
    let t = ((point - seg_start).dot(line) / len_sq).clamp(0.0, 1.0);
    let closest = seg_start + t * line;
    point.distance(closest)
}
