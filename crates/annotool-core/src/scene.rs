//! Arena-backed scene of shapes.
//!
//! Shapes are addressed by [`ShapeId`]; removing a shape leaves a hole so ids
//! stay stable. Draw order is tracked separately from storage.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::AnnotError;
use crate::geometry::Rect;
use crate::shape::Shape;

/// Stable handle to a shape in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(pub usize);

/// Stable handle to a group in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// Container of shapes, used for containment queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Fixed point for transforms of the whole group.
    pub pivot: Option<DVec2>,
    pub is_annotation: bool,
}

/// What part of a shape a hit test matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Segment(usize),
    Stroke,
    Fill,
}

/// Options for [`Scene::hit_test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOptions {
    pub fill: bool,
    pub stroke: bool,
    pub segments: bool,
    pub tolerance: f64,
    /// Only match annotation shapes or shapes inside an annotation group.
    pub annotations_only: bool,
}

impl Default for HitOptions {
    fn default() -> Self {
        Self {
            fill: true,
            stroke: true,
            segments: true,
            tolerance: 0.0,
            annotations_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    pub shape: ShapeId,
    pub kind: HitKind,
    /// Set when the shape matched through its annotation parent group.
    pub group: Option<GroupId>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: Vec<Option<Shape>>,
    order: Vec<ShapeId>,
    groups: Vec<Group>,
    selected: BTreeSet<ShapeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape on top of the draw order.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len());
        self.shapes.push(Some(shape));
        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.get_mut(id.0)?.take()?;
        self.order.retain(|o| *o != id);
        self.selected.remove(&id);
        Some(shape)
    }

    /// Clones a shape and inserts the copy directly above the original.
    pub fn clone_shape(&mut self, id: ShapeId) -> Result<ShapeId, AnnotError> {
        let shape = self.get(id).cloned().ok_or(AnnotError::UnknownShape(id))?;
        let new_id = ShapeId(self.shapes.len());
        self.shapes.push(Some(shape));
        let pos = self
            .order
            .iter()
            .position(|o| *o == id)
            .map_or(self.order.len(), |p| p + 1);
        self.order.insert(pos, new_id);
        Ok(new_id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Shapes in draw order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.order
            .iter()
            .filter_map(|id| self.get(*id).map(|shape| (*id, shape)))
    }

    /// Ids in draw order, bottom first.
    pub fn order(&self) -> &[ShapeId] {
        &self.order
    }

    pub fn bring_to_front(&mut self, id: ShapeId) {
        if self.contains(id) {
            self.order.retain(|o| *o != id);
            self.order.push(id);
        }
    }

    pub fn send_to_back(&mut self, id: ShapeId) {
        if self.contains(id) {
            self.order.retain(|o| *o != id);
            self.order.insert(0, id);
        }
    }

    pub fn add_group(&mut self, name: impl Into<String>, is_annotation: bool) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            name: name.into(),
            pivot: None,
            is_annotation,
        });
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.0)
    }

    /// Moves a shape into a group (or out of any group with `None`).
    pub fn set_parent(&mut self, id: ShapeId, group: Option<GroupId>) -> Result<(), AnnotError> {
        let shape = self.get_mut(id).ok_or(AnnotError::UnknownShape(id))?;
        shape.parent = group;
        Ok(())
    }

    /// Members of a group in draw order.
    pub fn members(&self, group: GroupId) -> Vec<ShapeId> {
        self.iter()
            .filter(|(_, shape)| shape.parent == Some(group))
            .map(|(id, _)| id)
            .collect()
    }

    /// Union of the global bounds of the given shapes.
    pub fn union_bounds(&self, ids: &[ShapeId]) -> Option<Rect> {
        ids.iter()
            .filter_map(|id| self.get(*id).and_then(Shape::bounds))
            .reduce(|acc, rect| acc.union(&rect))
    }

    pub fn select(&mut self, id: ShapeId) {
        if self.contains(id) {
            self.selected.insert(id);
        }
    }

    pub fn deselect(&mut self, id: ShapeId) {
        self.selected.remove(&id);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected shapes in draw order.
    pub fn selected(&self) -> Vec<ShapeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// Selected annotation shapes in draw order.
    pub fn selected_annotations(&self) -> Vec<ShapeId> {
        self.selected()
            .into_iter()
            .filter(|id| self.annotation_match(*id).is_some())
            .collect()
    }

    /// `Some(group)` if the shape is an annotation (group set when matched through its parent).
    fn annotation_match(&self, id: ShapeId) -> Option<Option<GroupId>> {
        let shape = self.get(id)?;
        if shape.is_annotation {
            return Some(None);
        }
        let parent = shape.parent?;
        self.group(parent)
            .filter(|g| g.is_annotation)
            .map(|_| Some(parent))
    }

    /// Topmost shape under `point`.
    pub fn hit_test(&self, point: DVec2, options: &HitOptions) -> Option<HitResult> {
        for &id in self.order.iter().rev() {
            let Some(shape) = self.get(id) else {
                continue;
            };
            let group = if options.annotations_only {
                match self.annotation_match(id) {
                    Some(group) => group,
                    None => continue,
                }
            } else {
                None
            };

            let kind = if options.segments {
                shape.hit_segment(point, options.tolerance).map(HitKind::Segment)
            } else {
                None
            };
            let kind = kind.or_else(|| {
                (options.stroke
                    && shape
                        .stroke_distance(point)
                        .is_some_and(|d| d <= options.tolerance))
                .then_some(HitKind::Stroke)
            });
            let kind = kind.or_else(|| (options.fill && shape.contains(point)).then_some(HitKind::Fill));

            if let Some(kind) = kind {
                return Some(HitResult { shape: id, kind, group });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Shape {
        Shape::rectangle(Rect::from_points(DVec2::splat(min), DVec2::splat(max)))
    }

    #[test]
    fn test_add_remove_keeps_ids_stable() {
        let mut scene = Scene::new();
        let a = scene.add(square(0.0, 1.0));
        let b = scene.add(square(2.0, 3.0));
        assert!(scene.remove(a).is_some());
        assert!(scene.remove(a).is_none());
        assert!(scene.get(b).is_some());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_z_order_and_hit_test() {
        let mut scene = Scene::new();
        let bottom = scene.add(square(0.0, 10.0));
        let top = scene.add(square(5.0, 15.0));
        let point = DVec2::new(7.0, 7.0);

        let hit = scene.hit_test(point, &HitOptions::default()).unwrap();
        assert_eq!(hit.shape, top);
        assert_eq!(hit.kind, HitKind::Fill);

        scene.bring_to_front(bottom);
        assert_eq!(scene.hit_test(point, &HitOptions::default()).unwrap().shape, bottom);

        scene.send_to_back(bottom);
        assert_eq!(scene.order(), &[bottom, top]);
    }

    #[test]
    fn test_hit_segment_before_fill() {
        let mut scene = Scene::new();
        let id = scene.add(square(0.0, 10.0));
        let options = HitOptions {
            tolerance: 1.0,
            ..HitOptions::default()
        };
        let hit = scene.hit_test(DVec2::new(0.5, 0.5), &options).unwrap();
        assert_eq!(hit.shape, id);
        assert!(matches!(hit.kind, HitKind::Segment(_)));
    }

    #[test]
    fn test_annotations_only_matches_parent_group() {
        let mut scene = Scene::new();
        let overlay = scene.add(square(0.0, 10.0));
        let feature = scene.add(square(20.0, 30.0));
        let group = scene.add_group("feature", true);
        scene.set_parent(feature, Some(group)).unwrap();

        let options = HitOptions {
            annotations_only: true,
            ..HitOptions::default()
        };
        assert!(scene.hit_test(DVec2::new(5.0, 5.0), &options).is_none());
        let hit = scene.hit_test(DVec2::new(25.0, 25.0), &options).unwrap();
        assert_eq!(hit.shape, feature);
        assert_eq!(hit.group, Some(group));
        assert_eq!(scene.members(group), vec![feature]);
        assert!(scene.get(overlay).is_some());
    }

    #[test]
    fn test_clone_inserts_above_original() {
        let mut scene = Scene::new();
        let a = scene.add(square(0.0, 1.0));
        let b = scene.add(square(2.0, 3.0));
        let c = scene.clone_shape(a).unwrap();
        assert_eq!(scene.order(), &[a, c, b]);
        assert_eq!(scene.get(a), scene.get(c));
        assert!(matches!(
            scene.clone_shape(ShapeId(99)),
            Err(AnnotError::UnknownShape(_))
        ));
    }

    #[test]
    fn test_union_bounds_and_selection() {
        let mut scene = Scene::new();
        let a = scene.add(square(0.0, 1.0).annotation());
        let b = scene.add(square(4.0, 6.0));
        scene.select(b);
        scene.select(a);
        assert_eq!(scene.selected(), vec![a, b]);
        assert_eq!(scene.selected_annotations(), vec![a]);
        let bounds = scene.union_bounds(&[a, b]).unwrap();
        assert_eq!(bounds.min, DVec2::ZERO);
        assert_eq!(bounds.max, DVec2::splat(6.0));
        scene.remove(b);
        assert_eq!(scene.selected(), vec![a]);
    }
}
