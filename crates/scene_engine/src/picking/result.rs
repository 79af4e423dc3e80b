//! Pick results
//!
//! One [`PickResult`] per picked leaf, ordered ascending by minimum
//! intersection distance. During the bounds phase distances are squared
//! approximations; the geometry phase replaces them with true distances
//! and attaches the face index of the closest hit.

use std::cmp::Ordering;

use thiserror::Error;

use crate::foundation::math::Point3;
use crate::scene::NodeKey;

/// Mouse button a pick originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left button
    Left,
    /// Middle button
    Middle,
    /// Right button
    Right,
}

/// Errors reading fields a pick result doesn't carry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PickAccessError {
    /// The result came from a bounds-only pick; no face was tested
    #[error("face index is only available for geometry-phase pick results")]
    GeometryDataUnavailable,
}

/// One picked leaf with intersection data
#[derive(Debug, Clone)]
pub struct PickResult {
    node: NodeKey,
    face_index: Option<usize>,
    min_distance: f32,
    max_distance: f32,
    position: Point3,
    button: MouseButton,
}

impl PickResult {
    /// Candidate from the bounds phase: squared distance, bounds entry point
    pub(crate) fn bounds_hit(
        node: NodeKey,
        distance_squared: f32,
        position: Point3,
        button: MouseButton,
    ) -> Self {
        Self {
            node,
            face_index: None,
            min_distance: distance_squared,
            max_distance: distance_squared,
            position,
            button,
        }
    }

    /// Promote a candidate with exact geometry-phase data
    pub(crate) fn apply_geometry_hit(
        &mut self,
        face_index: usize,
        min_distance: f32,
        max_distance: f32,
        position: Point3,
    ) {
        self.face_index = Some(face_index);
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self.position = position;
    }

    /// The picked leaf node
    pub fn node(&self) -> NodeKey {
        self.node
    }

    /// Index of the closest intersected face
    ///
    /// Only geometry-phase results carry one; reading it from a
    /// bounds-only result is a precondition violation, not a missing
    /// value.
    pub fn face_index(&self) -> Result<usize, PickAccessError> {
        self.face_index
            .ok_or(PickAccessError::GeometryDataUnavailable)
    }

    /// Whether this result went through the geometry phase
    pub fn is_geometry_hit(&self) -> bool {
        self.face_index.is_some()
    }

    /// Minimum intersection distance
    ///
    /// Squared for bounds-only results, a true distance after the
    /// geometry phase.
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Maximum intersection distance (same scale as [`Self::min_distance`])
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Median intersection distance
    pub fn median_distance(&self) -> f32 {
        (self.min_distance + self.max_distance) * 0.5
    }

    /// World-space intersection position
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Mouse button the pick originated from
    pub fn button(&self) -> MouseButton {
        self.button
    }

    /// Ascending-by-minimum-distance ordering used for result lists
    pub fn cmp_by_distance(&self, other: &Self) -> Ordering {
        self.min_distance
            .partial_cmp(&other.min_distance)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialEq for PickResult {
    /// Same pick target: same node and same intersection position
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.position == other.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<NodeKey> {
        let mut map: SlotMap<NodeKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_face_index_unavailable_for_bounds_only_result() {
        let node = keys(1)[0];
        let result = PickResult::bounds_hit(node, 4.0, Point3::origin(), MouseButton::Left);
        assert_eq!(
            result.face_index(),
            Err(PickAccessError::GeometryDataUnavailable)
        );

        let mut result = result;
        result.apply_geometry_hit(7, 2.0, 3.0, Point3::origin());
        assert_eq!(result.face_index(), Ok(7));
    }

    #[test]
    fn test_ordering_is_by_min_distance() {
        let node = keys(1)[0];
        let mut results = vec![
            PickResult::bounds_hit(node, 9.0, Point3::origin(), MouseButton::Left),
            PickResult::bounds_hit(node, 1.0, Point3::origin(), MouseButton::Left),
            PickResult::bounds_hit(node, 4.0, Point3::origin(), MouseButton::Left),
        ];
        results.sort_by(PickResult::cmp_by_distance);
        let distances: Vec<f32> = results.iter().map(PickResult::min_distance).collect();
        assert_eq!(distances, vec![1.0, 4.0, 9.0]);
    }

    #[test]
    fn test_equality_requires_node_and_position() {
        let ks = keys(2);
        let at_origin = PickResult::bounds_hit(ks[0], 1.0, Point3::origin(), MouseButton::Left);
        let same_node_other_point = PickResult::bounds_hit(
            ks[0],
            1.0,
            Point3::new(1.0, 0.0, 0.0),
            MouseButton::Left,
        );
        let other_node_same_point =
            PickResult::bounds_hit(ks[1], 1.0, Point3::origin(), MouseButton::Left);

        assert_eq!(at_origin, at_origin.clone());
        assert_ne!(at_origin, same_node_other_point);
        assert_ne!(at_origin, other_node_same_point);
    }

    #[test]
    fn test_median_distance() {
        let node = keys(1)[0];
        let mut result = PickResult::bounds_hit(node, 0.0, Point3::origin(), MouseButton::Left);
        result.apply_geometry_hit(0, 2.0, 6.0, Point3::origin());
        assert_eq!(result.median_distance(), 4.0);
    }
}
