//! Collision contact data

use crate::collision::space::CollideableKey;
use crate::foundation::math::{Point3, Vec3};

/// One detected contact between two collideables
///
/// Entity order matters for asymmetric resolution. The normal is a unit
/// vector oriented so that translating the second entity by
/// `normal * depth` separates the pair; depth is zero at first contact.
#[derive(Debug, Clone)]
pub struct Collision {
    entity1: CollideableKey,
    entity2: CollideableKey,
    position: Point3,
    normal: Vec3,
    depth: f32,
}

impl Collision {
    /// Creates a collision record
    pub fn new(
        entity1: CollideableKey,
        entity2: CollideableKey,
        position: Point3,
        normal: Vec3,
        depth: f32,
    ) -> Self {
        Self {
            entity1,
            entity2,
            position,
            normal,
            depth,
        }
    }

    /// First colliding entity
    pub fn entity1(&self) -> CollideableKey {
        self.entity1
    }

    /// Second colliding entity
    pub fn entity2(&self) -> CollideableKey {
        self.entity2
    }

    /// World-space contact position
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Unit contact normal
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Penetration depth
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Normal scaled by an arbitrary factor
    pub fn scaled_normal(&self, scale: f32) -> Vec3 {
        self.normal * scale
    }

    /// Normal pointing the opposite way
    pub fn inverted_normal(&self) -> Vec3 {
        -self.normal
    }

    /// The translation separating the second entity from the first
    pub fn separation(&self) -> Vec3 {
        self.normal * self.depth
    }

    /// The same contact seen from the other entity's side
    pub fn swapped(&self) -> Self {
        Self {
            entity1: self.entity2,
            entity2: self.entity1,
            position: self.position,
            normal: -self.normal,
            depth: self.depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_derived_normal_accessors() {
        let mut map: SlotMap<CollideableKey, ()> = SlotMap::with_key();
        let a = map.insert(());
        let b = map.insert(());

        let collision = Collision::new(a, b, Point3::origin(), Vec3::x(), 0.5);
        assert_eq!(collision.scaled_normal(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(collision.inverted_normal(), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(collision.separation(), Vec3::new(0.5, 0.0, 0.0));

        let swapped = collision.swapped();
        assert_eq!(swapped.entity1(), b);
        assert_eq!(swapped.entity2(), a);
        assert_eq!(swapped.normal(), -collision.normal());
        assert_eq!(swapped.depth(), collision.depth());
    }
}
