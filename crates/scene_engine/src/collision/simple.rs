//! Built-in list-based collision backend
//!
//! Vendor `"simple"`: no space partitioning, every group is treated as a
//! flat list regardless of its declared group type. Narrow phase funnels
//! boxes and meshes into the same triangle tests — the proxy-geometry
//! trade the picking tester makes. Capsules, cylinders and rays are left
//! unimplemented and surface the capability failure of the base trait.

use crate::collision::contact::Collision;
use crate::collision::engine::{CollisionBackend, CollisionError, CollisionListener};
use crate::collision::primitives::Triangle;
use crate::collision::space::{
    Collideable, CollideableGroupType, CollideableKey, CollideableShape, CollisionSpace,
    TriMeshData,
};
use crate::foundation::math::{Point3, Vec3};

/// The built-in backend
#[derive(Debug, Default)]
pub struct SimpleCollisionEngine;

impl SimpleCollisionEngine {
    /// Creates the backend
    pub fn new() -> Self {
        Self
    }
}

impl CollisionBackend for SimpleCollisionEngine {
    fn vendor(&self) -> &str {
        "simple"
    }

    fn new_sphere(
        &mut self,
        space: &mut CollisionSpace,
        radius: f32,
    ) -> Result<CollideableKey, CollisionError> {
        Ok(space.insert(CollideableShape::Sphere { radius }))
    }

    fn new_box(
        &mut self,
        space: &mut CollisionSpace,
        half_extents: Vec3,
    ) -> Result<CollideableKey, CollisionError> {
        Ok(space.insert(CollideableShape::Box { half_extents }))
    }

    fn new_plane(
        &mut self,
        space: &mut CollisionSpace,
        normal: Vec3,
        offset: f32,
    ) -> Result<CollideableKey, CollisionError> {
        Ok(space.insert(CollideableShape::Plane {
            normal: normal.normalize(),
            offset,
        }))
    }

    fn new_tri_mesh(
        &mut self,
        space: &mut CollisionSpace,
        data: TriMeshData,
    ) -> Result<CollideableKey, CollisionError> {
        Ok(space.insert(CollideableShape::TriMesh(data)))
    }

    fn new_group(
        &mut self,
        space: &mut CollisionSpace,
        group_type: CollideableGroupType,
    ) -> Result<CollideableKey, CollisionError> {
        Ok(space.insert(CollideableShape::Group {
            group_type,
            children: Vec::new(),
        }))
    }

    fn check_pair(
        &mut self,
        space: &CollisionSpace,
        first: CollideableKey,
        second: CollideableKey,
        ignore_static: bool,
        listener: &mut dyn CollisionListener,
    ) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        collect_leaves(space, first, &mut left);
        collect_leaves(space, second, &mut right);

        for &a in &left {
            for &b in &right {
                if a == b {
                    continue;
                }
                if ignore_static && is_static_pair(space, a, b) {
                    continue;
                }
                if let Some(collision) = narrow_phase(space, a, b) {
                    listener.on_collision(&collision);
                }
            }
        }
    }

    fn check_group(
        &mut self,
        space: &CollisionSpace,
        group: CollideableKey,
        ignore_static: bool,
        listener: &mut dyn CollisionListener,
    ) {
        let mut members = Vec::new();
        collect_leaves(space, group, &mut members);

        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (members[i], members[j]);
                if ignore_static && is_static_pair(space, a, b) {
                    continue;
                }
                if let Some(collision) = narrow_phase(space, a, b) {
                    listener.on_collision(&collision);
                }
            }
        }
    }
}

/// Expand groups depth-first into enabled primitive collideables
fn collect_leaves(space: &CollisionSpace, key: CollideableKey, out: &mut Vec<CollideableKey>) {
    let Some(node) = space.collideable(key) else {
        return;
    };
    if !node.is_enabled() {
        return;
    }
    if node.is_group() {
        for child in node.children() {
            collect_leaves(space, *child, out);
        }
    } else {
        out.push(key);
    }
}

/// Static means no resolvable body anywhere up the chain
fn is_static_pair(space: &CollisionSpace, a: CollideableKey, b: CollideableKey) -> bool {
    space.resolve_body(a).is_none() && space.resolve_body(b).is_none()
}

/// World-space triangles of a box or tri-mesh collideable
fn world_triangles(node: &Collideable) -> Option<Vec<Triangle>> {
    let local: Vec<Triangle> = match node.shape() {
        CollideableShape::Box { half_extents } => box_triangles(*half_extents),
        CollideableShape::TriMesh(data) => {
            (0..data.triangle_count()).map(|i| data.triangle(i)).collect()
        }
        _ => return None,
    };
    let rotation = *node.world_rotation();
    let position = node.world_position();
    Some(
        local
            .into_iter()
            .map(|t| {
                Triangle::new(
                    position + rotation * t.v0.coords,
                    position + rotation * t.v1.coords,
                    position + rotation * t.v2.coords,
                )
            })
            .collect(),
    )
}

/// Twelve triangles covering the box with the given half extents
fn box_triangles(h: Vec3) -> Vec<Triangle> {
    let corner = |x: f32, y: f32, z: f32| Point3::new(x * h.x, y * h.y, z * h.z);
    let faces = [
        // +X / -X
        [corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0), corner(1.0, -1.0, 1.0)],
        [corner(-1.0, -1.0, -1.0), corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0)],
        // +Y / -Y
        [corner(-1.0, 1.0, -1.0), corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0)],
        [corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0), corner(1.0, -1.0, 1.0), corner(-1.0, -1.0, 1.0)],
        // +Z / -Z
        [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
        [corner(-1.0, -1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, -1.0, -1.0)],
    ];
    let mut triangles = Vec::with_capacity(12);
    for [a, b, c, d] in faces {
        triangles.push(Triangle::new(a, b, c));
        triangles.push(Triangle::new(a, c, d));
    }
    triangles
}

/// World-space plane of a plane collideable: unit normal and a point on it
fn world_plane(node: &Collideable) -> Option<(Vec3, Point3)> {
    let CollideableShape::Plane { normal, offset } = node.shape() else {
        return None;
    };
    let world_normal = node.world_rotation() * normal;
    let point = node.world_position() + world_normal * *offset;
    Some((world_normal, point))
}

/// Exact pairwise contact test over cached world poses
///
/// Callers are responsible for having recomputed world coordinates; the
/// narrow phase trusts the caches.
fn narrow_phase(space: &CollisionSpace, a: CollideableKey, b: CollideableKey) -> Option<Collision> {
    let node_a = space.collideable(a)?;
    let node_b = space.collideable(b)?;

    use CollideableShape as S;
    match (node_a.shape(), node_b.shape()) {
        (S::Sphere { radius: ra }, S::Sphere { radius: rb }) => {
            sphere_sphere(a, node_a, *ra, b, node_b, *rb)
        }
        (S::Sphere { radius }, S::Box { .. } | S::TriMesh(_)) => {
            let triangles = world_triangles(node_b)?;
            sphere_mesh(node_a.world_position(), *radius, &triangles)
                .map(|(position, normal, depth)| Collision::new(a, b, position, normal, depth))
        }
        (S::Box { .. } | S::TriMesh(_), S::Sphere { radius }) => {
            let triangles = world_triangles(node_a)?;
            // Normal convention is from entity1 toward entity2: invert the
            // sphere-outward normal when the sphere is the second entity.
            sphere_mesh(node_b.world_position(), *radius, &triangles)
                .map(|(position, normal, depth)| Collision::new(a, b, position, -normal, depth))
        }
        (S::Plane { .. }, S::Sphere { radius }) => {
            let (normal, point) = world_plane(node_a)?;
            plane_sphere(point, normal, node_b.world_position(), *radius)
                .map(|(position, depth)| Collision::new(a, b, position, normal, depth))
        }
        (S::Sphere { radius }, S::Plane { .. }) => {
            let (normal, point) = world_plane(node_b)?;
            plane_sphere(point, normal, node_a.world_position(), *radius)
                .map(|(position, depth)| Collision::new(a, b, position, -normal, depth))
        }
        (S::Plane { .. }, S::Box { .. } | S::TriMesh(_)) => {
            let (normal, point) = world_plane(node_a)?;
            let triangles = world_triangles(node_b)?;
            plane_mesh(point, normal, &triangles)
                .map(|(position, depth)| Collision::new(a, b, position, normal, depth))
        }
        (S::Box { .. } | S::TriMesh(_), S::Plane { .. }) => {
            let (normal, point) = world_plane(node_b)?;
            let triangles = world_triangles(node_a)?;
            plane_mesh(point, normal, &triangles)
                .map(|(position, depth)| Collision::new(a, b, position, -normal, depth))
        }
        (S::Box { .. } | S::TriMesh(_), S::Box { .. } | S::TriMesh(_)) => {
            let triangles_a = world_triangles(node_a)?;
            let triangles_b = world_triangles(node_b)?;
            mesh_mesh(a, &triangles_a, b, &triangles_b)
        }
        (S::Plane { .. }, S::Plane { .. }) => None,
        _ => {
            log::warn!(
                "simple backend cannot narrow-phase shapes of `{}` vs `{}`; pair skipped",
                node_a.name(),
                node_b.name()
            );
            None
        }
    }
}

fn sphere_sphere(
    a: CollideableKey,
    node_a: &Collideable,
    radius_a: f32,
    b: CollideableKey,
    node_b: &Collideable,
    radius_b: f32,
) -> Option<Collision> {
    let center_a = node_a.world_position();
    let center_b = node_b.world_position();
    let offset = center_b - center_a;
    let distance = offset.magnitude();
    let radius_sum = radius_a + radius_b;
    if distance >= radius_sum {
        return None;
    }

    let normal = if distance > f32::EPSILON {
        offset / distance
    } else {
        Vec3::y() // Coincident centers: any direction separates
    };
    let depth = radius_sum - distance;
    // Contact sits midway through the overlap band.
    let position = center_a + normal * (radius_a - depth * 0.5);
    Some(Collision::new(a, b, position, normal, depth))
}

/// First triangle the sphere touches, as (position, outward normal, depth)
///
/// The normal points from the sphere center toward the mesh surface.
fn sphere_mesh(
    center: Point3,
    radius: f32,
    triangles: &[Triangle],
) -> Option<(Point3, Vec3, f32)> {
    for triangle in triangles {
        if triangle.plane_distance(center).abs() > radius {
            continue; // Too far from this face's plane
        }
        let closest = triangle.closest_point(center);
        let offset = closest - center;
        let distance_squared = offset.magnitude_squared();
        if distance_squared > radius * radius {
            continue;
        }
        let distance = distance_squared.sqrt();
        let normal = if distance > f32::EPSILON {
            offset / distance
        } else {
            -triangle.normal() // Center on the face: push back along it
        };
        return Some((closest, normal, radius - distance));
    }
    None
}

fn plane_sphere(
    plane_point: Point3,
    plane_normal: Vec3,
    center: Point3,
    radius: f32,
) -> Option<(Point3, f32)> {
    let signed = plane_normal.dot(&(center - plane_point));
    if signed >= radius {
        return None;
    }
    let position = center - plane_normal * signed;
    Some((position, radius - signed))
}

fn plane_mesh(
    plane_point: Point3,
    plane_normal: Vec3,
    triangles: &[Triangle],
) -> Option<(Point3, f32)> {
    let mut deepest: Option<(Point3, f32)> = None;
    for triangle in triangles {
        for vertex in [triangle.v0, triangle.v1, triangle.v2] {
            let signed = plane_normal.dot(&(vertex - plane_point));
            if signed < 0.0 {
                let depth = -signed;
                if deepest.map_or(true, |(_, d)| depth > d) {
                    deepest = Some((vertex, depth));
                }
            }
        }
    }
    deepest
}

/// Mesh/mesh overlap: exact SAT per triangle pair, coarse contact data
///
/// Position and normal come from the first intersecting pair and the mesh
/// centers; depth is the bounding-sphere penetration. Good enough to
/// drive resolution, not a manifold.
fn mesh_mesh(
    a: CollideableKey,
    triangles_a: &[Triangle],
    b: CollideableKey,
    triangles_b: &[Triangle],
) -> Option<Collision> {
    let sphere_a = enclosing_sphere(triangles_a)?;
    let sphere_b = enclosing_sphere(triangles_b)?;
    let center_gap = sphere_b.0 - sphere_a.0;
    if center_gap.magnitude() >= sphere_a.1 + sphere_b.1 {
        return None;
    }

    for tri_a in triangles_a {
        for tri_b in triangles_b {
            if tri_a.intersects_triangle(tri_b) {
                let position = Point3::from(
                    (tri_a.centroid().coords + tri_b.centroid().coords) * 0.5,
                );
                let distance = center_gap.magnitude();
                let normal = if distance > f32::EPSILON {
                    center_gap / distance
                } else {
                    Vec3::y()
                };
                let depth = (sphere_a.1 + sphere_b.1 - distance).max(0.0);
                return Some(Collision::new(a, b, position, normal, depth));
            }
        }
    }
    None
}

fn enclosing_sphere(triangles: &[Triangle]) -> Option<(Point3, f32)> {
    if triangles.is_empty() {
        return None;
    }
    let mut center = Vec3::zeros();
    let mut count = 0.0f32;
    for t in triangles {
        center += t.v0.coords + t.v1.coords + t.v2.coords;
        count += 3.0;
    }
    let center = Point3::from(center / count);
    let mut radius_squared = 0.0f32;
    for t in triangles {
        for v in [t.v0, t.v1, t.v2] {
            radius_squared = radius_squared.max((v - center).magnitude_squared());
        }
    }
    Some((center, radius_squared.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::engine::CollisionEngine;
    use approx::assert_relative_eq;

    fn engine() -> CollisionEngine {
        CollisionEngine::new(Box::new(SimpleCollisionEngine::new()))
    }

    #[test]
    fn test_overlapping_spheres_collide() {
        let mut engine = engine();
        let a = engine.new_sphere(1.0).unwrap();
        let b = engine.new_sphere(1.0).unwrap();
        engine.space_mut().set_local_position(b, Point3::new(1.5, 0.0, 0.0));
        engine.recompute_world_coords(a, false, false);
        engine.recompute_world_coords(b, false, false);

        let collisions = engine.check_pair_collisions(a, b, false);
        assert_eq!(collisions.len(), 1);
        let collision = &collisions[0];
        assert_relative_eq!(collision.depth(), 0.5, epsilon = 1e-5);
        assert_relative_eq!(collision.normal().x, 1.0, epsilon = 1e-5);
        // Separating: translating b by normal*depth makes the distance
        // exactly the radius sum.
        assert_relative_eq!(
            ((Point3::new(1.5, 0.0, 0.0) + collision.separation()) - Point3::origin()).magnitude(),
            2.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_separated_spheres_do_not_collide() {
        let mut engine = engine();
        let a = engine.new_sphere(1.0).unwrap();
        let b = engine.new_sphere(1.0).unwrap();
        engine.space_mut().set_local_position(b, Point3::new(5.0, 0.0, 0.0));
        engine.recompute_world_coords(b, false, false);
        assert!(engine.check_pair_collisions(a, b, false).is_empty());
    }

    #[test]
    fn test_sphere_against_box_face() {
        let mut engine = engine();
        let sphere = engine.new_sphere(1.0).unwrap();
        let cube = engine.new_box(Vec3::new(1.0, 1.0, 1.0)).unwrap();
        // Sphere center 1.5 from the box center: 0.5 into the +X face.
        engine
            .space_mut()
            .set_local_position(sphere, Point3::new(1.5, 0.0, 0.0));
        engine.recompute_world_coords(sphere, false, false);
        engine.recompute_world_coords(cube, false, false);

        let collisions = engine.check_pair_collisions(sphere, cube, false);
        assert_eq!(collisions.len(), 1);
        let collision = &collisions[0];
        assert_relative_eq!(collision.depth(), 0.5, epsilon = 1e-5);
        // Sphere is entity1: the normal points from it into the box.
        assert_relative_eq!(collision.normal().x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(collision.position().x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_plane_catches_sinking_sphere() {
        let mut engine = engine();
        let ground = engine.new_plane(Vec3::y(), 0.0).unwrap();
        let ball = engine.new_sphere(1.0).unwrap();
        engine
            .space_mut()
            .set_local_position(ball, Point3::new(0.0, 0.5, 0.0));
        engine.recompute_world_coords(ground, false, false);
        engine.recompute_world_coords(ball, false, false);

        let collisions = engine.check_pair_collisions(ground, ball, false);
        assert_eq!(collisions.len(), 1);
        let collision = &collisions[0];
        assert_relative_eq!(collision.depth(), 0.5, epsilon = 1e-5);
        assert_relative_eq!(collision.normal().y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_group_self_check_reports_internal_pairs() {
        let mut engine = engine();
        let group = engine.new_group(CollideableGroupType::Simple).unwrap();
        let a = engine.new_sphere(1.0).unwrap();
        let b = engine.new_sphere(1.0).unwrap();
        let c = engine.new_sphere(1.0).unwrap();
        for (key, x) in [(a, 0.0), (b, 1.0), (c, 10.0)] {
            engine.space_mut().set_local_position(key, Point3::new(x, 0.0, 0.0));
            engine.space_mut().attach(group, key).unwrap();
        }
        engine.recompute_world_coords(group, true, false);

        // Only a-b overlap; c is far away.
        let collisions = engine.check_group_collisions(group, false);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].entity1(), a);
        assert_eq!(collisions[0].entity2(), b);
    }

    #[test]
    fn test_ignore_static_skips_bodyless_pairs() {
        let mut engine = engine();
        let a = engine.new_sphere(1.0).unwrap();
        let b = engine.new_sphere(1.0).unwrap();
        engine.space_mut().set_local_position(b, Point3::new(1.0, 0.0, 0.0));
        engine.recompute_world_coords(b, false, false);

        assert!(engine.check_pair_collisions(a, b, true).is_empty());

        // One resolvable body makes the pair dynamic again.
        let body = engine.space_mut().add_body("ball");
        engine.space_mut().attach_body(a, body).unwrap();
        assert_eq!(engine.check_pair_collisions(a, b, true).len(), 1);
    }

    #[test]
    fn test_disabled_collideable_is_skipped() {
        let mut engine = engine();
        let a = engine.new_sphere(1.0).unwrap();
        let b = engine.new_sphere(1.0).unwrap();
        engine.space_mut().set_enabled(b, false);
        assert!(engine.check_pair_collisions(a, b, false).is_empty());
    }

    #[test]
    fn test_mesh_mesh_crossing_boxes() {
        let mut engine = engine();
        let a = engine.new_box(Vec3::new(1.0, 1.0, 1.0)).unwrap();
        let b = engine.new_box(Vec3::new(1.0, 1.0, 1.0)).unwrap();
        engine.space_mut().set_local_position(b, Point3::new(1.5, 0.0, 0.0));
        engine.recompute_world_coords(a, false, false);
        engine.recompute_world_coords(b, false, false);

        let collisions = engine.check_pair_collisions(a, b, false);
        assert_eq!(collisions.len(), 1);
        assert!(collisions[0].depth() > 0.0);
        assert_relative_eq!(collisions[0].normal().x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_factory_is_a_capability_failure() {
        let mut engine = engine();
        let error = engine.new_capsule(0.5, 2.0).unwrap_err();
        assert!(matches!(
            error,
            CollisionError::NotImplemented { feature: "capsule", .. }
        ));
    }
}
