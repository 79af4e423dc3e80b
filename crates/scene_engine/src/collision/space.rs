//! The collideable hierarchy
//!
//! A lightweight spatial tree independent of the render scene graph:
//! collideables carry a local pose and a cached world pose composed
//! through the parent chain. Recomputation is explicit — mutate the local
//! pose, then call [`CollisionSpace::recompute_world_coords`]; nothing is
//! reactive.

use std::any::Any;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::collision::engine::CollisionError;
use crate::collision::primitives::Triangle;
use crate::foundation::math::{utils, Mat3, Point3, Vec3};

new_key_type! {
    /// Stable handle to a collideable
    pub struct CollideableKey;

    /// Stable handle to a rigid body
    pub struct BodyKey;
}

/// Space-partitioning strategy a backend may apply to a group
///
/// Metadata for backend algorithm selection only; the abstraction layer
/// never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollideableGroupType {
    /// Flat list, no partitioning
    #[default]
    Simple,
    /// Hash-partitioned space
    Hashed,
    /// Hierarchical partitioning (e.g. a tree of sub-spaces)
    Hierarchical,
}

/// Triangle-mesh vertex/index data in local space
#[derive(Debug, Clone)]
pub struct TriMeshData {
    vertices: Vec<Point3>,
    indices: Vec<u32>,
}

impl TriMeshData {
    /// From explicit vertex and index arrays; an incomplete trailing
    /// index triple is ignored
    pub fn from_arrays(vertices: Vec<Point3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// From a vertex container with optional indices
    ///
    /// Absent indices default to the sequential identity, one triangle
    /// per vertex triple.
    pub fn from_vertices(vertices: Vec<Point3>, indices: Option<Vec<u32>>) -> Self {
        let indices =
            indices.unwrap_or_else(|| (0..vertices.len() as u32).collect());
        Self::from_arrays(vertices, indices)
    }

    /// From a triangle container
    ///
    /// Vertices are emitted in reverse order (C, B, A) per triangle — a
    /// fixed winding convention, not configurable.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        for triangle in triangles {
            vertices.push(triangle.v2);
            vertices.push(triangle.v1);
            vertices.push(triangle.v0);
        }
        let indices = (0..vertices.len() as u32).collect();
        Self::from_arrays(vertices, indices)
    }

    /// All vertices
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Triangle indices, three per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space triangle `i`
    pub fn triangle(&self, i: usize) -> Triangle {
        let base = i * 3;
        Triangle::new(
            self.vertices[self.indices[base] as usize],
            self.vertices[self.indices[base + 1] as usize],
            self.vertices[self.indices[base + 2] as usize],
        )
    }
}

/// Shape carried by a collideable
#[derive(Debug, Clone)]
pub enum CollideableShape {
    /// Sphere of the given radius
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Axis-aligned box (in local space) of the given half extents
    Box {
        /// Half extent along each local axis
        half_extents: Vec3,
    },
    /// Capsule along the local Y axis
    Capsule {
        /// Radius
        radius: f32,
        /// Length of the cylindrical section
        length: f32,
    },
    /// Cylinder along the local Y axis
    Cylinder {
        /// Radius
        radius: f32,
        /// Length
        length: f32,
    },
    /// One-sided plane
    Plane {
        /// Local-space unit normal
        normal: Vec3,
        /// Offset of the plane along the normal from the local origin
        offset: f32,
    },
    /// Ray of finite length
    Ray {
        /// Local-space direction
        direction: Vec3,
        /// Length
        length: f32,
    },
    /// Triangle mesh
    TriMesh(TriMeshData),
    /// Group of child collideables
    Group {
        /// Partitioning hint for the backend
        group_type: CollideableGroupType,
        /// Children in insertion order
        children: Vec<CollideableKey>,
    },
}

/// Opaque user payload attached to a collideable
pub type CollideableUserData = Arc<dyn Any + Send + Sync>;

/// A node in the collision hierarchy
pub struct Collideable {
    name: String,
    user_data: Option<CollideableUserData>,
    body: Option<BodyKey>,
    enabled: bool,
    local_position: Point3,
    local_rotation: Mat3,
    world_position: Point3,
    world_rotation: Mat3,
    parent: Option<CollideableKey>,
    shape: CollideableShape,
}

impl Collideable {
    fn new(shape: CollideableShape) -> Self {
        Self {
            name: String::new(),
            user_data: None,
            body: None,
            enabled: true,
            local_position: Point3::origin(),
            local_rotation: Mat3::identity(),
            world_position: Point3::origin(),
            world_rotation: Mat3::identity(),
            parent: None,
            shape,
        }
    }

    /// Name, for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached user payload
    pub fn user_data(&self) -> Option<&CollideableUserData> {
        self.user_data.as_ref()
    }

    /// Body attached directly to this collideable (no parent fallback;
    /// see [`CollisionSpace::resolve_body`])
    pub fn body(&self) -> Option<BodyKey> {
        self.body
    }

    /// Whether collision checks consider this collideable
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Position relative to the parent
    pub fn local_position(&self) -> Point3 {
        self.local_position
    }

    /// Rotation relative to the parent (always orthonormal)
    pub fn local_rotation(&self) -> &Mat3 {
        &self.local_rotation
    }

    /// Local rotation as Euler angles in degrees (X, Y, Z order)
    pub fn local_rotation_euler_deg(&self) -> (f32, f32, f32) {
        utils::matrix_to_euler_deg(&self.local_rotation)
    }

    /// Cached world position, valid after
    /// [`CollisionSpace::recompute_world_coords`]
    pub fn world_position(&self) -> Point3 {
        self.world_position
    }

    /// Cached world rotation, valid after
    /// [`CollisionSpace::recompute_world_coords`]
    pub fn world_rotation(&self) -> &Mat3 {
        &self.world_rotation
    }

    /// Parent collideable, if any
    pub fn parent(&self) -> Option<CollideableKey> {
        self.parent
    }

    /// The collideable's shape
    pub fn shape(&self) -> &CollideableShape {
        &self.shape
    }

    /// Whether this collideable is a group
    pub fn is_group(&self) -> bool {
        matches!(self.shape, CollideableShape::Group { .. })
    }

    /// Group children; empty for non-groups
    pub fn children(&self) -> &[CollideableKey] {
        match &self.shape {
            CollideableShape::Group { children, .. } => children,
            _ => &[],
        }
    }

    /// Partitioning hint; None for non-groups
    pub fn group_type(&self) -> Option<CollideableGroupType> {
        match &self.shape {
            CollideableShape::Group { group_type, .. } => Some(*group_type),
            _ => None,
        }
    }
}

/// An external rigid-body entity collideables attach to
#[derive(Debug, Default)]
pub struct Body {
    name: String,
    attached: Vec<CollideableKey>,
}

impl Body {
    /// Name, for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collideables attached to this body, in attachment order
    pub fn attached(&self) -> &[CollideableKey] {
        &self.attached
    }
}

/// Arena owning the collideable hierarchy and its bodies
#[derive(Default)]
pub struct CollisionSpace {
    nodes: SlotMap<CollideableKey, Collideable>,
    bodies: SlotMap<BodyKey, Body>,
}

impl CollisionSpace {
    /// Creates an empty space
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a collideable with the given shape, unparented
    pub fn insert(&mut self, shape: CollideableShape) -> CollideableKey {
        self.nodes.insert(Collideable::new(shape))
    }

    /// Attach `child` to `group`
    ///
    /// Fails when `group` is not a group shape. A child already parented
    /// elsewhere is re-parented.
    pub fn attach(
        &mut self,
        group: CollideableKey,
        child: CollideableKey,
    ) -> Result<(), CollisionError> {
        if !self.nodes.contains_key(child) {
            return Err(CollisionError::UnknownCollideable);
        }
        match self.nodes.get_mut(group).map(|n| &mut n.shape) {
            Some(CollideableShape::Group { children, .. }) => {
                if !children.contains(&child) {
                    children.push(child);
                }
            }
            Some(_) => return Err(CollisionError::NotAGroup),
            None => return Err(CollisionError::UnknownCollideable),
        }
        if let Some(old_parent) = self.nodes[child].parent {
            if old_parent != group {
                if let Some(CollideableShape::Group { children, .. }) =
                    self.nodes.get_mut(old_parent).map(|n| &mut n.shape)
                {
                    children.retain(|c| *c != child);
                }
            }
        }
        self.nodes[child].parent = Some(group);
        Ok(())
    }

    /// Look up a collideable
    pub fn collideable(&self, key: CollideableKey) -> Option<&Collideable> {
        self.nodes.get(key)
    }

    /// Number of live collideables
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the space holds no collideables
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set a collideable's name
    pub fn set_name(&mut self, key: CollideableKey, name: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.name = name.into();
        }
    }

    /// Attach a user payload
    pub fn set_user_data(&mut self, key: CollideableKey, data: Option<CollideableUserData>) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.user_data = data;
        }
    }

    /// Enable or disable a collideable
    pub fn set_enabled(&mut self, key: CollideableKey, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.enabled = enabled;
        }
    }

    /// Set a collideable's local position
    ///
    /// World poses go stale until [`Self::recompute_world_coords`] runs.
    pub fn set_local_position(&mut self, key: CollideableKey, position: Point3) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.local_position = position;
        }
    }

    /// Set a collideable's local rotation (must be orthonormal)
    pub fn set_local_rotation(&mut self, key: CollideableKey, rotation: Mat3) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.local_rotation = rotation;
        }
    }

    /// Set a collideable's local rotation from Euler angles in degrees
    pub fn set_local_rotation_euler_deg(
        &mut self,
        key: CollideableKey,
        x_deg: f32,
        y_deg: f32,
        z_deg: f32,
    ) {
        self.set_local_rotation(key, utils::euler_deg_to_matrix(x_deg, y_deg, z_deg));
    }

    /// Create a body
    pub fn add_body(&mut self, name: impl Into<String>) -> BodyKey {
        self.bodies.insert(Body {
            name: name.into(),
            attached: Vec::new(),
        })
    }

    /// Look up a body
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Attach a collideable to a body
    pub fn attach_body(
        &mut self,
        collideable: CollideableKey,
        body: BodyKey,
    ) -> Result<(), CollisionError> {
        let Some(node) = self.nodes.get_mut(collideable) else {
            return Err(CollisionError::UnknownCollideable);
        };
        let Some(entry) = self.bodies.get_mut(body) else {
            return Err(CollisionError::UnknownBody);
        };
        node.body = Some(body);
        if !entry.attached.contains(&collideable) {
            entry.attached.push(collideable);
        }
        Ok(())
    }

    /// Resolve the body owning a collideable
    ///
    /// A collideable without its own body delegates to its parent chain;
    /// the first body found wins. This is ownership by delegation, not
    /// duplication.
    pub fn resolve_body(&self, key: CollideableKey) -> Option<BodyKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.nodes.get(k)?;
            if let Some(body) = node.body {
                return Some(body);
            }
            current = node.parent;
        }
        None
    }

    /// Recompute a collideable's cached world pose from its parent's
    /// cached pose and its own local pose
    ///
    /// Must be called after any local-pose mutation whose effect should
    /// be visible in world space; with `children_too`, the subtree is
    /// recomputed as well (only groups recurse). `sink` receives every
    /// recomputed pose — the seam through which a physics backend mirrors
    /// poses into its own body representation.
    pub fn recompute_world_coords(
        &mut self,
        key: CollideableKey,
        children_too: bool,
        sink: Option<&mut dyn FnMut(CollideableKey, &Point3, &Mat3)>,
    ) {
        self.recompute_inner(key, children_too, sink);
    }

    fn recompute_inner(
        &mut self,
        key: CollideableKey,
        children_too: bool,
        mut sink: Option<&mut dyn FnMut(CollideableKey, &Point3, &Mat3)>,
    ) {
        let parent_pose = self
            .nodes
            .get(key)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map(|p| (p.world_rotation, p.world_position));

        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        match parent_pose {
            Some((parent_rotation, parent_position)) => {
                node.world_rotation = parent_rotation * node.local_rotation;
                node.world_position =
                    parent_position + parent_rotation * node.local_position.coords;
            }
            None => {
                node.world_rotation = node.local_rotation;
                node.world_position = node.local_position;
            }
        }
        let position = node.world_position;
        let rotation = node.world_rotation;
        if let Some(s) = sink.as_mut() {
            s(key, &position, &rotation);
        }

        if children_too {
            // Only groups carry children; plain collideables stop here.
            let children = match &self.nodes[key].shape {
                CollideableShape::Group { children, .. } => children.clone(),
                _ => return,
            };
            for child in children {
                self.recompute_inner(child, true, sink.as_mut().map(|s| &mut **s));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sphere(space: &mut CollisionSpace, radius: f32) -> CollideableKey {
        space.insert(CollideableShape::Sphere { radius })
    }

    fn group(space: &mut CollisionSpace) -> CollideableKey {
        space.insert(CollideableShape::Group {
            group_type: CollideableGroupType::Simple,
            children: Vec::new(),
        })
    }

    #[test]
    fn test_three_level_world_pose_composition() {
        let mut space = CollisionSpace::new();
        let a = group(&mut space);
        let b = group(&mut space);
        let c = sphere(&mut space, 1.0);
        space.attach(a, b).unwrap();
        space.attach(b, c).unwrap();

        // A: translate (1,0,0), rotate 90 degrees about Y.
        space.set_local_position(a, Point3::new(1.0, 0.0, 0.0));
        space.set_local_rotation_euler_deg(a, 0.0, 90.0, 0.0);
        // B: translate (1,0,0) in A's frame.
        space.set_local_position(b, Point3::new(1.0, 0.0, 0.0));
        // C: translate (1,0,0) in B's frame.
        space.set_local_position(c, Point3::new(1.0, 0.0, 0.0));

        space.recompute_world_coords(a, true, None);

        // Hand-composed: A maps +X to -Z, so B sits at (1,0,-1) and C,
        // another +X step in the rotated frame, at (1,0,-2).
        let b_pos = space.collideable(b).unwrap().world_position();
        assert_relative_eq!(b_pos.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(b_pos.z, -1.0, epsilon = 1e-5);

        let c_pos = space.collideable(c).unwrap().world_position();
        assert_relative_eq!(c_pos.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(c_pos.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(c_pos.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_recompute_without_children_leaves_subtree_stale() {
        let mut space = CollisionSpace::new();
        let parent = group(&mut space);
        let child = sphere(&mut space, 1.0);
        space.attach(parent, child).unwrap();
        space.set_local_position(parent, Point3::new(5.0, 0.0, 0.0));

        space.recompute_world_coords(parent, false, None);

        let child_pos = space.collideable(child).unwrap().world_position();
        assert_relative_eq!(child_pos.x, 0.0); // still the stale cache
    }

    #[test]
    fn test_body_delegation_walks_parent_chain() {
        let mut space = CollisionSpace::new();
        let root = group(&mut space);
        let child = sphere(&mut space, 1.0);
        space.attach(root, child).unwrap();

        let group_body = space.add_body("group body");
        space.attach_body(root, group_body).unwrap();

        // No own body: delegate to the parent's.
        assert_eq!(space.resolve_body(child), Some(group_body));

        // An own body wins over the parent's.
        let own_body = space.add_body("own body");
        space.attach_body(child, own_body).unwrap();
        assert_eq!(space.resolve_body(child), Some(own_body));
    }

    #[test]
    fn test_attach_to_non_group_fails() {
        let mut space = CollisionSpace::new();
        let not_a_group = sphere(&mut space, 1.0);
        let child = sphere(&mut space, 1.0);
        assert!(matches!(
            space.attach(not_a_group, child),
            Err(CollisionError::NotAGroup)
        ));
    }

    #[test]
    fn test_pose_sink_sees_every_recomputed_node() {
        let mut space = CollisionSpace::new();
        let parent = group(&mut space);
        let child = sphere(&mut space, 1.0);
        space.attach(parent, child).unwrap();

        let mut seen = Vec::new();
        space.recompute_world_coords(
            parent,
            true,
            Some(&mut |key, _pos: &Point3, _rot: &Mat3| seen.push(key)),
        );
        assert_eq!(seen, vec![parent, child]);
    }

    #[test]
    fn test_tri_mesh_from_triangles_reverses_winding() {
        let triangle = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let mesh = TriMeshData::from_triangles(&[triangle]);
        assert_eq!(mesh.triangle_count(), 1);
        let rebuilt = mesh.triangle(0);
        // Emitted C, B, A: the rebuilt triangle is the original reversed.
        assert_eq!(rebuilt.v0, triangle.v2);
        assert_eq!(rebuilt.v1, triangle.v1);
        assert_eq!(rebuilt.v2, triangle.v0);
    }

    #[test]
    fn test_tri_mesh_sequential_indices_by_default() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = TriMeshData::from_vertices(vertices, None);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
