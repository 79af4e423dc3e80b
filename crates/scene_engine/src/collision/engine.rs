//! Backend-agnostic collision engine
//!
//! [`CollisionBackend`] is the pluggable seam: primitive factories are
//! optional capabilities that default to a hard, named failure, while the
//! pair/group queries every backend must provide. [`CollisionEngine`]
//! owns a backend and the shared [`CollisionSpace`], offers convenience
//! adapters around the core factories, and re-evaluates registered
//! [`CollisionCheck`]s each update tick.

use thiserror::Error;

use crate::collision::contact::Collision;
use crate::collision::primitives::Triangle;
use crate::collision::space::{
    CollideableGroupType, CollideableKey, CollisionSpace, TriMeshData,
};
use crate::config::EngineSettings;
use crate::foundation::math::{Mat3, Point3, Vec3};
use crate::scene::{Aabb, BoundingSphere, Geometry};

/// Errors raised by the collision subsystem
#[derive(Debug, Error)]
pub enum CollisionError {
    /// A primitive kind the active backend does not provide
    #[error("collision feature `{feature}` is not implemented by backend `{vendor}`")]
    NotImplemented {
        /// The missing capability
        feature: &'static str,
        /// Vendor name of the backend lacking it
        vendor: String,
    },

    /// A group operation was applied to a non-group collideable
    #[error("collideable is not a group")]
    NotAGroup,

    /// A collideable handle that is not live in the space
    #[error("unknown collideable handle")]
    UnknownCollideable,

    /// A body handle that is not live in the space
    #[error("unknown body handle")]
    UnknownBody,

    /// Geometry without triangle data offered as a tri-mesh source
    #[error("geometry kind carries no triangle data for a tri-mesh")]
    NonTriangleGeometry,

    /// Collision resolver constructed from empty or invalid arguments
    #[error("invalid collision resolver arguments: {0}")]
    InvalidResolverArguments(String),
}

impl CollisionError {
    /// Shorthand for the capability failure
    pub fn not_implemented(feature: &'static str, vendor: &str) -> Self {
        Self::NotImplemented {
            feature,
            vendor: vendor.to_string(),
        }
    }
}

/// Receives detected collisions during a batch query
pub trait CollisionListener {
    /// One detected contact
    fn on_collision(&mut self, collision: &Collision);
}

impl<F: FnMut(&Collision)> CollisionListener for F {
    fn on_collision(&mut self, collision: &Collision) {
        self(collision);
    }
}

/// A pluggable collision backend
///
/// Factory methods are optional capabilities: the defaults fail with a
/// named [`CollisionError::NotImplemented`] rather than silently no-op,
/// so integrators notice a missing capability immediately. Queries and
/// the vendor name are mandatory.
pub trait CollisionBackend {
    /// Vendor name used in capability failures and diagnostics
    fn vendor(&self) -> &str;

    /// Create a sphere collideable
    fn new_sphere(
        &mut self,
        space: &mut CollisionSpace,
        radius: f32,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, radius);
        Err(CollisionError::not_implemented("sphere", self.vendor()))
    }

    /// Create a box collideable
    fn new_box(
        &mut self,
        space: &mut CollisionSpace,
        half_extents: Vec3,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, half_extents);
        Err(CollisionError::not_implemented("box", self.vendor()))
    }

    /// Create a capsule collideable
    fn new_capsule(
        &mut self,
        space: &mut CollisionSpace,
        radius: f32,
        length: f32,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, radius, length);
        Err(CollisionError::not_implemented("capsule", self.vendor()))
    }

    /// Create a cylinder collideable
    fn new_cylinder(
        &mut self,
        space: &mut CollisionSpace,
        radius: f32,
        length: f32,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, radius, length);
        Err(CollisionError::not_implemented("cylinder", self.vendor()))
    }

    /// Create a one-sided plane collideable
    fn new_plane(
        &mut self,
        space: &mut CollisionSpace,
        normal: Vec3,
        offset: f32,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, normal, offset);
        Err(CollisionError::not_implemented("plane", self.vendor()))
    }

    /// Create a finite ray collideable
    fn new_ray(
        &mut self,
        space: &mut CollisionSpace,
        direction: Vec3,
        length: f32,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, direction, length);
        Err(CollisionError::not_implemented("ray", self.vendor()))
    }

    /// Create a triangle-mesh collideable
    fn new_tri_mesh(
        &mut self,
        space: &mut CollisionSpace,
        data: TriMeshData,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, data);
        Err(CollisionError::not_implemented("tri-mesh", self.vendor()))
    }

    /// Create a collideable group
    fn new_group(
        &mut self,
        space: &mut CollisionSpace,
        group_type: CollideableGroupType,
    ) -> Result<CollideableKey, CollisionError> {
        let _ = (space, group_type);
        Err(CollisionError::not_implemented("group", self.vendor()))
    }

    /// Mirror a recomputed world pose into the backend's own body
    /// representation
    fn apply_world_pose(&mut self, key: CollideableKey, position: &Point3, rotation: &Mat3) {
        let _ = (key, position, rotation);
    }

    /// Check two collideables (or groups) against each other, reporting
    /// every contact to the listener
    fn check_pair(
        &mut self,
        space: &CollisionSpace,
        first: CollideableKey,
        second: CollideableKey,
        ignore_static: bool,
        listener: &mut dyn CollisionListener,
    );

    /// Check a group against itself (n by n over its members)
    fn check_group(
        &mut self,
        space: &CollisionSpace,
        group: CollideableKey,
        ignore_static: bool,
        listener: &mut dyn CollisionListener,
    );
}

/// A standing collision pairing re-evaluated every engine update
pub struct CollisionCheck {
    first: CollideableKey,
    second: Option<CollideableKey>,
    ignore_static: bool,
    listener: Option<Box<dyn CollisionListener>>,
}

impl CollisionCheck {
    /// A pairwise check between two collideables or groups
    pub fn pair(first: CollideableKey, second: CollideableKey) -> Self {
        Self {
            first,
            second: Some(second),
            ignore_static: false,
            listener: None,
        }
    }

    /// A self-check of one group against its own members
    pub fn group(group: CollideableKey) -> Self {
        Self {
            first: group,
            second: None,
            ignore_static: false,
            listener: None,
        }
    }

    /// Skip pairs where neither side has a resolvable body
    pub fn with_ignore_static(mut self, ignore_static: bool) -> Self {
        self.ignore_static = ignore_static;
        self
    }

    /// Dedicated listener for this check, preferred over the engine's
    /// default listener
    pub fn with_listener(mut self, listener: Box<dyn CollisionListener>) -> Self {
        self.listener = Some(listener);
        self
    }
}

/// The collision engine: a backend plus the space it operates on
pub struct CollisionEngine {
    backend: Box<dyn CollisionBackend>,
    space: CollisionSpace,
    checks: Vec<CollisionCheck>,
    default_listener: Option<Box<dyn CollisionListener>>,
    enabled: bool,
}

impl CollisionEngine {
    /// Creates an engine over the given backend with default settings
    pub fn new(backend: Box<dyn CollisionBackend>) -> Self {
        Self::with_settings(backend, &EngineSettings::default())
    }

    /// Creates an engine configured from [`EngineSettings`]
    pub fn with_settings(backend: Box<dyn CollisionBackend>, settings: &EngineSettings) -> Self {
        Self {
            backend,
            space: CollisionSpace::new(),
            checks: Vec::new(),
            default_listener: None,
            enabled: settings.collision.update_enabled,
        }
    }

    /// Vendor name of the active backend
    pub fn vendor(&self) -> &str {
        self.backend.vendor()
    }

    /// The collideable space
    pub fn space(&self) -> &CollisionSpace {
        &self.space
    }

    /// The collideable space, mutable
    pub fn space_mut(&mut self) -> &mut CollisionSpace {
        &mut self.space
    }

    /// Create a sphere collideable
    pub fn new_sphere(&mut self, radius: f32) -> Result<CollideableKey, CollisionError> {
        self.backend.new_sphere(&mut self.space, radius)
    }

    /// Create a sphere from a bounding-sphere volume
    ///
    /// Adapter over [`Self::new_sphere`]: extracts radius and places the
    /// collideable at the volume's center.
    pub fn new_sphere_from_bounds(
        &mut self,
        bounds: &BoundingSphere,
    ) -> Result<CollideableKey, CollisionError> {
        let key = self.new_sphere(bounds.radius)?;
        self.space.set_local_position(key, bounds.center);
        Ok(key)
    }

    /// Create a box collideable
    pub fn new_box(&mut self, half_extents: Vec3) -> Result<CollideableKey, CollisionError> {
        self.backend.new_box(&mut self.space, half_extents)
    }

    /// Create a box from an axis-aligned bounding volume
    ///
    /// Adapter over [`Self::new_box`]: extracts half extents and places
    /// the collideable at the box center.
    pub fn new_box_from_aabb(&mut self, aabb: &Aabb) -> Result<CollideableKey, CollisionError> {
        let half_extents = (aabb.max - aabb.min) * 0.5;
        let key = self.new_box(half_extents)?;
        self.space.set_local_position(key, aabb.center());
        Ok(key)
    }

    /// Create a capsule collideable
    pub fn new_capsule(
        &mut self,
        radius: f32,
        length: f32,
    ) -> Result<CollideableKey, CollisionError> {
        self.backend.new_capsule(&mut self.space, radius, length)
    }

    /// Create a cylinder collideable
    pub fn new_cylinder(
        &mut self,
        radius: f32,
        length: f32,
    ) -> Result<CollideableKey, CollisionError> {
        self.backend.new_cylinder(&mut self.space, radius, length)
    }

    /// Create a one-sided plane collideable
    pub fn new_plane(&mut self, normal: Vec3, offset: f32) -> Result<CollideableKey, CollisionError> {
        self.backend.new_plane(&mut self.space, normal, offset)
    }

    /// Create a finite ray collideable
    pub fn new_ray(
        &mut self,
        direction: Vec3,
        length: f32,
    ) -> Result<CollideableKey, CollisionError> {
        self.backend.new_ray(&mut self.space, direction, length)
    }

    /// Create a triangle-mesh collideable from prepared mesh data
    pub fn new_tri_mesh(&mut self, data: TriMeshData) -> Result<CollideableKey, CollisionError> {
        self.backend.new_tri_mesh(&mut self.space, data)
    }

    /// Create a tri-mesh from a vertex container with optional indices
    ///
    /// Adapter over [`Self::new_tri_mesh`]; absent indices default to the
    /// sequential identity.
    pub fn new_tri_mesh_from_vertices(
        &mut self,
        vertices: Vec<Point3>,
        indices: Option<Vec<u32>>,
    ) -> Result<CollideableKey, CollisionError> {
        self.new_tri_mesh(TriMeshData::from_vertices(vertices, indices))
    }

    /// Create a tri-mesh from a triangle container
    ///
    /// Adapter over [`Self::new_tri_mesh`]; triangle vertices are emitted
    /// in the fixed reversed winding.
    pub fn new_tri_mesh_from_triangles(
        &mut self,
        triangles: &[Triangle],
    ) -> Result<CollideableKey, CollisionError> {
        self.new_tri_mesh(TriMeshData::from_triangles(triangles))
    }

    /// Create a tri-mesh from pickable scene geometry
    ///
    /// Adapter over [`Self::new_tri_mesh`]. Only triangle-bearing
    /// geometry kinds qualify; points and lines have no faces to mesh.
    pub fn new_tri_mesh_from_geometry(
        &mut self,
        geometry: &Geometry,
    ) -> Result<CollideableKey, CollisionError> {
        let data = match geometry {
            Geometry::Triangles(g) => {
                TriMeshData::from_vertices(g.vertices().to_vec(), None)
            }
            Geometry::TriangleStrip(g) => {
                let mut indices = Vec::with_capacity(g.triangle_count() * 3);
                for i in 0..g.triangle_count() {
                    indices.extend([i as u32, i as u32 + 1, i as u32 + 2]);
                }
                TriMeshData::from_arrays(g.vertices().to_vec(), indices)
            }
            Geometry::IndexedTriangleStrip(g) => {
                let mut indices = Vec::with_capacity(g.triangle_count() * 3);
                for i in 0..g.triangle_count() {
                    indices.extend([g.indices()[i], g.indices()[i + 1], g.indices()[i + 2]]);
                }
                TriMeshData::from_arrays(g.vertices().to_vec(), indices)
            }
            Geometry::Points(_) | Geometry::Lines(_) => {
                return Err(CollisionError::NonTriangleGeometry)
            }
        };
        self.new_tri_mesh(data)
    }

    /// Create a collideable group
    pub fn new_group(
        &mut self,
        group_type: CollideableGroupType,
    ) -> Result<CollideableKey, CollisionError> {
        self.backend.new_group(&mut self.space, group_type)
    }

    /// Recompute world poses for a collideable (and optionally its
    /// subtree), pushing the result into the backend when `apply` is set
    pub fn recompute_world_coords(
        &mut self,
        key: CollideableKey,
        children_too: bool,
        apply: bool,
    ) {
        let Self { backend, space, .. } = self;
        if apply {
            space.recompute_world_coords(
                key,
                children_too,
                Some(&mut |k, p: &Point3, r: &Mat3| backend.apply_world_pose(k, p, r)),
            );
        } else {
            space.recompute_world_coords(key, children_too, None);
        }
    }

    /// Check two collideables or groups, reporting to a listener
    pub fn check_pair_with_listener(
        &mut self,
        first: CollideableKey,
        second: CollideableKey,
        ignore_static: bool,
        listener: &mut dyn CollisionListener,
    ) {
        self.backend
            .check_pair(&self.space, first, second, ignore_static, listener);
    }

    /// Check two collideables or groups into an out-parameter list
    ///
    /// The list is cleared first. Convenience wrapper over the listener
    /// form.
    pub fn check_pair_into(
        &mut self,
        first: CollideableKey,
        second: CollideableKey,
        ignore_static: bool,
        out: &mut Vec<Collision>,
    ) {
        out.clear();
        let mut collect = |collision: &Collision| out.push(collision.clone());
        self.backend
            .check_pair(&self.space, first, second, ignore_static, &mut collect);
    }

    /// Check two collideables or groups, returning the collisions
    pub fn check_pair_collisions(
        &mut self,
        first: CollideableKey,
        second: CollideableKey,
        ignore_static: bool,
    ) -> Vec<Collision> {
        let mut out = Vec::new();
        self.check_pair_into(first, second, ignore_static, &mut out);
        out
    }

    /// Check a group against itself, reporting to a listener
    pub fn check_group_with_listener(
        &mut self,
        group: CollideableKey,
        ignore_static: bool,
        listener: &mut dyn CollisionListener,
    ) {
        self.backend
            .check_group(&self.space, group, ignore_static, listener);
    }

    /// Check a group against itself into an out-parameter list
    ///
    /// The list is cleared first.
    pub fn check_group_into(
        &mut self,
        group: CollideableKey,
        ignore_static: bool,
        out: &mut Vec<Collision>,
    ) {
        out.clear();
        let mut collect = |collision: &Collision| out.push(collision.clone());
        self.backend
            .check_group(&self.space, group, ignore_static, &mut collect);
    }

    /// Check a group against itself, returning the collisions
    pub fn check_group_collisions(
        &mut self,
        group: CollideableKey,
        ignore_static: bool,
    ) -> Vec<Collision> {
        let mut out = Vec::new();
        self.check_group_into(group, ignore_static, &mut out);
        out
    }

    /// Register a standing check, re-evaluated every [`Self::update`]
    pub fn add_check(&mut self, check: CollisionCheck) {
        self.checks.push(check);
    }

    /// Number of registered checks
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Listener used by checks that carry none of their own
    pub fn set_default_listener(&mut self, listener: Option<Box<dyn CollisionListener>>) {
        self.default_listener = listener;
    }

    /// Enable or disable the per-tick check evaluation
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the per-tick check evaluation runs
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-evaluate every registered check
    ///
    /// Each check reports into its own listener, falling back to the
    /// default listener; a check with neither is skipped with a warning
    /// rather than failing the tick.
    pub fn update(&mut self) {
        if !self.enabled {
            return;
        }
        let Self {
            backend,
            space,
            checks,
            default_listener,
            ..
        } = self;
        for check in checks.iter_mut() {
            let listener = match check.listener.as_deref_mut() {
                Some(own) => Some(own),
                None => default_listener.as_deref_mut(),
            };
            let Some(listener) = listener else {
                log::warn!("collision check has no listener and no default is set; skipped");
                continue;
            };
            match check.second {
                Some(second) => {
                    backend.check_pair(space, check.first, second, check.ignore_static, listener);
                }
                None => backend.check_group(space, check.first, check.ignore_static, listener),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::space::CollideableShape;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend with no factories: every pair check reports one contact.
    struct StubBackend;

    impl CollisionBackend for StubBackend {
        fn vendor(&self) -> &str {
            "stub"
        }

        fn check_pair(
            &mut self,
            _space: &CollisionSpace,
            first: CollideableKey,
            second: CollideableKey,
            _ignore_static: bool,
            listener: &mut dyn CollisionListener,
        ) {
            listener.on_collision(&Collision::new(
                first,
                second,
                Point3::origin(),
                Vec3::y(),
                0.0,
            ));
        }

        fn check_group(
            &mut self,
            _space: &CollisionSpace,
            _group: CollideableKey,
            _ignore_static: bool,
            _listener: &mut dyn CollisionListener,
        ) {
        }
    }

    fn engine_with_pair() -> (CollisionEngine, CollideableKey, CollideableKey) {
        let mut engine = CollisionEngine::new(Box::new(StubBackend));
        let a = engine
            .space_mut()
            .insert(CollideableShape::Sphere { radius: 1.0 });
        let b = engine
            .space_mut()
            .insert(CollideableShape::Sphere { radius: 1.0 });
        (engine, a, b)
    }

    #[test]
    fn test_unimplemented_factory_names_feature_and_vendor() {
        let mut engine = CollisionEngine::new(Box::new(StubBackend));
        let error = engine.new_capsule(0.5, 2.0).unwrap_err();
        match error {
            CollisionError::NotImplemented { feature, vendor } => {
                assert_eq!(feature, "capsule");
                assert_eq!(vendor, "stub");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_update_prefers_check_listener_over_default() {
        let (mut engine, a, b) = engine_with_pair();

        let own_hits = Arc::new(AtomicUsize::new(0));
        let default_hits = Arc::new(AtomicUsize::new(0));

        let own = Arc::clone(&own_hits);
        engine.add_check(
            CollisionCheck::pair(a, b).with_listener(Box::new(move |_: &Collision| {
                own.fetch_add(1, Ordering::SeqCst);
            })),
        );

        let fallback = Arc::clone(&default_hits);
        engine.set_default_listener(Some(Box::new(move |_: &Collision| {
            fallback.fetch_add(1, Ordering::SeqCst);
        })));

        engine.update();
        assert_eq!(own_hits.load(Ordering::SeqCst), 1);
        assert_eq!(default_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listenerless_check_is_skipped_not_fatal() {
        let (mut engine, a, b) = engine_with_pair();
        engine.add_check(CollisionCheck::pair(a, b));
        // No default listener either: the tick must survive.
        engine.update();
        assert_eq!(engine.check_count(), 1);
    }

    #[test]
    fn test_disabled_engine_skips_checks() {
        let (mut engine, a, b) = engine_with_pair();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        engine.add_check(
            CollisionCheck::pair(a, b).with_listener(Box::new(move |_: &Collision| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );
        engine.set_enabled(false);
        engine.update();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_returned_list_wraps_listener_form() {
        let (mut engine, a, b) = engine_with_pair();
        let collisions = engine.check_pair_collisions(a, b, false);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].entity1(), a);
        assert_eq!(collisions[0].entity2(), b);
    }
}
