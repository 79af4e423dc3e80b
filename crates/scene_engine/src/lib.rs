//! # Scene Engine
//!
//! Picking and collision detection for retained-mode 3D scene graphs.
//!
//! ## Features
//!
//! - **Ray Picking**: screen pixel to world ray under perspective or
//!   parallel projection, bounds-then-geometry two-phase search,
//!   distance-ordered listener dispatch
//! - **Geometry Testing**: exact triangle, strip, point-billboard and
//!   line-box intersection with a pluggable tester strategy
//! - **Collision Hierarchy**: collideable trees with explicit world-pose
//!   propagation and body delegation
//! - **Pluggable Backends**: capability-negotiated collision engine
//!   abstraction with a built-in list backend
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! struct PrintOnPick;
//!
//! impl PickListener for PrintOnPick {
//!     fn on_object_picked(
//!         &mut self,
//!         result: &PickResult,
//!         _user: Option<&(dyn std::any::Any + Send + Sync)>,
//!         elapsed_millis: f32,
//!     ) {
//!         println!("picked {:?} in {elapsed_millis} ms", result.node());
//!     }
//! }
//!
//! let mut graph = SceneGraph::new();
//! let root = graph.add_group(None);
//! let camera = Camera::new(Projection::Perspective);
//!
//! let mut picking = PickingService::new();
//! picking.pick_nearest(
//!     &mut graph,
//!     &[root],
//!     &camera,
//!     Canvas::new(1920, 1080),
//!     MouseButton::Left,
//!     960.0,
//!     540.0,
//!     &mut PrintOnPick,
//!     None,
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod config;
pub mod foundation;
pub mod picking;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::collision::{
        Collision, CollisionCheck, CollisionEngine, CollisionError, CollisionResolver,
        CollisionResolversManager, CollisionSpace, ResolverTarget, SimpleCollisionEngine,
        SimulationWorld, SurfaceParameters,
    };
    pub use crate::config::{ConfigError, EngineSettings};
    pub use crate::foundation::math::{Mat3, Mat4, Point3, Vec2, Vec3};
    pub use crate::picking::{
        MouseButton, PickListener, PickRay, PickResult, PickingService, Ray,
    };
    pub use crate::scene::{
        Camera, Canvas, Geometry, NodeKey, Projection, SceneGraph, TriangleArray, Viewport,
    };
}
