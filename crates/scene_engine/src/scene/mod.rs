//! Scene-facing capability surface
//!
//! The render scene graph proper is an external collaborator; this module
//! carries the minimal concrete pieces the picking subsystem consumes: a
//! lightweight arena-backed node tree with cached world transforms and
//! bounds, bounding volumes with ray tests, a geometry tagged union, and
//! the camera/view description rays are derived from.

mod bounds;
mod camera;
mod geometry;
mod graph;

pub use bounds::{Aabb, BoundingSphere, Bounds};
pub use camera::{Camera, Canvas, Projection, Viewport};
pub use geometry::{
    Geometry, IndexedTriangleStripArray, LineArray, PointArray, TriangleArray,
    TriangleStripArray,
};
pub use graph::{NodeKey, NodeKind, SceneGraph, SceneNode};
