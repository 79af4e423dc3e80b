//! Ray picking over the scene graph
//!
//! Converts screen coordinates into world-space rays and resolves them
//! against the scene in two phases: a cheap bounds walk that prunes
//! candidates, then exact per-primitive intersection tests. Results are
//! delivered distance-ordered to listener callbacks, synchronously or via
//! a scheduled queue drained by the frame loop.

mod ray;
mod result;
mod service;
mod tester;

pub use ray::{PickRay, Ray};
pub use result::{MouseButton, PickAccessError, PickResult};
pub use service::{PickBroadcaster, PickListener, PickUserData, PickingService};
pub use tester::{DefaultGeometryPickTester, GeometryHit, GeometryPickTester};
