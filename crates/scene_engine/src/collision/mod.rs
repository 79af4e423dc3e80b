//! Rigid-body collision abstraction
//!
//! A collideable hierarchy with explicit world-pose propagation, a
//! backend-agnostic engine with capability-negotiated primitive factories
//! and n×m / n×n batch queries, a built-in list backend, and the resolver
//! layer that routes detected contacts to listeners and the simulation
//! world.

mod contact;
mod engine;
mod primitives;
mod resolver;
mod simple;
mod space;

pub use contact::Collision;
pub use engine::{
    CollisionBackend, CollisionCheck, CollisionEngine, CollisionError, CollisionListener,
};
pub use primitives::Triangle;
pub use resolver::{
    CollisionResolveListener, CollisionResolver, CollisionResolversManager, ResolverTarget,
    SimulationWorld, SurfaceParameters,
};
pub use simple::SimpleCollisionEngine;
pub use space::{
    Body, BodyKey, Collideable, CollideableGroupType, CollideableKey, CollideableShape,
    CollideableUserData, CollisionSpace, TriMeshData,
};
