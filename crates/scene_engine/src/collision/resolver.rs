//! Standing collision resolution
//!
//! A [`CollisionResolver`] pairs two sets of collideables (expanded from
//! bodies or single collideables at construction time) and checks every
//! combination each tick, giving registered listeners first refusal on
//! each detected contact before forwarding it to the simulation world.
//! [`CollisionResolversManager`] owns the shared listener registry and
//! default surface parameters and ticks every resolver per update.

use crate::collision::contact::Collision;
use crate::collision::engine::{CollisionEngine, CollisionError};
use crate::collision::space::{BodyKey, CollideableKey, CollisionSpace};

/// Surface response parameters applied when the world resolves a contact
#[derive(Debug, Clone, Copy)]
pub struct SurfaceParameters {
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Restitution (bounciness), 0 = fully inelastic
    pub restitution: f32,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.2,
        }
    }
}

/// External physics world that performs the actual physical response
pub trait SimulationWorld {
    /// Resolve one unconsumed collision against surface parameters
    fn resolve_collision(&mut self, collision: &Collision, surface: &SurfaceParameters);
}

/// Gets first refusal on detected collisions
pub trait CollisionResolveListener {
    /// Return true to consume the collision and stop it from reaching
    /// the simulation world
    fn on_collision(&mut self, collision: &Collision) -> bool;
}

/// What a resolver side expands from
pub enum ResolverTarget {
    /// A single collideable (or group)
    Collideable(CollideableKey),
    /// Every collideable attached to one body
    Body(BodyKey),
    /// Every collideable attached to any of several bodies
    Bodies(Vec<BodyKey>),
}

/// A standing pairing of two collideable sets checked every tick
///
/// The sets are a snapshot taken at construction: collideables attached
/// to a body afterward are not seen by an existing resolver — build a new
/// one to pick them up.
pub struct CollisionResolver {
    first: Vec<CollideableKey>,
    second: Option<Vec<CollideableKey>>,
}

impl CollisionResolver {
    /// Creates a resolver between `first` and `second`, or a
    /// self-colliding resolver over `first` alone when `second` is None
    ///
    /// Fails fast on empty expansions: a body with no attached
    /// collideables is rejected here, not at the first update.
    pub fn new(
        space: &CollisionSpace,
        first: ResolverTarget,
        second: Option<ResolverTarget>,
    ) -> Result<Self, CollisionError> {
        let first = Self::expand(space, first)?;
        let second = second.map(|t| Self::expand(space, t)).transpose()?;
        Ok(Self { first, second })
    }

    fn expand(
        space: &CollisionSpace,
        target: ResolverTarget,
    ) -> Result<Vec<CollideableKey>, CollisionError> {
        let expanded = match target {
            ResolverTarget::Collideable(key) => {
                if space.collideable(key).is_none() {
                    return Err(CollisionError::UnknownCollideable);
                }
                vec![key]
            }
            ResolverTarget::Body(body) => space
                .body(body)
                .ok_or(CollisionError::UnknownBody)?
                .attached()
                .to_vec(),
            ResolverTarget::Bodies(bodies) => {
                let mut all = Vec::new();
                for body in bodies {
                    all.extend_from_slice(
                        space.body(body).ok_or(CollisionError::UnknownBody)?.attached(),
                    );
                }
                all
            }
        };
        if expanded.is_empty() {
            return Err(CollisionError::InvalidResolverArguments(
                "target expands to no collideables".to_string(),
            ));
        }
        Ok(expanded)
    }

    /// The snapshot of the first side
    pub fn first(&self) -> &[CollideableKey] {
        &self.first
    }

    /// The snapshot of the second side, if any
    pub fn second(&self) -> Option<&[CollideableKey]> {
        self.second.as_deref()
    }

    /// Check every combination and route detected collisions
    ///
    /// Listeners are offered each collision in order until one consumes
    /// it. An unconsumed collision is forwarded to the world only if at
    /// least one colliding entity resolves a body; otherwise it is
    /// dropped after listener notification.
    pub fn update(
        &mut self,
        engine: &mut CollisionEngine,
        listeners: &mut [Box<dyn CollisionResolveListener>],
        world: &mut dyn SimulationWorld,
        surface: &SurfaceParameters,
    ) {
        let mut collisions: Vec<Collision> = Vec::new();
        match &self.second {
            Some(second) => {
                for &a in &self.first {
                    for &b in second {
                        if a == b {
                            continue;
                        }
                        collisions.extend(engine.check_pair_collisions(a, b, false));
                    }
                }
            }
            None => {
                for i in 0..self.first.len() {
                    for j in (i + 1)..self.first.len() {
                        collisions.extend(engine.check_pair_collisions(
                            self.first[i],
                            self.first[j],
                            false,
                        ));
                    }
                }
            }
        }

        for collision in &collisions {
            let consumed = listeners.iter_mut().any(|l| l.on_collision(collision));
            if consumed {
                continue;
            }
            let resolvable = engine
                .space()
                .resolve_body(collision.entity1())
                .or_else(|| engine.space().resolve_body(collision.entity2()))
                .is_some();
            if resolvable {
                world.resolve_collision(collision, surface);
            }
        }
    }
}

/// Owns resolvers, their shared listeners and default surface parameters
#[derive(Default)]
pub struct CollisionResolversManager {
    resolvers: Vec<CollisionResolver>,
    listeners: Vec<Box<dyn CollisionResolveListener>>,
    default_surface: SurfaceParameters,
}

impl CollisionResolversManager {
    /// Creates a manager with the given default surface parameters
    pub fn new(default_surface: SurfaceParameters) -> Self {
        Self {
            resolvers: Vec::new(),
            listeners: Vec::new(),
            default_surface,
        }
    }

    /// Register a resolver
    pub fn add_resolver(&mut self, resolver: CollisionResolver) {
        self.resolvers.push(resolver);
    }

    /// Register a listener shared by every resolver
    pub fn add_listener(&mut self, listener: Box<dyn CollisionResolveListener>) {
        self.listeners.push(listener);
    }

    /// The shared default surface parameters
    pub fn default_surface(&self) -> SurfaceParameters {
        self.default_surface
    }

    /// Replace the shared default surface parameters
    pub fn set_default_surface(&mut self, surface: SurfaceParameters) {
        self.default_surface = surface;
    }

    /// Tick every registered resolver once
    pub fn update(&mut self, engine: &mut CollisionEngine, world: &mut dyn SimulationWorld) {
        for resolver in &mut self.resolvers {
            resolver.update(engine, &mut self.listeners, world, &self.default_surface);
        }
    }
}
