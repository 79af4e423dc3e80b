//! Picking queries and result dispatch
//!
//! The service walks group bounds to prune candidates, confirms survivors
//! with the geometry tester, sorts by distance and hands the outcome to a
//! listener. Queries run synchronously, or are queued and drained by the
//! frame loop so a non-loop thread never touches node bounds directly.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::config::EngineSettings;
use crate::foundation::memory::ObjectPool;
use crate::foundation::time::Stopwatch;
use crate::picking::ray::PickRay;
use crate::picking::result::{MouseButton, PickResult};
use crate::picking::tester::{DefaultGeometryPickTester, GeometryPickTester};
use crate::scene::{Camera, Canvas, NodeKey, NodeKind, SceneGraph};

/// Opaque user payload carried through a pick request into its callbacks
pub type PickUserData = Arc<dyn Any + Send + Sync>;

/// Callbacks a pick query reports into
///
/// All methods default to no-ops so implementors only override the
/// outcomes they care about. `elapsed_millis` measures the query itself,
/// including any time spent queued is *not* counted.
pub trait PickListener {
    /// All results of a pick-all query, ascending by distance
    fn on_objects_picked(
        &mut self,
        results: &[PickResult],
        user: Option<&(dyn Any + Send + Sync)>,
        elapsed_millis: f32,
    ) {
        let _ = (results, user, elapsed_millis);
    }

    /// The nearest result of a pick-nearest query
    fn on_object_picked(
        &mut self,
        result: &PickResult,
        user: Option<&(dyn Any + Send + Sync)>,
        elapsed_millis: f32,
    ) {
        let _ = (result, user, elapsed_millis);
    }

    /// Nothing was picked
    fn on_picking_missed(&mut self, user: Option<&(dyn Any + Send + Sync)>, elapsed_millis: f32) {
        let _ = (user, elapsed_millis);
    }
}

/// Fans one pick outcome out to several independent listeners
///
/// Each listener is isolated: one panicking listener is logged and the
/// remaining listeners are still notified.
#[derive(Default)]
pub struct PickBroadcaster {
    listeners: Vec<Box<dyn PickListener + Send>>,
}

impl PickBroadcaster {
    /// Creates an empty broadcaster
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add_listener(&mut self, listener: Box<dyn PickListener + Send>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn dispatch(&mut self, mut call: impl FnMut(&mut dyn PickListener)) {
        for listener in &mut self.listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| call(listener.as_mut())));
            if outcome.is_err() {
                log::error!("pick listener panicked; continuing with remaining listeners");
            }
        }
    }
}

impl PickListener for PickBroadcaster {
    fn on_objects_picked(
        &mut self,
        results: &[PickResult],
        user: Option<&(dyn Any + Send + Sync)>,
        elapsed_millis: f32,
    ) {
        self.dispatch(|l| l.on_objects_picked(results, user, elapsed_millis));
    }

    fn on_object_picked(
        &mut self,
        result: &PickResult,
        user: Option<&(dyn Any + Send + Sync)>,
        elapsed_millis: f32,
    ) {
        self.dispatch(|l| l.on_object_picked(result, user, elapsed_millis));
    }

    fn on_picking_missed(&mut self, user: Option<&(dyn Any + Send + Sync)>, elapsed_millis: f32) {
        self.dispatch(|l| l.on_picking_missed(user, elapsed_millis));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickMode {
    All,
    Nearest,
}

struct ScheduledPick {
    mode: PickMode,
    roots: Vec<NodeKey>,
    camera: Camera,
    canvas: Canvas,
    button: MouseButton,
    x: f32,
    y: f32,
    listener: Box<dyn PickListener + Send>,
    user: Option<PickUserData>,
}

/// The picking engine
///
/// Owns the geometry tester strategy and the geometry-ignore flag; both
/// are fixed at construction (changing them mid-session is unsupported).
pub struct PickingService {
    tester: Box<dyn GeometryPickTester + Send>,
    ignore_geometry: bool,
    result_buffers: ObjectPool<Vec<PickResult>>,
    scheduled: Mutex<VecDeque<ScheduledPick>>,
}

impl PickingService {
    /// Creates a service with the default tester and default settings
    pub fn new() -> Self {
        Self::with_settings(&EngineSettings::default())
    }

    /// Creates a service configured from [`EngineSettings`]
    pub fn with_settings(settings: &EngineSettings) -> Self {
        Self::with_tester(
            Box::new(DefaultGeometryPickTester),
            settings.picking.ignore_geometry,
            settings.picking.result_pool_capacity,
        )
    }

    /// Creates a service with an explicit tester strategy
    pub fn with_tester(
        tester: Box<dyn GeometryPickTester + Send>,
        ignore_geometry: bool,
        result_pool_capacity: usize,
    ) -> Self {
        Self {
            tester,
            ignore_geometry,
            result_buffers: ObjectPool::with_default(result_pool_capacity),
            scheduled: Mutex::new(VecDeque::new()),
        }
    }

    /// Whether the geometry phase is skipped and bounds results trusted
    pub fn is_geometry_ignored(&self) -> bool {
        self.ignore_geometry
    }

    /// Pick every leaf the pixel's ray intersects, distance-ordered
    pub fn pick_all(
        &mut self,
        graph: &mut SceneGraph,
        roots: &[NodeKey],
        camera: &Camera,
        canvas: Canvas,
        button: MouseButton,
        x: f32,
        y: f32,
        listener: &mut dyn PickListener,
        user: Option<PickUserData>,
    ) {
        let pick_ray = PickRay::from_canvas(camera, canvas, x, y);
        self.execute(PickMode::All, graph, roots, pick_ray, button, listener, user);
    }

    /// Pick only the closest intersected leaf
    pub fn pick_nearest(
        &mut self,
        graph: &mut SceneGraph,
        roots: &[NodeKey],
        camera: &Camera,
        canvas: Canvas,
        button: MouseButton,
        x: f32,
        y: f32,
        listener: &mut dyn PickListener,
        user: Option<PickUserData>,
    ) {
        let pick_ray = PickRay::from_canvas(camera, canvas, x, y);
        self.execute(
            PickMode::Nearest,
            graph,
            roots,
            pick_ray,
            button,
            listener,
            user,
        );
    }

    /// Pick-all with a pre-derived ray
    pub fn pick_all_with_ray(
        &mut self,
        graph: &mut SceneGraph,
        roots: &[NodeKey],
        pick_ray: PickRay,
        button: MouseButton,
        listener: &mut dyn PickListener,
        user: Option<PickUserData>,
    ) {
        self.execute(PickMode::All, graph, roots, pick_ray, button, listener, user);
    }

    /// Pick-nearest with a pre-derived ray
    pub fn pick_nearest_with_ray(
        &mut self,
        graph: &mut SceneGraph,
        roots: &[NodeKey],
        pick_ray: PickRay,
        button: MouseButton,
        listener: &mut dyn PickListener,
        user: Option<PickUserData>,
    ) {
        self.execute(
            PickMode::Nearest,
            graph,
            roots,
            pick_ray,
            button,
            listener,
            user,
        );
    }

    /// Queue a pick-all for the next [`Self::process_scheduled`] call
    ///
    /// Safe to call from a thread other than the frame loop; the query
    /// itself runs when the loop drains the queue.
    pub fn schedule_pick_all(
        &self,
        roots: &[NodeKey],
        camera: &Camera,
        canvas: Canvas,
        button: MouseButton,
        x: f32,
        y: f32,
        listener: Box<dyn PickListener + Send>,
        user: Option<PickUserData>,
    ) {
        self.schedule(PickMode::All, roots, camera, canvas, button, x, y, listener, user);
    }

    /// Queue a pick-nearest for the next [`Self::process_scheduled`] call
    pub fn schedule_pick_nearest(
        &self,
        roots: &[NodeKey],
        camera: &Camera,
        canvas: Canvas,
        button: MouseButton,
        x: f32,
        y: f32,
        listener: Box<dyn PickListener + Send>,
        user: Option<PickUserData>,
    ) {
        self.schedule(
            PickMode::Nearest,
            roots,
            camera,
            canvas,
            button,
            x,
            y,
            listener,
            user,
        );
    }

    fn schedule(
        &self,
        mode: PickMode,
        roots: &[NodeKey],
        camera: &Camera,
        canvas: Canvas,
        button: MouseButton,
        x: f32,
        y: f32,
        listener: Box<dyn PickListener + Send>,
        user: Option<PickUserData>,
    ) {
        let request = ScheduledPick {
            mode,
            roots: roots.to_vec(),
            camera: camera.clone(),
            canvas,
            button,
            x,
            y,
            listener,
            user,
        };
        if let Ok(mut queue) = self.scheduled.lock() {
            queue.push_back(request);
        } else {
            log::error!("scheduled pick queue poisoned; request dropped");
        }
    }

    /// Execute every queued pick request, FIFO; returns how many ran
    ///
    /// Call once per frame from the loop that owns the scene graph.
    /// Once scheduled a pick always executes; there is no cancellation.
    pub fn process_scheduled(&mut self, graph: &mut SceneGraph) -> usize {
        let drained: Vec<ScheduledPick> = match self.scheduled.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => {
                log::error!("scheduled pick queue poisoned; nothing processed");
                return 0;
            }
        };

        let count = drained.len();
        for mut request in drained {
            let pick_ray = PickRay::from_canvas(&request.camera, request.canvas, request.x, request.y);
            self.execute(
                request.mode,
                graph,
                &request.roots,
                pick_ray,
                request.button,
                request.listener.as_mut(),
                request.user,
            );
        }
        count
    }

    fn execute(
        &mut self,
        mode: PickMode,
        graph: &mut SceneGraph,
        roots: &[NodeKey],
        pick_ray: PickRay,
        button: MouseButton,
        listener: &mut dyn PickListener,
        user: Option<PickUserData>,
    ) {
        let stopwatch = Stopwatch::start_new();

        // Bounds must be current before the walk trusts them.
        for root in roots {
            graph.update_world(*root);
        }

        let mut results = self.result_buffers.allocate();
        results.clear(); // recycled buffers keep their previous entries

        for root in roots {
            collect_candidates(graph, *root, &pick_ray, button, &mut results);
        }

        if !self.ignore_geometry {
            self.geometry_phase(graph, &pick_ray, mode, &mut results);
        }

        results.sort_by(PickResult::cmp_by_distance);

        let elapsed = stopwatch.elapsed_millis();
        let user_ref = user.as_deref();
        if results.is_empty() {
            listener.on_picking_missed(user_ref, elapsed);
        } else {
            match mode {
                PickMode::All => listener.on_objects_picked(&results, user_ref, elapsed),
                PickMode::Nearest => listener.on_object_picked(&results[0], user_ref, elapsed),
            }
        }

        self.result_buffers.deallocate(results);
    }

    /// Confirm or reject bounds-phase candidates with exact tests
    fn geometry_phase(
        &mut self,
        graph: &SceneGraph,
        pick_ray: &PickRay,
        mode: PickMode,
        candidates: &mut Vec<PickResult>,
    ) {
        // In nearest mode the accept bound survives across candidates, so
        // a candidate behind an existing hit is rejected without finishing
        // its triangle walk.
        let mut shared_bound = f32::INFINITY;

        candidates.retain_mut(|candidate| {
            let Some(node) = graph.node(candidate.node()) else {
                return false;
            };
            let Some(geometry) = node.geometry() else {
                return false;
            };
            let Some(inverse) = node.world_transform().try_inverse() else {
                log::warn!("non-invertible world transform on pick candidate; dropped");
                return false;
            };
            let local_ray = pick_ray.ray().transformed(&inverse);

            let hit = match mode {
                PickMode::Nearest => {
                    self.tester
                        .test(pick_ray, &local_ray, geometry, &mut shared_bound)
                }
                PickMode::All => {
                    let mut bound = f32::INFINITY;
                    self.tester.test(pick_ray, &local_ray, geometry, &mut bound)
                }
            };

            match hit {
                Some(hit) => {
                    let position = pick_ray.ray().point_at(hit.min_distance);
                    candidate.apply_geometry_hit(
                        hit.face_index,
                        hit.min_distance,
                        hit.max_distance,
                        position,
                    );
                    true
                }
                None => false,
            }
        });
    }
}

impl Default for PickingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first bounds-phase walk
fn collect_candidates(
    graph: &SceneGraph,
    key: NodeKey,
    pick_ray: &PickRay,
    button: MouseButton,
    out: &mut Vec<PickResult>,
) {
    let Some(node) = graph.node(key) else {
        return;
    };
    if !node.is_pickable() || !node.is_renderable() {
        return;
    }
    let Some(bounds) = node.world_bounds() else {
        // Bad scene data, not a picking bug: skip the subtree, keep going.
        log::warn!("scene node has no world bounds; skipping its subtree during picking");
        return;
    };
    let Some((_, point)) = bounds.intersect_ray(pick_ray.ray()) else {
        return;
    };

    match node.kind() {
        NodeKind::Group { .. } => {
            for child in node.children() {
                collect_candidates(graph, *child, pick_ray, button, out);
            }
        }
        NodeKind::Leaf { .. } => {
            let distance_squared = (point - pick_ray.origin()).magnitude_squared();
            out.push(PickResult::bounds_hit(key, distance_squared, point, button));
        }
    }
}
