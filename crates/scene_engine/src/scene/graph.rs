//! Arena-backed scene graph
//!
//! A minimal retained tree with cached world transforms and bounds —
//! just the capability surface picking traverses: pickable/renderable
//! flags, group children, leaf geometry. Nodes live in a slotmap and are
//! addressed by [`NodeKey`], so references never dangle across removals.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Mat4;
use crate::scene::bounds::{BoundingSphere, Bounds};
use crate::scene::geometry::Geometry;

new_key_type! {
    /// Stable handle to a scene node
    pub struct NodeKey;
}

/// What a node is: an interior group or a geometry-bearing leaf
#[derive(Debug)]
pub enum NodeKind {
    /// Interior node owning an ordered child list
    Group {
        /// Children in insertion order
        children: Vec<NodeKey>,
    },
    /// Leaf carrying pickable geometry
    Leaf {
        /// The leaf's geometry
        geometry: Geometry,
    },
}

/// A node in the scene graph
#[derive(Debug)]
pub struct SceneNode {
    pickable: bool,
    renderable: bool,
    local_transform: Mat4,
    world_transform: Mat4,
    world_bounds: Option<Bounds>,
    parent: Option<NodeKey>,
    kind: NodeKind,
}

impl SceneNode {
    fn new(parent: Option<NodeKey>, kind: NodeKind) -> Self {
        Self {
            pickable: true,
            renderable: true,
            local_transform: Mat4::identity(),
            world_transform: Mat4::identity(),
            world_bounds: None,
            parent,
            kind,
        }
    }

    /// Whether picking considers this node at all
    pub fn is_pickable(&self) -> bool {
        self.pickable
    }

    /// Whether the node is currently rendered
    pub fn is_renderable(&self) -> bool {
        self.renderable
    }

    /// Cached world transform, valid after [`SceneGraph::update_world`]
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// Cached world bounds, valid after [`SceneGraph::update_world`]
    ///
    /// None for empty leaves and for groups whose subtree has no bounds.
    pub fn world_bounds(&self) -> Option<&Bounds> {
        self.world_bounds.as_ref()
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Node kind (group or leaf)
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Children of a group node; empty for leaves
    pub fn children(&self) -> &[NodeKey] {
        match &self.kind {
            NodeKind::Group { children } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    /// Geometry of a leaf node; None for groups
    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.kind {
            NodeKind::Leaf { geometry } => Some(geometry),
            NodeKind::Group { .. } => None,
        }
    }
}

/// The scene graph arena
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
}

impl SceneGraph {
    /// Creates an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group node under `parent` (or as a root when None)
    pub fn add_group(&mut self, parent: Option<NodeKey>) -> NodeKey {
        self.add_node(parent, NodeKind::Group {
            children: Vec::new(),
        })
    }

    /// Add a geometry leaf under `parent` (or as a root when None)
    pub fn add_leaf(&mut self, parent: Option<NodeKey>, geometry: Geometry) -> NodeKey {
        self.add_node(parent, NodeKind::Leaf { geometry })
    }

    fn add_node(&mut self, parent: Option<NodeKey>, kind: NodeKind) -> NodeKey {
        let key = self.nodes.insert(SceneNode::new(parent, kind));
        if let Some(parent_key) = parent {
            match self.nodes.get_mut(parent_key).map(|n| &mut n.kind) {
                Some(NodeKind::Group { children }) => children.push(key),
                _ => {
                    log::warn!("scene node attached to a non-group parent; left unparented");
                    self.nodes[key].parent = None;
                }
            }
        }
        key
    }

    /// Look up a node
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set a node's transform relative to its parent
    pub fn set_local_transform(&mut self, key: NodeKey, transform: Mat4) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.local_transform = transform;
        }
    }

    /// Enable or disable picking for a node
    pub fn set_pickable(&mut self, key: NodeKey, pickable: bool) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.pickable = pickable;
        }
    }

    /// Enable or disable rendering for a node
    pub fn set_renderable(&mut self, key: NodeKey, renderable: bool) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.renderable = renderable;
        }
    }

    /// Drop a node's cached world bounds
    ///
    /// Useful in tests and for marking a subtree's data invalid; the next
    /// [`Self::update_world`] recomputes it.
    pub fn clear_world_bounds(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.world_bounds = None;
        }
    }

    /// Recompute cached world transforms (top-down) and world bounds
    /// (bottom-up) for the subtree under `root`
    ///
    /// Must run after any local-transform or geometry change and before a
    /// pick query; the bounds phase trusts these caches.
    pub fn update_world(&mut self, root: NodeKey) {
        let parent_world = self
            .nodes
            .get(root)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map_or_else(Mat4::identity, |p| p.world_transform);
        self.update_world_recursive(root, &parent_world);
    }

    fn update_world_recursive(&mut self, key: NodeKey, parent_world: &Mat4) {
        let (world, children) = {
            let Some(node) = self.nodes.get_mut(key) else {
                return;
            };
            node.world_transform = parent_world * node.local_transform;
            let world = node.world_transform;
            match &node.kind {
                NodeKind::Leaf { geometry } => {
                    let bounds = geometry.local_bounds().map(|b| b.transformed(&world));
                    node.world_bounds = bounds;
                    return;
                }
                NodeKind::Group { children } => (world, children.clone()),
            }
        };

        for child in &children {
            self.update_world_recursive(*child, &world);
        }

        // Group bounds: sphere enclosing whatever child bounds exist.
        let mut merged: Option<BoundingSphere> = None;
        for child in &children {
            if let Some(bounds) = self.nodes.get(*child).and_then(|c| c.world_bounds) {
                let sphere = bounds.enclosing_sphere();
                match merged.as_mut() {
                    Some(m) => m.merge(&sphere),
                    None => merged = Some(sphere),
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.world_bounds = merged.map(Bounds::Sphere);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec3};
    use crate::scene::geometry::TriangleArray;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Geometry {
        Geometry::Triangles(TriangleArray::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]))
    }

    #[test]
    fn test_world_transform_composes_through_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.add_group(None);
        let child = graph.add_group(Some(root));
        let leaf = graph.add_leaf(Some(child), unit_triangle());

        graph.set_local_transform(root, Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
        graph.set_local_transform(child, Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)));
        graph.update_world(root);

        let world = graph.node(leaf).unwrap().world_transform();
        let origin = world.transform_point(&Point3::origin());
        assert_relative_eq!(origin.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(origin.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_group_bounds_enclose_children() {
        let mut graph = SceneGraph::new();
        let root = graph.add_group(None);
        let near = graph.add_leaf(Some(root), unit_triangle());
        let far = graph.add_leaf(Some(root), unit_triangle());
        graph.set_local_transform(far, Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));
        graph.update_world(root);

        let bounds = graph.node(root).unwrap().world_bounds().unwrap();
        let sphere = bounds.enclosing_sphere();
        for key in [near, far] {
            let child = graph.node(key).unwrap().world_bounds().unwrap();
            let center = child.center();
            assert!((center - sphere.center).magnitude() <= sphere.radius + 1e-4);
        }
    }

    #[test]
    fn test_empty_leaf_has_no_bounds() {
        let mut graph = SceneGraph::new();
        let root = graph.add_group(None);
        let empty = graph.add_leaf(
            Some(root),
            Geometry::Triangles(TriangleArray::new(Vec::new())),
        );
        graph.update_world(root);
        assert!(graph.node(empty).unwrap().world_bounds().is_none());
    }

    #[test]
    fn test_leaf_rejects_children() {
        let mut graph = SceneGraph::new();
        let leaf = graph.add_leaf(None, unit_triangle());
        let stray = graph.add_group(Some(leaf));
        assert!(graph.node(stray).unwrap().parent().is_none());
        assert!(graph.node(leaf).unwrap().children().is_empty());
    }
}
