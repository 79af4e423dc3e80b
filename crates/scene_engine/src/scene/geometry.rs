//! Pickable geometry kinds
//!
//! A tagged union over the vertex layouts the geometry phase knows how to
//! intersect: triangle soups, (indexed) triangle strips, point sprites and
//! line segments. Adding a kind extends the `match` in the pick tester at
//! compile time.

use crate::foundation::math::Point3;
use crate::scene::bounds::{Aabb, Bounds};

/// Plain triangle soup: every three consecutive vertices form a triangle
#[derive(Debug, Clone)]
pub struct TriangleArray {
    vertices: Vec<Point3>,
}

impl TriangleArray {
    /// Create a triangle soup; an incomplete trailing triple is ignored
    pub fn new(vertices: Vec<Point3>) -> Self {
        Self { vertices }
    }

    /// All vertices
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Vertices of triangle `i`
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        let base = i * 3;
        [
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        ]
    }
}

/// Strip-encoded triangles: each vertex from offset 2 closes a triangle
/// with its two predecessors
#[derive(Debug, Clone)]
pub struct TriangleStripArray {
    vertices: Vec<Point3>,
}

impl TriangleStripArray {
    /// Create a triangle strip
    pub fn new(vertices: Vec<Point3>) -> Self {
        Self { vertices }
    }

    /// All vertices
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Number of triangles encoded by the strip
    pub fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }

    /// Vertices of triangle `i`
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        [self.vertices[i], self.vertices[i + 1], self.vertices[i + 2]]
    }
}

/// Indexed strip-encoded triangles
#[derive(Debug, Clone)]
pub struct IndexedTriangleStripArray {
    vertices: Vec<Point3>,
    indices: Vec<u32>,
}

impl IndexedTriangleStripArray {
    /// Create an indexed triangle strip
    pub fn new(vertices: Vec<Point3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// All vertices
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Strip indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles encoded by the index strip
    pub fn triangle_count(&self) -> usize {
        self.indices.len().saturating_sub(2)
    }

    /// Vertices of triangle `i`
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        [
            self.vertices[self.indices[i] as usize],
            self.vertices[self.indices[i + 1] as usize],
            self.vertices[self.indices[i + 2] as usize],
        ]
    }
}

/// Point sprites, picked as screen-sized billboard quads
#[derive(Debug, Clone)]
pub struct PointArray {
    vertices: Vec<Point3>,
    point_size: f32,
}

impl PointArray {
    /// Create a point array with a screen-space point size in pixels
    pub fn new(vertices: Vec<Point3>, point_size: f32) -> Self {
        Self {
            vertices,
            point_size,
        }
    }

    /// All points
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Screen-space point size in pixels
    pub fn point_size(&self) -> f32 {
        self.point_size
    }
}

/// Line segments, picked as oriented boxes around each segment
#[derive(Debug, Clone)]
pub struct LineArray {
    vertices: Vec<Point3>,
    line_width: f32,
}

impl LineArray {
    /// Create a line array from vertex pairs; an unpaired trailing vertex
    /// is ignored
    pub fn new(vertices: Vec<Point3>, line_width: f32) -> Self {
        Self {
            vertices,
            line_width,
        }
    }

    /// All vertices, two per segment
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Screen-space line width in pixels
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Number of whole segments
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Endpoints of segment `i`
    pub fn segment(&self, i: usize) -> [Point3; 2] {
        [self.vertices[i * 2], self.vertices[i * 2 + 1]]
    }
}

/// Geometry attached to a scene leaf
#[derive(Debug, Clone)]
pub enum Geometry {
    /// Triangle soup
    Triangles(TriangleArray),
    /// Strip-encoded triangles
    TriangleStrip(TriangleStripArray),
    /// Indexed strip-encoded triangles
    IndexedTriangleStrip(IndexedTriangleStripArray),
    /// Point sprites
    Points(PointArray),
    /// Line segments
    Lines(LineArray),
}

impl Geometry {
    /// All vertices of the geometry, whatever the kind
    pub fn vertices(&self) -> &[Point3] {
        match self {
            Self::Triangles(g) => g.vertices(),
            Self::TriangleStrip(g) => g.vertices(),
            Self::IndexedTriangleStrip(g) => g.vertices(),
            Self::Points(g) => g.vertices(),
            Self::Lines(g) => g.vertices(),
        }
    }

    /// Local-space bounds of the geometry, or None when it has no vertices
    ///
    /// Point and line bounds are padded by half their screen-space size;
    /// the projected world size is view-dependent, so the pad is a
    /// conservative floor that keeps silhouette quads inside the volume.
    pub fn local_bounds(&self) -> Option<Bounds> {
        let aabb = Aabb::from_points(self.vertices())?;
        let aabb = match self {
            Self::Points(g) => aabb.expanded(g.point_size() * 0.5),
            Self::Lines(g) => aabb.expanded(g.line_width() * 0.5),
            _ => aabb,
        };
        Some(Bounds::Aabb(aabb))
    }
}
