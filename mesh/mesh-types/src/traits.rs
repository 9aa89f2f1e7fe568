//! Traits for mesh types.

use crate::{Aabb, Polygon, Vertex};
use nalgebra::Point3;

/// Minimal read access to polygon mesh topology.
pub trait MeshTopology {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of polygons.
    fn polygon_count(&self) -> usize;

    /// Check if the mesh is empty.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.polygon_count() == 0
    }

    /// Get a vertex by index.
    fn vertex(&self, index: usize) -> Option<&Vertex>;

    /// Get a polygon by index.
    fn polygon(&self, index: usize) -> Option<&Polygon>;

    /// Resolved corner positions of a polygon.
    ///
    /// Returns `None` if the polygon does not exist or references a
    /// vertex that does not exist.
    fn polygon_positions(&self, index: usize) -> Option<Vec<Point3<f64>>>;

    /// Total number of polygon corners.
    fn corner_count(&self) -> usize;
}

/// Types that can compute a bounding box.
pub trait MeshBounds {
    /// Axis-aligned bounding box. Empty if there are no vertices.
    fn bounds(&self) -> Aabb;

    /// Bounding box, or `None` if empty.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }
}
