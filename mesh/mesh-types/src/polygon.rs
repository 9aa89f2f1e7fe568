//! Polygons and planar polygon geometry.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A polygon referencing mesh vertices by index.
///
/// Corners are stored in boundary order. Winding is counter-clockwise
/// when viewed from the front, so the Newell normal points toward the
/// viewer.
///
/// # Example
///
/// ```
/// use mesh_types::Polygon;
///
/// let quad = Polygon::new(vec![0, 1, 2, 3]);
/// assert_eq!(quad.corner_count(), 4);
/// assert_eq!(quad.material, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    /// Vertex indices, one per corner.
    pub vertices: Vec<u32>,

    /// Material identifier.
    pub material: u16,

    /// Smoothing group bit mask.
    pub smoothing_group: u32,
}

impl Polygon {
    /// Create a polygon with default material and no smoothing groups.
    #[inline]
    #[must_use]
    pub const fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            material: 0,
            smoothing_group: 0,
        }
    }

    /// Create a polygon that inherits the face attributes of `self` but
    /// uses different corners.
    #[inline]
    #[must_use]
    pub fn with_corners(&self, vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            material: self.material,
            smoothing_group: self.smoothing_group,
        }
    }

    /// Number of corners.
    #[inline]
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct vertices referenced by the corners.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Polygon;
    ///
    /// let poly = Polygon::new(vec![0, 1, 0, 2]);
    /// assert_eq!(poly.distinct_vertex_count(), 3);
    /// ```
    #[must_use]
    pub fn distinct_vertex_count(&self) -> usize {
        let mut sorted = self.vertices.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len()
    }

    /// Iterate over the boundary edges as `(from, to)` vertex index pairs.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// Unnormalized polygon normal by Newell's method.
///
/// The length of the returned vector is twice the polygon's area, which
/// makes this robust for non-convex and slightly non-planar polygons.
#[must_use]
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Area of a planar polygon given its corner positions.
///
/// Returns `0.0` for fewer than three points.
///
/// # Example
///
/// ```
/// use mesh_types::{polygon_area, Point3};
///
/// let square = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(2.0, 2.0, 0.0),
///     Point3::new(0.0, 2.0, 0.0),
/// ];
/// assert!((polygon_area(&square) - 4.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    newell_normal(points).norm() * 0.5
}
