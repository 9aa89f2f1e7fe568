//! Indexed polygon mesh with map channels.

use std::collections::BTreeMap;

use crate::{Aabb, ChannelId, MapChannel, MeshBounds, MeshTopology, Polygon, Vertex, polygon_area};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed polygon mesh.
///
/// Polygons may have any number of corners. Texture coordinates live in
/// map channels keyed by [`ChannelId`]; every channel carries one map face
/// per polygon, stored at the polygon's index.
///
/// # Example
///
/// ```
/// use mesh_types::{PolyMesh, MeshTopology, Point3};
///
/// let mut mesh = PolyMesh::new();
/// let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
/// let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
/// let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
/// mesh.add_polygon(vec![a, b, c, d]);
///
/// assert_eq!(mesh.polygon_count(), 1);
/// assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Polygons as indices into the vertex array.
    pub polygons: Vec<Polygon>,

    /// Map channels by id.
    pub channels: BTreeMap<ChannelId, MapChannel>,
}

impl PolyMesh {
    /// Create an empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            polygons: Vec::new(),
            channels: BTreeMap::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, polygon_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            polygons: Vec::with_capacity(polygon_count),
            channels: BTreeMap::new(),
        }
    }

    /// Create a mesh from vertices and polygons, without map channels.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, polygons: Vec<Polygon>) -> Self {
        Self {
            vertices,
            polygons,
            channels: BTreeMap::new(),
        }
    }

    /// Append a vertex and return its index.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, vertex counts above 4B are unsupported
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        self.vertices.push(Vertex::new(position));
        (self.vertices.len() - 1) as u32
    }

    /// Append a polygon with default face attributes and return its index.
    ///
    /// Map channels are not touched; callers adding polygons to a mesh
    /// with channels must push the matching map faces themselves.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_polygon(&mut self, vertices: Vec<u32>) -> u32 {
        self.polygons.push(Polygon::new(vertices));
        (self.polygons.len() - 1) as u32
    }

    /// Get a map channel.
    #[inline]
    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<&MapChannel> {
        self.channels.get(&id)
    }

    /// Get a map channel mutably.
    #[inline]
    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut MapChannel> {
        self.channels.get_mut(&id)
    }

    /// Insert or replace a map channel, returning the previous one.
    pub fn set_channel(&mut self, id: ChannelId, channel: MapChannel) -> Option<MapChannel> {
        self.channels.insert(id, channel)
    }

    /// Check whether a map channel exists.
    #[inline]
    #[must_use]
    pub fn has_channel(&self, id: ChannelId) -> bool {
        self.channels.contains_key(&id)
    }

    /// Area of a polygon, or `0.0` if it does not resolve.
    #[must_use]
    pub fn polygon_area(&self, index: usize) -> f64 {
        self.polygon_positions(index)
            .map_or(0.0, |points| polygon_area(&points))
    }

    /// Total surface area of all polygons.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        (0..self.polygons.len()).map(|i| self.polygon_area(i)).sum()
    }

    /// Keep only polygons whose entry in `keep` is `true`.
    ///
    /// The matching map face is dropped from every channel so channels
    /// stay parallel to the polygon list. Entries missing from `keep`
    /// count as `true`. Returns the number of polygons removed.
    pub fn retain_polygons(&mut self, keep: &[bool]) -> usize {
        let original_count = self.polygons.len();
        let keeps = |i: usize| keep.get(i).copied().unwrap_or(true);

        let mut idx = 0;
        self.polygons.retain(|_| {
            let k = keeps(idx);
            idx += 1;
            k
        });

        for channel in self.channels.values_mut() {
            let mut idx = 0;
            channel.faces.retain(|_| {
                let k = keeps(idx);
                idx += 1;
                k
            });
        }

        original_count - self.polygons.len()
    }

    /// Mark which vertices are referenced by at least one polygon.
    #[must_use]
    pub fn referenced_vertices(&self) -> Vec<bool> {
        let mut referenced = vec![false; self.vertices.len()];
        for polygon in &self.polygons {
            for &v in &polygon.vertices {
                if let Some(slot) = referenced.get_mut(v as usize) {
                    *slot = true;
                }
            }
        }
        referenced
    }
}

impl MeshTopology for PolyMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    fn polygon(&self, index: usize) -> Option<&Polygon> {
        self.polygons.get(index)
    }

    fn polygon_positions(&self, index: usize) -> Option<Vec<Point3<f64>>> {
        self.polygons
            .get(index)?
            .vertices
            .iter()
            .map(|&v| self.vertices.get(v as usize).map(|vertex| vertex.position))
            .collect()
    }

    fn corner_count(&self) -> usize {
        self.polygons.iter().map(Polygon::corner_count).sum()
    }
}

impl MeshBounds for PolyMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

/// Build a planar grid of quads in the XY plane with a planar UV map.
///
/// The grid has `cols x rows` quads of side `cell_size`, starting at the
/// origin. Channel `1` maps each vertex to `(x, y, 0)`, so UV space
/// coincides with the XY plane and a `cell_size` that does not divide 1
/// produces quads crossing UDIM tile boundaries.
///
/// # Example
///
/// ```
/// use mesh_types::{grid_plane, MeshTopology};
///
/// let grid = grid_plane(3, 2, 0.5);
/// assert_eq!(grid.polygon_count(), 6);
/// assert_eq!(grid.vertex_count(), 12);
/// assert!(grid.has_channel(1));
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn grid_plane(cols: usize, rows: usize, cell_size: f64) -> PolyMesh {
    let stride = cols + 1;
    let mut mesh = PolyMesh::with_capacity(stride * (rows + 1), cols * rows);
    let mut uv = MapChannel::with_capacity(stride * (rows + 1), cols * rows);

    for j in 0..=rows {
        for i in 0..=cols {
            let p = Point3::new(i as f64 * cell_size, j as f64 * cell_size, 0.0);
            mesh.add_vertex(p);
            uv.add_vert(p);
        }
    }

    for j in 0..rows {
        for i in 0..cols {
            let a = (j * stride + i) as u32;
            let b = a + 1;
            let c = b + stride as u32;
            let d = a + stride as u32;
            mesh.add_polygon(vec![a, b, c, d]);
            uv.faces.push(vec![a, b, c, d]);
        }
    }

    mesh.set_channel(1, uv);
    mesh
}
