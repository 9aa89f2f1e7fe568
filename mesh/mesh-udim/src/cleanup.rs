//! Post-slice cleanup: vertex welding and error removal.
//!
//! The public functions work on any [`PolyMesh`]. The pipeline uses the
//! crate-private `*_masked` variants, which also report which polygons
//! survived so per-polygon bookkeeping can be kept in step.

use hashbrown::HashMap;
use mesh_types::PolyMesh;
use tracing::debug;

use crate::spatial::{neighborhood, pos_to_cell};

/// Outcome of a cleanup step that may remove polygons.
#[derive(Debug, Clone, Default)]
pub(crate) struct Removal {
    /// Items merged or removed by the step.
    pub count: usize,
    /// One entry per polygon before the step; `false` if it was removed.
    pub keep: Vec<bool>,
}

/// Weld vertices that are within `epsilon` of each other.
///
/// Polygon corners are remapped to the surviving vertex, runs of
/// consecutive identical corners collapse to one (the matching map
/// corners are dropped on every channel), polygons left with fewer than
/// three corners are removed, and merged vertices are compacted away.
///
/// Returns the number of vertices merged.
///
/// # Example
///
/// ```
/// use mesh_types::{PolyMesh, Point3};
/// use mesh_udim::weld_vertices;
///
/// let mut mesh = PolyMesh::new();
/// mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
/// mesh.add_vertex(Point3::new(1.0005, 0.0, 0.0)); // Near-duplicate of vertex 1
/// mesh.add_polygon(vec![0, 1, 2]);
/// mesh.add_polygon(vec![3, 2, 1]);
///
/// assert_eq!(weld_vertices(&mut mesh, 0.001), 1);
/// assert_eq!(mesh.vertices.len(), 3);
/// assert_eq!(mesh.polygons.len(), 1);
/// ```
pub fn weld_vertices(mesh: &mut PolyMesh, epsilon: f64) -> usize {
    weld_vertices_masked(mesh, epsilon).count
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn weld_vertices_masked(mesh: &mut PolyMesh, epsilon: f64) -> Removal {
    let original_count = mesh.vertices.len();
    let mut removal = Removal {
        count: 0,
        keep: vec![true; mesh.polygons.len()],
    };
    if original_count == 0 || epsilon.is_nan() || epsilon <= 0.0 {
        return removal;
    }

    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let cell = pos_to_cell(&vertex.position, epsilon);
        spatial_hash.entry(cell).or_default().push(idx as u32);
    }

    let mut vertex_remap: Vec<u32> = (0..original_count as u32).collect();
    let mut merged_count = 0;

    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if vertex_remap[idx as usize] != idx {
            continue;
        }

        let cell = pos_to_cell(&vertex.position, epsilon);
        for neighbor_cell in neighborhood(cell) {
            let Some(candidates) = spatial_hash.get(&neighbor_cell) else {
                continue;
            };
            for &other_idx in candidates {
                if other_idx <= idx || vertex_remap[other_idx as usize] != other_idx {
                    continue;
                }

                let other_pos = &mesh.vertices[other_idx as usize].position;
                if (vertex.position - other_pos).norm() <= epsilon {
                    vertex_remap[other_idx as usize] = idx;
                    merged_count += 1;
                }
            }
        }
    }

    if merged_count == 0 {
        return removal;
    }

    // Resolve transitive merges
    for i in 0..vertex_remap.len() {
        let mut target = vertex_remap[i];
        while vertex_remap[target as usize] != target {
            target = vertex_remap[target as usize];
        }
        vertex_remap[i] = target;
    }

    for (index, polygon) in mesh.polygons.iter_mut().enumerate() {
        for v in &mut polygon.vertices {
            if let Some(&target) = vertex_remap.get(*v as usize) {
                *v = target;
            }
        }

        let kept = collapse_repeated_corners(&polygon.vertices);
        if kept.len() != polygon.vertices.len() {
            polygon.vertices = kept.iter().map(|&c| polygon.vertices[c]).collect();
            for channel in mesh.channels.values_mut() {
                if let Some(face) = channel.faces.get_mut(index) {
                    *face = kept.iter().filter_map(|&c| face.get(c).copied()).collect();
                }
            }
        }
        removal.keep[index] = polygon.vertices.len() >= 3;
    }

    mesh.retain_polygons(&removal.keep);

    // Compact merged vertices away
    let mut new_index = vec![u32::MAX; original_count];
    let mut kept_vertices = Vec::with_capacity(original_count - merged_count);
    for (old, vertex) in mesh.vertices.iter().enumerate() {
        if vertex_remap[old] as usize == old {
            new_index[old] = kept_vertices.len() as u32;
            kept_vertices.push(*vertex);
        }
    }
    for polygon in &mut mesh.polygons {
        for v in &mut polygon.vertices {
            if let Some(&n) = new_index.get(*v as usize) {
                *v = n;
            }
        }
    }
    mesh.vertices = kept_vertices;

    debug!(
        merged = merged_count,
        vertices = mesh.vertices.len(),
        "Welded vertices"
    );

    removal.count = merged_count;
    removal
}

/// Corner positions to keep after collapsing cyclic runs of equal
/// vertex indices.
fn collapse_repeated_corners(vertices: &[u32]) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(vertices.len());
    for (c, &v) in vertices.iter().enumerate() {
        if kept.last().is_none_or(|&last| vertices[last] != v) {
            kept.push(c);
        }
    }
    while kept.len() > 1 && kept.first().map(|&c| vertices[c]) == kept.last().map(|&c| vertices[c])
    {
        kept.pop();
    }
    kept
}

/// Remove polygons with fewer than three distinct vertices or with area
/// below `min_area`.
///
/// Returns the number of polygons removed.
///
/// # Example
///
/// ```
/// use mesh_types::{PolyMesh, Point3};
/// use mesh_udim::remove_degenerate_polygons;
///
/// let mut mesh = PolyMesh::new();
/// mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
/// mesh.add_vertex(Point3::new(2.0, 0.0, 0.0));
/// mesh.add_polygon(vec![0, 1, 2]);
/// mesh.add_polygon(vec![0, 1, 3]); // Collinear
///
/// assert_eq!(remove_degenerate_polygons(&mut mesh, 1e-6), 1);
/// assert_eq!(mesh.polygons.len(), 1);
/// ```
pub fn remove_degenerate_polygons(mesh: &mut PolyMesh, min_area: f64) -> usize {
    remove_degenerate_polygons_masked(mesh, min_area).count
}

pub(crate) fn remove_degenerate_polygons_masked(mesh: &mut PolyMesh, min_area: f64) -> Removal {
    let keep: Vec<bool> = mesh
        .polygons
        .iter()
        .enumerate()
        .map(|(i, polygon)| {
            polygon.distinct_vertex_count() >= 3 && mesh.polygon_area(i) >= min_area
        })
        .collect();

    let count = mesh.retain_polygons(&keep);
    if count > 0 {
        debug!(removed = count, min_area, "Removed degenerate polygons");
    }
    Removal { count, keep }
}

/// Remove vertices not referenced by any polygon and compact the vertex
/// array.
///
/// Returns the number of vertices removed.
#[allow(clippy::cast_possible_truncation)]
pub fn remove_unreferenced_vertices(mesh: &mut PolyMesh) -> usize {
    let referenced = mesh.referenced_vertices();
    let original_count = mesh.vertices.len();

    let mut new_index = vec![u32::MAX; original_count];
    let mut kept = Vec::with_capacity(original_count);
    for (old, vertex) in mesh.vertices.iter().enumerate() {
        if referenced[old] {
            new_index[old] = kept.len() as u32;
            kept.push(*vertex);
        }
    }

    if kept.len() == original_count {
        return 0;
    }

    for polygon in &mut mesh.polygons {
        for v in &mut polygon.vertices {
            if let Some(&n) = new_index.get(*v as usize) {
                *v = n;
            }
        }
    }

    mesh.vertices = kept;
    original_count - mesh.vertices.len()
}

/// Remove map vertices no longer referenced by a map face, on every
/// channel.
///
/// Returns the total number of map vertices removed.
pub fn remove_unreferenced_map_vertices(mesh: &mut PolyMesh) -> usize {
    mesh.channels
        .values_mut()
        .map(mesh_types::MapChannel::remove_unreferenced)
        .sum()
}
