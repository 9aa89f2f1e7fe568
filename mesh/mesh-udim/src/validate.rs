//! UDIM layout validation.
//!
//! Checks whether every polygon of a mesh already lies in a single tile,
//! without modifying anything.

use std::collections::BTreeMap;

use mesh_types::{ChannelId, Point2, PolyMesh};

use crate::classify::classify_polygon;
use crate::error::{UdimError, UdimResult};
use crate::tile::TileKey;

/// Report of a UDIM layout check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Total number of polygons.
    pub polygon_count: usize,
    /// Polygons touching more than one tile.
    pub straddling: Vec<u32>,
    /// Polygons whose UVs could not be classified.
    pub malformed: Vec<u32>,
    /// Polygons per tile, for polygons confined to one tile.
    pub polygons_per_tile: BTreeMap<TileKey, usize>,
}

impl LayoutReport {
    /// Check if every polygon lies in exactly one tile.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.straddling.is_empty() && self.malformed.is_empty()
    }

    /// Number of distinct tiles in use.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.polygons_per_tile.len()
    }
}

impl std::fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "UDIM Layout:")?;
        writeln!(f, "  Polygons: {}", self.polygon_count)?;
        writeln!(f, "  Tiles: {}", self.tile_count())?;
        for (tile, count) in &self.polygons_per_tile {
            writeln!(f, "    {tile}: {count}")?;
        }
        if !self.straddling.is_empty() {
            writeln!(f, "  Straddling polygons: {}", self.straddling.len())?;
        }
        if !self.malformed.is_empty() {
            writeln!(f, "  Malformed polygons: {}", self.malformed.len())?;
        }
        Ok(())
    }
}

/// Check how the polygons of `mesh` sit on the UDIM grid of `channel`.
///
/// Coordinates within `tolerance` of a grid line count as on the line.
///
/// # Errors
///
/// Returns [`UdimError::MissingChannel`] if the mesh has no such channel,
/// or [`UdimError::ChannelTopologyMismatch`] if its face list is not
/// parallel to the polygon list.
///
/// # Example
///
/// ```
/// use mesh_types::grid_plane;
/// use mesh_udim::validate_udim_layout;
///
/// // 4 x 1 grid of half-unit cells: every cell is inside a tile.
/// let mesh = grid_plane(4, 1, 0.5);
/// let report = validate_udim_layout(&mesh, 1, 0.001).unwrap();
/// assert!(report.is_valid());
/// assert_eq!(report.tile_count(), 2);
///
/// // Cells of 0.75 straddle U = 1 and U = 2.
/// let mesh = grid_plane(4, 1, 0.75);
/// let report = validate_udim_layout(&mesh, 1, 0.001).unwrap();
/// assert_eq!(report.straddling, vec![1, 2]);
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn validate_udim_layout(
    mesh: &PolyMesh,
    channel: ChannelId,
    tolerance: f64,
) -> UdimResult<LayoutReport> {
    let map = mesh
        .channel(channel)
        .ok_or(UdimError::MissingChannel { channel })?;
    if map.faces.len() != mesh.polygons.len() {
        return Err(UdimError::ChannelTopologyMismatch {
            channel,
            map_faces: map.faces.len(),
            polygons: mesh.polygons.len(),
        });
    }

    let mut report = LayoutReport {
        polygon_count: mesh.polygons.len(),
        ..Default::default()
    };

    for (index, polygon) in mesh.polygons.iter().enumerate() {
        let uvs: Option<Vec<Point2<f64>>> = map
            .face_uvws(index)
            .filter(|uvws| uvws.len() == polygon.corner_count())
            .map(|uvws| uvws.iter().map(|p| Point2::new(p.x, p.y)).collect());

        let class = uvs.and_then(|uvs| classify_polygon(&uvs, tolerance).ok());
        match class.as_ref().map(|c| (c.needs_slicing(), c.single_tile())) {
            Some((false, Some(tile))) => *report.polygons_per_tile.entry(tile).or_default() += 1,
            Some(_) => report.straddling.push(index as u32),
            None => report.malformed.push(index as u32),
        }
    }

    Ok(report)
}
