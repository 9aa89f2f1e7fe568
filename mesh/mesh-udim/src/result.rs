//! Slicing results and statistics.

use std::collections::BTreeMap;

use mesh_types::PolyMesh;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tile::TileKey;
use crate::warning::SliceWarning;

/// Counters for one slicing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceStats {
    /// Polygons in the input mesh.
    pub polygons_examined: usize,

    /// Input polygons replaced by pieces.
    pub polygons_sliced: usize,

    /// Malformed input polygons passed through or dropped.
    pub polygons_skipped: usize,

    /// Pieces emitted for sliced polygons.
    pub pieces_emitted: usize,

    /// Geometric vertices created at cut points.
    pub vertices_created: usize,

    /// Vertices merged by the weld step.
    pub vertices_welded: usize,

    /// Polygons removed by cleanup.
    pub polygons_removed: usize,

    /// Vertices removed by cleanup.
    pub vertices_removed: usize,

    /// Output polygons per tile.
    pub polygons_per_tile: BTreeMap<TileKey, usize>,
}

impl SliceStats {
    /// Number of distinct tiles holding output polygons.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.polygons_per_tile.len()
    }
}

/// Result of [`slice_by_udim`](crate::slice_by_udim).
#[derive(Debug, Clone)]
pub struct UdimSliceOutput {
    /// The sliced mesh.
    pub mesh: PolyMesh,

    /// Per-polygon problems, in input polygon order.
    pub warnings: Vec<SliceWarning>,

    /// Counters for the pass.
    pub stats: SliceStats,

    /// For every output polygon, the index of the input polygon it came
    /// from.
    pub face_origin: Vec<u32>,
}

impl UdimSliceOutput {
    /// Check if any polygon was sliced.
    #[must_use]
    pub const fn was_sliced(&self) -> bool {
        self.stats.polygons_sliced > 0
    }
}

impl std::fmt::Display for UdimSliceOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "UDIM slice: {} → {} polygons ({} sliced into {} pieces, {} tiles, {} warnings)",
            self.stats.polygons_examined,
            self.mesh.polygons.len(),
            self.stats.polygons_sliced,
            self.stats.pieces_emitted,
            self.stats.tile_count(),
            self.warnings.len()
        )
    }
}
