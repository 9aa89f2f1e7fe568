//! Slicing polygon meshes along UDIM tile boundaries.
//!
//! UDIM lays texture tiles out as unit squares in UV space: tile
//! `(u, v)` covers `[u, u+1] x [v, v+1]` and is numbered
//! `1001 + u + 10 * v`. A polygon whose UVs cross an integer grid line
//! samples two textures at once. This crate cuts every such polygon into
//! pieces that each stay inside one tile.
//!
//! # Features
//!
//! - **Edge-walking classification**: finds every tile a polygon touches,
//!   including thin crossings like `U = 0.99 -> 1.01`
//! - **Half-plane slicing**: convex polygons are cut directly; concave
//!   ones are ear clipped first
//! - **Full interpolation**: positions and every map channel are
//!   interpolated at each cut, with the crossed axis pinned to the
//!   integer
//! - **Stable topology**: untouched vertices, map vertices and polygons
//!   keep their indices; cut points are shared between neighbors
//! - **Cleanup**: optional vertex weld and degenerate polygon removal
//! - **Diagnostics**: malformed polygons are skipped with a warning
//!   instead of failing the whole pass
//!
//! # Example
//!
//! ```
//! use mesh_types::{MapChannel, PolyMesh, Point3};
//! use mesh_udim::{slice_by_udim, TileKey, UdimSliceParams};
//!
//! // A quad spanning tiles 1001 and 1002.
//! let mut mesh = PolyMesh::new();
//! let mut uv = MapChannel::new();
//! for (u, v) in [(0.5, 0.2), (1.5, 0.2), (1.5, 0.8), (0.5, 0.8)] {
//!     mesh.add_vertex(Point3::new(u, v, 0.0));
//!     uv.add_vert(Point3::new(u, v, 0.0));
//! }
//! mesh.add_polygon(vec![0, 1, 2, 3]);
//! uv.faces.push(vec![0, 1, 2, 3]);
//! mesh.set_channel(1, uv);
//!
//! let output = slice_by_udim(mesh, &UdimSliceParams::default()).unwrap();
//! assert_eq!(output.mesh.polygons.len(), 2);
//! assert_eq!(output.stats.polygons_per_tile.get(&TileKey::new(1, 0)), Some(&1));
//! println!("{output}");
//! ```
//!
//! # Algorithm
//!
//! 1. Validate parameters and the map channel layout
//! 2. Optionally zero W on the sliced channel
//! 3. Plan each polygon: classify it against the grid and, if it touches
//!    more than one tile, cut it along each interior U line and then each
//!    interior V line
//! 4. Commit plans in polygon order, creating each cut vertex once
//! 5. Optionally weld vertices and remove degenerate polygons

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod classify;
mod cleanup;
mod error;
mod params;
mod pipeline;
mod rebuild;
mod result;
mod slicer;
mod spatial;
mod tile;
mod validate;
mod warning;

// Re-export main types and functions
pub use classify::{Classification, MAX_TILE_SPAN, TileSpan, classify_polygon};
pub use cleanup::{
    remove_degenerate_polygons, remove_unreferenced_map_vertices, remove_unreferenced_vertices,
    weld_vertices,
};
pub use error::{UdimError, UdimResult};
pub use params::{
    MAX_MAP_CHANNEL, MAX_WELD_THRESHOLD, MIN_MAP_CHANNEL, MIN_WELD_THRESHOLD, UdimSliceParams,
};
pub use pipeline::{PARALLEL_THRESHOLD, slice_by_udim};
pub use result::{SliceStats, UdimSliceOutput};
pub use tile::{TileKey, UDIM_BASE, UDIM_ROW_WIDTH};
pub use validate::{LayoutReport, validate_udim_layout};
pub use warning::{Axis, MalformedReason, SliceWarning, WarningKind};
