//! The slicing pipeline.

use mesh_types::{MapChannel, PolyMesh};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cleanup::{
    remove_degenerate_polygons_masked, remove_unreferenced_map_vertices,
    remove_unreferenced_vertices, weld_vertices_masked,
};
use crate::error::{UdimError, UdimResult};
use crate::params::UdimSliceParams;
use crate::rebuild::{ChannelLayout, Rebuilder, SlicePlan, plan_polygon};
use crate::result::{SliceStats, UdimSliceOutput};
use crate::validate::validate_udim_layout;
use crate::warning::SliceWarning;

/// Polygon count above which planning runs on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 256;

/// Slice every polygon of `mesh` along the UDIM tile boundaries of a map
/// channel.
///
/// Polygons that touch more than one tile are replaced by pieces that
/// each lie in one tile; everything else is carried over. New vertices
/// are placed where polygon edges cross integer U or V lines, with
/// positions and all map channels interpolated. Afterwards the mesh is
/// optionally welded and cleaned of degenerate polygons.
///
/// # Arguments
///
/// * `mesh` - The mesh to slice. It is consumed; the result holds the new mesh.
/// * `params` - Slicing parameters
///
/// # Errors
///
/// Returns [`UdimError::InvalidChannel`] or
/// [`UdimError::InvalidWeldThreshold`] for out-of-range parameters,
/// [`UdimError::MissingChannel`] if the mesh lacks the map channel, and
/// [`UdimError::ChannelTopologyMismatch`] if any channel's face list is
/// not parallel to the polygon list. Problems with single polygons are
/// reported as warnings instead.
///
/// # Example
///
/// ```
/// use mesh_types::grid_plane;
/// use mesh_udim::{slice_by_udim, UdimSliceParams};
///
/// // Two 0.75-unit cells: the second straddles U = 1.
/// let mesh = grid_plane(2, 1, 0.75);
/// let output = slice_by_udim(mesh, &UdimSliceParams::default()).unwrap();
///
/// assert_eq!(output.mesh.polygons.len(), 3);
/// assert_eq!(output.face_origin, vec![0, 1, 1]);
/// assert_eq!(output.stats.polygons_sliced, 1);
/// println!("{output}");
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn slice_by_udim(mut mesh: PolyMesh, params: &UdimSliceParams) -> UdimResult<UdimSliceOutput> {
    params.validate()?;

    let channel = params.map_channel;
    let layout =
        ChannelLayout::new(&mesh, channel).ok_or(UdimError::MissingChannel { channel })?;
    for (&id, map) in &mesh.channels {
        if map.faces.len() != mesh.polygons.len() {
            return Err(UdimError::ChannelTopologyMismatch {
                channel: id,
                map_faces: map.faces.len(),
                polygons: mesh.polygons.len(),
            });
        }
    }

    let polygons_examined = mesh.polygons.len();
    let tolerance = params.weld_threshold;

    info!(
        polygons = polygons_examined,
        vertices = mesh.vertices.len(),
        channel,
        "Starting UDIM slice"
    );

    if params.flatten_w {
        if let Some(map) = mesh.channel_mut(channel) {
            map.flatten_w();
        }
    }

    let extent = mesh.channel(channel).map(MapChannel::bounds).unwrap_or_default();
    if !extent.is_empty() {
        debug!(
            u_min = extent.min.x,
            u_max = extent.max.x,
            v_min = extent.min.y,
            v_max = extent.max.y,
            "UV extent"
        );
    }

    let plans = plan_polygons(&mesh, &layout, tolerance, params.parallel);

    let mut warnings = Vec::new();
    for (index, plan) in plans.iter().enumerate() {
        for kind in plan.warnings() {
            let warning = SliceWarning::new(index as u32, kind);
            warn!(polygon = index, "{warning}");
            warnings.push(warning);
        }
    }

    let mut rebuilder = Rebuilder::new(mesh, layout, tolerance);
    for (index, plan) in plans.into_iter().enumerate() {
        rebuilder.commit(index, plan);
    }
    let (mut mesh, mut face_origin, counts) = rebuilder.finish();

    debug!(
        sliced = counts.sliced,
        pieces = counts.pieces,
        created = counts.vertices_created,
        "Committed slices"
    );

    let mut stats = SliceStats {
        polygons_examined,
        polygons_sliced: counts.sliced,
        polygons_skipped: counts.skipped + counts.dropped,
        pieces_emitted: counts.pieces,
        vertices_created: counts.vertices_created,
        ..Default::default()
    };

    if params.vertex_weld {
        let removal = weld_vertices_masked(&mut mesh, tolerance);
        stats.vertices_welded = removal.count;
        stats.polygons_removed += retain_by_mask(&mut face_origin, &removal.keep);
    }

    if params.remove_errors {
        let removal = remove_degenerate_polygons_masked(&mut mesh, params.degenerate_area());
        stats.polygons_removed += retain_by_mask(&mut face_origin, &removal.keep);
        stats.vertices_removed = remove_unreferenced_vertices(&mut mesh);
        let map_vertices = remove_unreferenced_map_vertices(&mut mesh);
        debug!(
            polygons = removal.count,
            vertices = stats.vertices_removed,
            map_vertices,
            "Removed errors"
        );
    }

    stats.polygons_per_tile = validate_udim_layout(&mesh, channel, tolerance)?.polygons_per_tile;

    info!(
        polygons = mesh.polygons.len(),
        sliced = stats.polygons_sliced,
        pieces = stats.pieces_emitted,
        warnings = warnings.len(),
        "UDIM slice complete"
    );

    Ok(UdimSliceOutput {
        mesh,
        warnings,
        stats,
        face_origin,
    })
}

/// Plan every polygon, in parallel for large meshes. Plans come back in
/// polygon order either way.
fn plan_polygons(
    mesh: &PolyMesh,
    layout: &ChannelLayout,
    tolerance: f64,
    parallel: bool,
) -> Vec<SlicePlan> {
    let count = mesh.polygons.len();
    if parallel && count > PARALLEL_THRESHOLD {
        (0..count)
            .into_par_iter()
            .map(|i| plan_polygon(mesh, layout, i, tolerance))
            .collect()
    } else {
        (0..count)
            .map(|i| plan_polygon(mesh, layout, i, tolerance))
            .collect()
    }
}

/// Keep the entries of `items` whose `keep` flag is set. Returns the
/// number removed.
fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) -> usize {
    let before = items.len();
    let mut idx = 0;
    items.retain(|_| {
        let k = keep.get(idx).copied().unwrap_or(true);
        idx += 1;
        k
    });
    before - items.len()
}
