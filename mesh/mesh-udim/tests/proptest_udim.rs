//! Property-based tests for UDIM slicing.
//!
//! These tests use proptest to generate quads and triangles with random
//! UV placement and verify the slicing invariants.
//!
//! Run with: cargo test -p mesh-udim -- proptest

use mesh_types::{MapChannel, Point2, Point3, PolyMesh};
use mesh_udim::{TileKey, UdimSliceParams, classify_polygon, slice_by_udim};
use proptest::prelude::*;

const TOLERANCE: f64 = 0.001;

// =============================================================================
// Strategies for generating random UV polygons
// =============================================================================

/// Generate a UV coordinate around the origin, covering several tiles
/// including negative ones.
fn arb_uv() -> impl Strategy<Value = (f64, f64)> {
    (-3.0..3.0f64, -3.0..3.0f64)
}

/// Generate an axis-aligned quad with random placement and size.
fn arb_quad() -> impl Strategy<Value = Vec<(f64, f64)>> {
    (arb_uv(), 0.05..2.5f64, 0.05..2.5f64)
        .prop_map(|((u, v), w, h)| vec![(u, v), (u + w, v), (u + w, v + h), (u, v + h)])
}

/// Generate a triangle with random corners.
fn arb_triangle() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec(arb_uv(), 3)
}

/// Generate up to eight random quads and triangles.
fn arb_polygons() -> impl Strategy<Value = Vec<Vec<(f64, f64)>>> {
    prop::collection::vec(prop_oneof![arb_quad(), arb_triangle()], 1..8)
}

/// Generate a per-axis position scale, either far below the default weld
/// threshold or well above it.
fn arb_scale() -> impl Strategy<Value = f64> {
    prop_oneof![1e-5..1e-3f64, 0.5..20.0f64]
}

/// Build a mesh from UV polygons, with positions `(u * sx, v * sy, 0)`.
///
/// Polygon `i` is shifted by `10 * i` in U so that no two polygons overlap
/// in UV and cut points of different polygons never fall within the
/// threshold of each other.
#[allow(clippy::cast_precision_loss)]
fn build_mesh(polygons: &[Vec<(f64, f64)>], sx: f64, sy: f64) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let mut uv = MapChannel::new();
    for (i, polygon) in polygons.iter().enumerate() {
        let offset = 10.0 * i as f64;
        let corners: Vec<u32> = polygon
            .iter()
            .map(|&(u, v)| {
                let u = u + offset;
                uv.add_vert(Point3::new(u, v, 0.0));
                mesh.add_vertex(Point3::new(u * sx, v * sy, 0.0))
            })
            .collect();
        uv.faces.push(corners.clone());
        mesh.add_polygon(corners);
    }
    mesh.set_channel(1, uv);
    mesh
}

/// Generate a mesh whose positions equal its UVs.
fn arb_mesh() -> impl Strategy<Value = PolyMesh> {
    arb_polygons().prop_map(|polygons| build_mesh(&polygons, 1.0, 1.0))
}

/// Generate a mesh whose positions are scaled independently of its UVs.
fn arb_scaled_mesh() -> impl Strategy<Value = PolyMesh> {
    (arb_polygons(), arb_scale(), arb_scale())
        .prop_map(|(polygons, sx, sy)| build_mesh(&polygons, sx, sy))
}

/// Check that a polygon's UVs fit in the closed square of one tile.
///
/// A polygon hugging a grid line may have its centroid just across it, so
/// the tiles around the centroid are tried too.
fn confined(mesh: &PolyMesh, polygon: usize) -> bool {
    let Some(uvws) = mesh.channel(1).and_then(|uv| uv.face_uvws(polygon)) else {
        return false;
    };
    let n = uvws.len() as f64;
    let cu = uvws.iter().map(|p| p.x).sum::<f64>() / n;
    let cv = uvws.iter().map(|p| p.y).sum::<f64>() / n;
    let center = TileKey::from_uv(cu, cv);

    (-1..=1).any(|du| {
        (-1..=1).any(|dv| {
            let tile = TileKey::new(center.u + du, center.v + dv);
            uvws.iter().all(|p| tile.contains(p.x, p.y, TOLERANCE))
        })
    })
}

// =============================================================================
// Property Tests: Classification
// =============================================================================

proptest! {
    /// Classification never panics and reports at least one tile.
    #[test]
    fn classify_reports_tiles(polygon in prop_oneof![arb_quad(), arb_triangle()]) {
        let uvs: Vec<_> = polygon.iter().map(|&(u, v)| Point2::new(u, v)).collect();
        let class = classify_polygon(&uvs, TOLERANCE).unwrap();
        prop_assert!(!class.tiles.is_empty());
        prop_assert_eq!(class.needs_slicing(), class.single_tile().is_none());
    }
}

// =============================================================================
// Property Tests: Slicing
// =============================================================================

proptest! {
    /// Every output polygon lies in one tile.
    #[test]
    fn output_is_confined_to_tiles(mesh in arb_mesh()) {
        let output = slice_by_udim(mesh, &UdimSliceParams::default()).unwrap();
        for polygon in 0..output.mesh.polygons.len() {
            prop_assert!(confined(&output.mesh, polygon), "polygon {} straddles a tile", polygon);
        }
        prop_assert_eq!(output.face_origin.len(), output.mesh.polygons.len());
    }

    /// Slicing without cleanup keeps the total surface area.
    #[test]
    fn slicing_preserves_area(mesh in arb_mesh()) {
        let before = mesh.surface_area();
        let output = slice_by_udim(mesh, &UdimSliceParams::slice_only()).unwrap();
        let after = output.mesh.surface_area();
        prop_assert!(
            (after - before).abs() <= 1e-9 * before.max(1.0),
            "area {} became {}",
            before,
            after
        );
    }

    /// A second pass over sliced output slices nothing.
    #[test]
    fn slicing_is_idempotent(mesh in arb_mesh()) {
        let params = UdimSliceParams::default();
        let first = slice_by_udim(mesh, &params).unwrap();
        let second = slice_by_udim(first.mesh.clone(), &params).unwrap();

        prop_assert_eq!(second.stats.polygons_sliced, 0);
        prop_assert_eq!(second.mesh.polygons.len(), first.mesh.polygons.len());
        prop_assert_eq!(second.mesh.vertices.len(), first.mesh.vertices.len());
    }

    /// All corner indices are valid after slicing and cleanup.
    #[test]
    fn output_indices_are_valid(mesh in arb_mesh()) {
        let output = slice_by_udim(mesh, &UdimSliceParams::default()).unwrap();
        let vertex_count = output.mesh.vertices.len() as u32;
        let uv = output.mesh.channel(1).unwrap();
        let map_count = uv.verts.len() as u32;

        prop_assert_eq!(uv.faces.len(), output.mesh.polygons.len());
        for (polygon, face) in output.mesh.polygons.iter().zip(&uv.faces) {
            prop_assert_eq!(polygon.corner_count(), face.len());
            prop_assert!(polygon.vertices.iter().all(|&v| v < vertex_count));
            prop_assert!(face.iter().all(|&m| m < map_count));
        }
    }
}

// =============================================================================
// Property Tests: Positions independent of UVs
// =============================================================================

proptest! {
    /// Without welding, no output polygon repeats a vertex, however small
    /// the geometry is next to its UVs.
    #[test]
    fn scaled_output_has_no_repeated_vertices(mesh in arb_scaled_mesh()) {
        let output = slice_by_udim(mesh, &UdimSliceParams::slice_only()).unwrap();
        for (index, polygon) in output.mesh.polygons.iter().enumerate() {
            prop_assert_eq!(
                polygon.distinct_vertex_count(),
                polygon.corner_count(),
                "polygon {} repeats a vertex: {:?}",
                index,
                &polygon.vertices
            );
        }
    }

    /// Scaled positions do not change which tile a piece lands in.
    #[test]
    fn scaled_output_is_confined_to_tiles(mesh in arb_scaled_mesh()) {
        let output = slice_by_udim(mesh, &UdimSliceParams::slice_only()).unwrap();
        for polygon in 0..output.mesh.polygons.len() {
            prop_assert!(confined(&output.mesh, polygon), "polygon {} straddles a tile", polygon);
        }
    }

    /// Slicing keeps the 3D surface area when positions are scaled.
    #[test]
    fn scaled_slicing_preserves_area(mesh in arb_scaled_mesh()) {
        let before = mesh.surface_area();
        let output = slice_by_udim(mesh, &UdimSliceParams::slice_only()).unwrap();
        let after = output.mesh.surface_area();
        prop_assert!(
            (after - before).abs() <= 1e-9 * before.max(1e-12),
            "area {} became {}",
            before,
            after
        );
    }
}
