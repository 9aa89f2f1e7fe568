//! Planning and committing slices into a new mesh.
//!
//! Planning reads the input mesh only and can run per polygon on any
//! thread. Committing is serial: it owns the vertex and map vertex
//! dedup tables, so vertex numbering depends only on polygon order.

use hashbrown::HashMap;
use mesh_types::{ChannelId, MapChannel, Point2, Point3, PolyMesh, Polygon, Vertex};
use smallvec::SmallVec;

use crate::classify::classify_polygon;
use crate::slicer::{Corner, SourceCorner, slice_polygon};
use crate::spatial::PointTable;
use crate::warning::{MalformedReason, WarningKind};

/// Channel ordering shared by planning and committing.
#[derive(Debug, Clone)]
pub(crate) struct ChannelLayout {
    /// All channel ids in ascending order.
    pub ids: Vec<ChannelId>,
    /// Position of the sliced channel in `ids`.
    pub sliced: usize,
}

impl ChannelLayout {
    /// Layout for `mesh` slicing `channel`, if the mesh carries it.
    pub(crate) fn new(mesh: &PolyMesh, channel: ChannelId) -> Option<Self> {
        let ids: Vec<ChannelId> = mesh.channels.keys().copied().collect();
        let sliced = ids.iter().position(|&id| id == channel)?;
        Some(Self { ids, sliced })
    }

    /// Index into [`Corner::extras`] for channel slot `slot`.
    fn extra_index(&self, slot: usize) -> Option<usize> {
        match slot.cmp(&self.sliced) {
            std::cmp::Ordering::Less => Some(slot),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(slot - 1),
        }
    }
}

/// What happens to one input polygon.
#[derive(Debug)]
pub(crate) enum SlicePlan {
    /// Lies in one tile; copied unchanged.
    Unchanged,
    /// Replaced by pieces.
    Sliced {
        pieces: Vec<Vec<Corner>>,
        warnings: Vec<WarningKind>,
    },
    /// Malformed; copied unchanged.
    Skipped(MalformedReason),
    /// Malformed beyond copying; left out of the output.
    Dropped(MalformedReason),
}

impl SlicePlan {
    /// Warnings to report for this polygon.
    pub(crate) fn warnings(&self) -> Vec<WarningKind> {
        match self {
            Self::Unchanged => Vec::new(),
            Self::Sliced { warnings, .. } => warnings.clone(),
            Self::Skipped(reason) | Self::Dropped(reason) => {
                vec![WarningKind::MalformedPolygon(reason.clone())]
            }
        }
    }
}

/// Decide how to treat polygon `index` of `mesh`.
pub(crate) fn plan_polygon(
    mesh: &PolyMesh,
    layout: &ChannelLayout,
    index: usize,
    tolerance: f64,
) -> SlicePlan {
    let Some(polygon) = mesh.polygons.get(index) else {
        return SlicePlan::Dropped(MalformedReason::TooFewCorners { corners: 0 });
    };
    let n = polygon.corner_count();
    if n < 3 {
        return SlicePlan::Skipped(MalformedReason::TooFewCorners { corners: n });
    }
    if let Some(&bad) = polygon
        .vertices
        .iter()
        .find(|&&v| v as usize >= mesh.vertices.len())
    {
        return SlicePlan::Dropped(MalformedReason::InvalidVertexIndex { index: bad });
    }

    let mut faces: SmallVec<[&[u32]; 4]> = SmallVec::with_capacity(layout.ids.len());
    for (id, channel) in &mesh.channels {
        match channel.faces.get(index) {
            Some(face)
                if face.len() == n && face.iter().all(|&m| (m as usize) < channel.verts.len()) =>
            {
                faces.push(face);
            }
            _ => return SlicePlan::Skipped(MalformedReason::MapFaceMismatch { channel: *id }),
        }
    }

    let channels: SmallVec<[&MapChannel; 4]> = mesh.channels.values().collect();
    let uv_of = |slot: usize, corner: usize| channels[slot].verts[faces[slot][corner] as usize];

    let uvs: Vec<Point2<f64>> = (0..n)
        .map(|c| {
            let uvw = uv_of(layout.sliced, c);
            Point2::new(uvw.x, uvw.y)
        })
        .collect();
    let class = match classify_polygon(&uvs, tolerance) {
        Ok(class) => class,
        Err(reason) => return SlicePlan::Skipped(reason),
    };
    if !class.needs_slicing() {
        return SlicePlan::Unchanged;
    }

    let corners: Vec<Corner> = (0..n)
        .map(|c| {
            let vertex = polygon.vertices[c];
            Corner {
                origin: Some(SourceCorner {
                    vertex,
                    maps: faces.iter().map(|face| face[c]).collect(),
                }),
                position: mesh.vertices[vertex as usize].position,
                uv: uv_of(layout.sliced, c),
                extras: (0..layout.ids.len())
                    .filter(|&slot| slot != layout.sliced)
                    .map(|slot| uv_of(slot, c))
                    .collect(),
            }
        })
        .collect();

    let outcome = slice_polygon(corners, &class, tolerance);
    SlicePlan::Sliced {
        pieces: outcome.pieces,
        warnings: outcome.warnings,
    }
}

/// Counts gathered while committing plans.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct CommitCounts {
    pub sliced: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub pieces: usize,
    pub vertices_created: usize,
}

/// Builds the output mesh from plans, in input polygon order.
#[derive(Debug)]
pub(crate) struct Rebuilder {
    layout: ChannelLayout,
    source_polygons: Vec<Polygon>,
    source_faces: Vec<Vec<Vec<u32>>>,
    mesh: PolyMesh,
    split_points: PointTable,
    /// Per channel: map vertices created for each geometric vertex.
    map_points: Vec<HashMap<u32, SmallVec<[u32; 2]>>>,
    tolerance: f64,
    face_origin: Vec<u32>,
    counts: CommitCounts,
}

impl Rebuilder {
    /// Take over `mesh`. Vertices and map vertices keep their indices;
    /// polygons and map faces are rebuilt by [`commit`](Self::commit).
    pub(crate) fn new(mesh: PolyMesh, layout: ChannelLayout, tolerance: f64) -> Self {
        let PolyMesh {
            vertices,
            polygons,
            channels,
        } = mesh;

        let mut out = PolyMesh::from_parts(vertices, Vec::with_capacity(polygons.len()));
        let mut source_faces = Vec::with_capacity(channels.len());
        for (id, channel) in channels {
            let MapChannel { verts, faces } = channel;
            out.set_channel(
                id,
                MapChannel {
                    verts,
                    faces: Vec::with_capacity(faces.len()),
                },
            );
            source_faces.push(faces);
        }

        let map_points = vec![HashMap::new(); layout.ids.len()];
        Self {
            layout,
            source_polygons: polygons,
            source_faces,
            mesh: out,
            split_points: PointTable::new(tolerance),
            map_points,
            tolerance,
            face_origin: Vec::new(),
            counts: CommitCounts::default(),
        }
    }

    /// Apply the plan for source polygon `index`.
    pub(crate) fn commit(&mut self, index: usize, plan: SlicePlan) {
        match plan {
            SlicePlan::Unchanged => self.copy_source(index),
            SlicePlan::Skipped(_) => {
                self.counts.skipped += 1;
                self.copy_source(index);
            }
            SlicePlan::Dropped(_) => self.counts.dropped += 1,
            SlicePlan::Sliced { pieces, .. } => {
                self.counts.sliced += 1;
                for piece in pieces {
                    self.push_piece(index, &piece);
                }
            }
        }
    }

    /// Finish, returning the mesh, the source polygon of every output
    /// polygon, and the counts.
    pub(crate) fn finish(self) -> (PolyMesh, Vec<u32>, CommitCounts) {
        (self.mesh, self.face_origin, self.counts)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn copy_source(&mut self, index: usize) {
        let Some(polygon) = self.source_polygons.get(index) else {
            return;
        };
        self.mesh.polygons.push(polygon.clone());
        for (slot, channel) in self.mesh.channels.values_mut().enumerate() {
            let face = self.source_faces[slot].get(index).cloned().unwrap_or_default();
            channel.faces.push(face);
        }
        self.face_origin.push(index as u32);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_piece(&mut self, index: usize, piece: &[Corner]) {
        let slots = self.layout.ids.len();
        let vertices = self.piece_vertices(piece);
        let mut faces: SmallVec<[Vec<u32>; 4]> =
            (0..slots).map(|_| Vec::with_capacity(piece.len())).collect();

        for (corner, &vertex) in piece.iter().zip(&vertices) {
            if let Some(origin) = &corner.origin {
                for (face, &m) in faces.iter_mut().zip(&origin.maps) {
                    face.push(m);
                }
                continue;
            }

            for (slot, face) in faces.iter_mut().enumerate() {
                let uvw = match self.layout.extra_index(slot) {
                    None => corner.uv,
                    Some(e) => corner.extras.get(e).copied().unwrap_or(corner.uv),
                };
                face.push(self.map_vertex(slot, vertex, uvw));
            }
        }

        let Some(source) = self.source_polygons.get(index) else {
            return;
        };
        self.mesh.polygons.push(source.with_corners(vertices));
        for (channel, face) in self.mesh.channels.values_mut().zip(faces) {
            channel.faces.push(face);
        }
        self.face_origin.push(index as u32);
        self.counts.pieces += 1;
    }

    /// Geometric vertex for every corner of `piece`.
    ///
    /// A cut corner reuses the closest earlier cut point within tolerance
    /// in both position and UVW. Two corners of one piece never share a
    /// vertex: when both match the same point, the closer one keeps it and
    /// the other gets a new vertex.
    #[allow(clippy::cast_possible_truncation)]
    fn piece_vertices(&mut self, piece: &[Corner]) -> Vec<u32> {
        let mut matches: Vec<Option<(u32, f64)>> = piece
            .iter()
            .map(|corner| match corner.origin {
                Some(_) => None,
                None => self.split_points.find(&corner.position, &corner.uv),
            })
            .collect();

        for i in 0..matches.len() {
            let Some((id, dist)) = matches[i] else {
                continue;
            };
            let claimed = matches.iter().copied().enumerate().any(|(j, other)| {
                j != i && other.is_some_and(|(other_id, d)| other_id == id && (d, j) < (dist, i))
            });
            if claimed {
                matches[i] = None;
            }
        }

        piece
            .iter()
            .zip(matches)
            .map(|(corner, matched)| {
                if let Some(origin) = &corner.origin {
                    return origin.vertex;
                }
                if let Some((id, _)) = matched {
                    return id;
                }
                self.mesh.vertices.push(Vertex::new(corner.position));
                let id = (self.mesh.vertices.len() - 1) as u32;
                self.split_points.insert(corner.position, corner.uv, id);
                self.counts.vertices_created += 1;
                id
            })
            .collect()
    }

    /// Map vertex for a cut corner on channel slot `slot`, shared with an
    /// earlier cut corner on the same geometric vertex and within
    /// tolerance in UVW.
    fn map_vertex(&mut self, slot: usize, vertex: u32, uvw: Point3<f64>) -> u32 {
        let Some(channel) = self.mesh.channels.values_mut().nth(slot) else {
            return 0;
        };
        let known = self.map_points[slot].entry(vertex).or_default();
        if let Some(&m) = known
            .iter()
            .find(|&&m| (channel.verts[m as usize] - uvw).norm() <= self.tolerance)
        {
            return m;
        }
        let m = channel.add_vert(uvw);
        known.push(m);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::grid_plane;

    const TOL: f64 = 0.001;

    /// One quad from `(0.5, 0.25)` to `(1.5, 0.75)` in both position and UV.
    fn straddling_quad() -> PolyMesh {
        let mut mesh = PolyMesh::new();
        let mut uv = MapChannel::new();
        for (x, y) in [(0.5, 0.25), (1.5, 0.25), (1.5, 0.75), (0.5, 0.75)] {
            mesh.add_vertex(Point3::new(x, y, 0.0));
            uv.add_vert(Point3::new(x, y, 0.0));
        }
        mesh.add_polygon(vec![0, 1, 2, 3]);
        uv.faces.push(vec![0, 1, 2, 3]);
        mesh.set_channel(1, uv);
        mesh
    }

    fn rebuild(mesh: PolyMesh) -> (PolyMesh, Vec<u32>, CommitCounts) {
        let layout = ChannelLayout::new(&mesh, 1).unwrap();
        let plans: Vec<_> = (0..mesh.polygons.len())
            .map(|i| plan_polygon(&mesh, &layout, i, TOL))
            .collect();
        let mut rebuilder = Rebuilder::new(mesh, layout, TOL);
        for (i, plan) in plans.into_iter().enumerate() {
            rebuilder.commit(i, plan);
        }
        rebuilder.finish()
    }

    #[test]
    fn test_layout_extra_index() {
        let mut mesh = grid_plane(1, 1, 1.0);
        mesh.set_channel(3, MapChannel::new());
        mesh.set_channel(0, MapChannel::new());
        let layout = ChannelLayout::new(&mesh, 1).unwrap();

        assert_eq!(layout.ids, vec![0, 1, 3]);
        assert_eq!(layout.sliced, 1);
        assert_eq!(layout.extra_index(0), Some(0));
        assert_eq!(layout.extra_index(1), None);
        assert_eq!(layout.extra_index(2), Some(1));
        assert!(ChannelLayout::new(&mesh, 2).is_none());
    }

    #[test]
    fn test_plan_single_tile_unchanged() {
        let mesh = grid_plane(1, 1, 0.5);
        let layout = ChannelLayout::new(&mesh, 1).unwrap();
        assert!(matches!(
            plan_polygon(&mesh, &layout, 0, TOL),
            SlicePlan::Unchanged
        ));
    }

    #[test]
    fn test_plan_malformed() {
        let mut mesh = grid_plane(2, 1, 1.0);
        mesh.polygons[0].vertices[2] = 99;
        if let Some(uv) = mesh.channel_mut(1) {
            uv.faces[1].pop();
        }
        let layout = ChannelLayout::new(&mesh, 1).unwrap();

        assert!(matches!(
            plan_polygon(&mesh, &layout, 0, TOL),
            SlicePlan::Dropped(MalformedReason::InvalidVertexIndex { index: 99 })
        ));
        assert!(matches!(
            plan_polygon(&mesh, &layout, 1, TOL),
            SlicePlan::Skipped(MalformedReason::MapFaceMismatch { channel: 1 })
        ));
    }

    #[test]
    fn test_rebuild_straddling_quad() {
        let (mesh, origin, counts) = rebuild(straddling_quad());

        assert_eq!(mesh.polygons.len(), 2);
        assert_eq!(origin, vec![0, 0]);
        assert_eq!(counts.sliced, 1);
        assert_eq!(counts.pieces, 2);
        assert_eq!(counts.vertices_created, 2);

        // Originals keep their indices; the two cut points are appended.
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.polygons[0].vertices, vec![0, 4, 5, 3]);
        assert_eq!(mesh.polygons[1].vertices, vec![4, 1, 2, 5]);

        let uv = mesh.channel(1).unwrap();
        assert_eq!(uv.verts.len(), 6);
        assert_eq!(uv.faces[0], vec![0, 4, 5, 3]);
        assert_eq!(uv.faces[1], vec![4, 1, 2, 5]);
        assert!((uv.verts[4].x - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rebuild_keeps_cut_points_with_different_uvs_apart() {
        // Same UVs as `straddling_quad`, but the quad is 0.0004 wide in 3D,
        // so both cut points are within tolerance of each other in position.
        let mut mesh = straddling_quad();
        for vertex in &mut mesh.vertices {
            vertex.position *= 0.0004;
        }

        let (mesh, _, counts) = rebuild(mesh);
        assert_eq!(counts.vertices_created, 2);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.polygons[0].vertices, vec![0, 4, 5, 3]);
        assert_eq!(mesh.polygons[1].vertices, vec![4, 1, 2, 5]);
        for polygon in &mesh.polygons {
            assert_eq!(polygon.distinct_vertex_count(), 4);
        }
    }

    #[test]
    fn test_rebuild_never_repeats_a_vertex_within_a_piece() {
        // The tip at U = 1.0015 is just past tolerance, so the two cut
        // points on U = 1 are 0.0006 apart in both position and UV.
        let mut mesh = PolyMesh::new();
        let mut uv = MapChannel::new();
        for (x, y) in [(0.5, 0.4), (1.0015, 0.5), (0.5, 0.6)] {
            mesh.add_vertex(Point3::new(x, y, 0.0));
            uv.add_vert(Point3::new(x, y, 0.0));
        }
        mesh.add_polygon(vec![0, 1, 2]);
        uv.faces.push(vec![0, 1, 2]);
        mesh.set_channel(1, uv);

        let (mesh, _, counts) = rebuild(mesh);
        assert_eq!(mesh.polygons.len(), 2);
        assert_eq!(counts.vertices_created, 2);
        for polygon in &mesh.polygons {
            assert_eq!(polygon.distinct_vertex_count(), polygon.corner_count());
        }
    }

    #[test]
    fn test_rebuild_shares_cut_points_between_neighbors() {
        // Two quads stacked in V, both crossing U = 1 along a shared edge.
        let mut mesh = PolyMesh::new();
        let mut uv = MapChannel::new();
        for (x, y) in [
            (0.5, 0.0),
            (1.5, 0.0),
            (1.5, 0.5),
            (0.5, 0.5),
            (1.5, 0.9),
            (0.5, 0.9),
        ] {
            mesh.add_vertex(Point3::new(x, y, 0.0));
            uv.add_vert(Point3::new(x, y, 0.0));
        }
        for face in [vec![0, 1, 2, 3], vec![3, 2, 4, 5]] {
            mesh.add_polygon(face.clone());
            uv.faces.push(face);
        }
        mesh.set_channel(1, uv);

        let (mesh, origin, counts) = rebuild(mesh);
        assert_eq!(mesh.polygons.len(), 4);
        assert_eq!(origin, vec![0, 0, 1, 1]);
        // Three cut points on U = 1: bottom, shared middle, top.
        assert_eq!(counts.vertices_created, 3);
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.channel(1).unwrap().verts.len(), 9);
    }

    #[test]
    fn test_rebuild_keeps_attributes_and_other_channels() {
        let mut mesh = straddling_quad();
        mesh.polygons[0].material = 7;
        mesh.polygons[0].smoothing_group = 0b101;
        let mut second = mesh.channel(1).unwrap().clone();
        for uvw in &mut second.verts {
            uvw.y += 10.0;
        }
        mesh.set_channel(2, second);

        let (mesh, _, _) = rebuild(mesh);
        for polygon in &mesh.polygons {
            assert_eq!(polygon.material, 7);
            assert_eq!(polygon.smoothing_group, 0b101);
        }

        let second = mesh.channel(2).unwrap();
        assert_eq!(second.faces.len(), 2);
        let cut = second.verts[second.faces[0][1] as usize];
        assert!((cut.x - 1.0).abs() < 1e-12);
        assert!((cut.y - 10.25).abs() < 1e-12);
    }

    #[test]
    fn test_rebuild_drops_invalid_and_copies_skipped() {
        let mut mesh = grid_plane(3, 1, 0.25);
        mesh.polygons[1].vertices[0] = 1000;
        mesh.polygons[2].vertices.truncate(2);
        if let Some(uv) = mesh.channel_mut(1) {
            uv.faces[2].truncate(2);
        }

        let (mesh, origin, counts) = rebuild(mesh);
        assert_eq!(origin, vec![0, 2]);
        assert_eq!(counts.dropped, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(mesh.polygons[1].vertices.len(), 2);
    }
}
