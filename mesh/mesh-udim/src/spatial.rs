//! Spatial hashing of 3D points.

use hashbrown::HashMap;
use mesh_types::Point3;
use smallvec::SmallVec;

/// Integer cell coordinates of a position.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Iterate the 3x3x3 block of cells around `cell`.
pub(crate) fn neighborhood(cell: (i64, i64, i64)) -> impl Iterator<Item = (i64, i64, i64)> {
    (-1..=1).flat_map(move |dx| {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| (cell.0 + dx, cell.1 + dy, cell.2 + dz)))
    })
}

/// Cut points bucketed by position cell, for "is there already a point
/// within `epsilon` of this one" queries.
///
/// A point is its 3D position together with its UVW on the sliced
/// channel. Two points match only if both are within `epsilon`, so cut
/// points on tiny geometry stay apart when their UVs differ. Cells are
/// `epsilon` wide, so every match lies in the query position's 3x3x3
/// neighborhood.
#[derive(Debug)]
pub(crate) struct PointTable {
    epsilon: f64,
    cells: HashMap<(i64, i64, i64), SmallVec<[(Point3<f64>, Point3<f64>, u32); 2]>>,
}

impl PointTable {
    pub(crate) fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            cells: HashMap::new(),
        }
    }

    /// Id of the closest stored point matching `pos` and `uvw`, with its
    /// distance (the larger of the position and UVW distances).
    pub(crate) fn find(&self, pos: &Point3<f64>, uvw: &Point3<f64>) -> Option<(u32, f64)> {
        let mut best: Option<(u32, f64)> = None;
        for cell in neighborhood(pos_to_cell(pos, self.epsilon)) {
            let Some(bucket) = self.cells.get(&cell) else {
                continue;
            };
            for &(point, key, id) in bucket {
                let dist = (point - pos).norm().max((key - uvw).norm());
                if dist <= self.epsilon && best.is_none_or(|(_, d)| dist < d) {
                    best = Some((id, dist));
                }
            }
        }
        best
    }

    /// Store a point under `id`.
    pub(crate) fn insert(&mut self, pos: Point3<f64>, uvw: Point3<f64>, id: u32) {
        self.cells
            .entry(pos_to_cell(&pos, self.epsilon))
            .or_default()
            .push((pos, uvw, id));
    }
}
