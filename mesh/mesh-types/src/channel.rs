//! Indexed map channels (UVW coordinate sets).

use crate::Aabb;
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a map channel on a mesh.
///
/// Texture coordinate channels conventionally use `1..=99`; channel `0`
/// holds vertex colors.
pub type ChannelId = i32;

/// A set of texture coordinates attached to a mesh.
///
/// Map vertices are indexed independently of geometric vertices. Each
/// mesh polygon has exactly one map face, stored at the same index, with
/// one map vertex index per polygon corner.
///
/// # Example
///
/// ```
/// use mesh_types::{MapChannel, Point3};
///
/// let mut uv = MapChannel::new();
/// let a = uv.add_vert(Point3::new(0.0, 0.0, 0.0));
/// let b = uv.add_vert(Point3::new(1.0, 0.0, 0.0));
/// let c = uv.add_vert(Point3::new(0.0, 1.0, 0.0));
/// uv.faces.push(vec![a, b, c]);
///
/// let uvs = uv.face_uvws(0).unwrap();
/// assert_eq!(uvs[1].x, 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapChannel {
    /// Map vertices as `(u, v, w)`.
    pub verts: Vec<Point3<f64>>,

    /// Map faces, parallel to the mesh polygon list.
    pub faces: Vec<Vec<u32>>,
}

impl MapChannel {
    /// Create an empty channel.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            verts: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a channel with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vert_count: usize, face_count: usize) -> Self {
        Self {
            verts: Vec::with_capacity(vert_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Append a map vertex and return its index.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_vert(&mut self, uvw: Point3<f64>) -> u32 {
        self.verts.push(uvw);
        (self.verts.len() - 1) as u32
    }

    /// Map vertex of `corner` on map face `face`.
    #[must_use]
    pub fn corner_uvw(&self, face: usize, corner: usize) -> Option<Point3<f64>> {
        let index = *self.faces.get(face)?.get(corner)?;
        self.verts.get(index as usize).copied()
    }

    /// All corner coordinates of map face `face`.
    ///
    /// Returns `None` if the face does not exist or references a map
    /// vertex that does not exist.
    #[must_use]
    pub fn face_uvws(&self, face: usize) -> Option<Vec<Point3<f64>>> {
        self.faces
            .get(face)?
            .iter()
            .map(|&i| self.verts.get(i as usize).copied())
            .collect()
    }

    /// Zero the W component of every map vertex.
    pub fn flatten_w(&mut self) {
        for uvw in &mut self.verts {
            uvw.z = 0.0;
        }
    }

    /// Bounding box of all map vertices in UVW space.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.verts.iter())
    }

    /// Remove map vertices no longer referenced by any map face.
    ///
    /// Returns the number of map vertices removed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn remove_unreferenced(&mut self) -> usize {
        let mut referenced = vec![false; self.verts.len()];
        for face in &self.faces {
            for &i in face {
                if let Some(slot) = referenced.get_mut(i as usize) {
                    *slot = true;
                }
            }
        }

        let original_count = self.verts.len();
        let mut remap = vec![u32::MAX; original_count];
        let mut kept = Vec::with_capacity(original_count);
        for (old, uvw) in self.verts.iter().enumerate() {
            if referenced[old] {
                remap[old] = kept.len() as u32;
                kept.push(*uvw);
            }
        }

        if kept.len() == original_count {
            return 0;
        }

        for face in &mut self.faces {
            for i in face.iter_mut() {
                if let Some(&new) = remap.get(*i as usize) {
                    *i = new;
                }
            }
        }

        self.verts = kept;
        original_count - self.verts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_channel() -> MapChannel {
        let mut ch = MapChannel::new();
        ch.add_vert(Point3::new(0.0, 0.0, 0.5));
        ch.add_vert(Point3::new(1.0, 0.0, 0.5));
        ch.add_vert(Point3::new(0.0, 1.0, 0.5));
        ch.faces.push(vec![0, 1, 2]);
        ch
    }

    #[test]
    fn corner_lookup() {
        let ch = triangle_channel();
        assert_eq!(ch.corner_uvw(0, 1), Some(Point3::new(1.0, 0.0, 0.5)));
        assert_eq!(ch.corner_uvw(0, 3), None);
        assert_eq!(ch.corner_uvw(1, 0), None);
    }

    #[test]
    fn face_uvws_rejects_dangling_index() {
        let mut ch = triangle_channel();
        ch.faces.push(vec![0, 1, 9]);
        assert!(ch.face_uvws(0).is_some());
        assert!(ch.face_uvws(1).is_none());
    }

    #[test]
    fn flatten_w_zeroes_third_component() {
        let mut ch = triangle_channel();
        ch.flatten_w();
        assert!(ch.verts.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn remove_unreferenced_compacts() {
        let mut ch = triangle_channel();
        ch.add_vert(Point3::new(5.0, 5.0, 0.0));
        ch.verts.swap(0, 3);
        ch.faces[0] = vec![3, 1, 2];

        let removed = ch.remove_unreferenced();
        assert_eq!(removed, 1);
        assert_eq!(ch.verts.len(), 3);
        assert_eq!(ch.corner_uvw(0, 0), Some(Point3::new(0.0, 0.0, 0.5)));
    }

    #[test]
    fn bounds_cover_verts() {
        let ch = triangle_channel();
        let b = ch.bounds();
        assert!((b.max.x - 1.0).abs() < f64::EPSILON);
        assert!((b.max.y - 1.0).abs() < f64::EPSILON);
    }
}
