//! UV-grid classification of polygons.
//!
//! Decides which UDIM tiles a polygon touches on the sliced channel and
//! which integer grid lines have to be cut to confine every piece to one
//! tile.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use mesh_types::Point2;

use crate::tile::TileKey;
use crate::warning::{Axis, MalformedReason};

/// Maximum number of tiles a polygon may span along one axis.
pub const MAX_TILE_SPAN: i64 = 1024;

/// Largest UV magnitude that still names a tile.
const MAX_UV_MAGNITUDE: f64 = 1.0e6;

/// Inclusive tile index range covered by a polygon along each axis.
///
/// The bounds come from the polygon's UV extent with the tolerance
/// applied inward, so a polygon whose extent is `[0, 1]` covers only tile
/// `0`, while `[0.5, 1.5]` covers tiles `0` and `1`. A degenerate extent
/// sitting exactly on a grid line resolves to the tile on the positive
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    /// First and last tile column.
    pub u: (i64, i64),
    /// First and last tile row.
    pub v: (i64, i64),
}

impl TileSpan {
    /// Compute the span of a set of UV coordinates.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn from_uvs(uvs: &[Point2<f64>], tolerance: f64) -> Option<Self> {
        let first = uvs.first()?;
        let (mut min_u, mut max_u, mut min_v, mut max_v) = (first.x, first.x, first.y, first.y);
        for uv in &uvs[1..] {
            min_u = min_u.min(uv.x);
            max_u = max_u.max(uv.x);
            min_v = min_v.min(uv.y);
            max_v = max_v.max(uv.y);
        }

        Some(Self {
            u: axis_span(min_u, max_u, tolerance),
            v: axis_span(min_v, max_v, tolerance),
        })
    }

    /// Range along one axis.
    #[inline]
    #[must_use]
    pub const fn range(&self, axis: Axis) -> (i64, i64) {
        match axis {
            Axis::U => self.u,
            Axis::V => self.v,
        }
    }

    /// Number of tiles covered along one axis.
    #[inline]
    #[must_use]
    pub const fn tiles_along(&self, axis: Axis) -> i64 {
        let (lo, hi) = self.range(axis);
        hi - lo + 1
    }

    /// Grid lines strictly inside the span along one axis. These are the
    /// lines a slicer must cut.
    #[inline]
    #[must_use]
    pub const fn interior_lines(&self, axis: Axis) -> RangeInclusive<i64> {
        let (lo, hi) = self.range(axis);
        (lo + 1)..=hi
    }

    /// Check whether the span covers a single tile.
    #[inline]
    #[must_use]
    pub const fn is_single_tile(&self) -> bool {
        self.u.0 == self.u.1 && self.v.0 == self.v.1
    }

    /// Tile of a UV coordinate, clamped into this span.
    ///
    /// Within the span the positive-side tie-break applies; clamping keeps
    /// a corner on the polygon's outer boundary from naming a tile the
    /// polygon does not overlap.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tile_of(&self, uv: &Point2<f64>) -> TileKey {
        let u = (uv.x.floor() as i64).clamp(self.u.0, self.u.1);
        let v = (uv.y.floor() as i64).clamp(self.v.0, self.v.1);
        TileKey::new(u as i32, v as i32)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn axis_span(min: f64, max: f64, tolerance: f64) -> (i64, i64) {
    let lo = (min + tolerance).floor() as i64;
    let hi = ((max - tolerance).ceil() as i64 - 1).max(lo);
    (lo, hi)
}

/// Result of classifying one polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Tile span along each axis.
    pub span: TileSpan,
    /// Tiles touched by a corner or an edge.
    pub tiles: BTreeSet<TileKey>,
}

impl Classification {
    /// Check whether the polygon touches more than one tile.
    #[inline]
    #[must_use]
    pub fn needs_slicing(&self) -> bool {
        self.tiles.len() > 1
    }

    /// The single tile of a polygon that needs no slicing.
    #[inline]
    #[must_use]
    pub fn single_tile(&self) -> Option<TileKey> {
        if self.needs_slicing() {
            None
        } else {
            self.tiles.first().copied()
        }
    }
}

/// Classify a polygon by its corner UVs.
///
/// Edges are walked between grid line crossings, so an edge from
/// `U = 0.99` to `U = 1.01` touches both columns even though rounding its
/// endpoints would suggest otherwise.
///
/// # Errors
///
/// Returns the [`MalformedReason`] if the polygon has fewer than three
/// corners, a non-finite or out-of-range coordinate, or spans more than
/// [`MAX_TILE_SPAN`] tiles along an axis.
///
/// # Example
///
/// ```
/// use mesh_types::Point2;
/// use mesh_udim::{classify_polygon, TileKey};
///
/// let quad = [
///     Point2::new(0.5, 0.2),
///     Point2::new(1.5, 0.2),
///     Point2::new(1.5, 0.8),
///     Point2::new(0.5, 0.8),
/// ];
/// let class = classify_polygon(&quad, 0.001).unwrap();
/// assert!(class.needs_slicing());
/// assert!(class.tiles.contains(&TileKey::new(0, 0)));
/// assert!(class.tiles.contains(&TileKey::new(1, 0)));
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn classify_polygon(
    uvs: &[Point2<f64>],
    tolerance: f64,
) -> Result<Classification, MalformedReason> {
    if uvs.len() < 3 {
        return Err(MalformedReason::TooFewCorners { corners: uvs.len() });
    }

    for (corner, uv) in uvs.iter().enumerate() {
        if !uv.x.is_finite() || !uv.y.is_finite() {
            return Err(MalformedReason::NonFiniteUv { corner });
        }
        if uv.x.abs() > MAX_UV_MAGNITUDE || uv.y.abs() > MAX_UV_MAGNITUDE {
            return Err(MalformedReason::UvOutOfRange { corner });
        }
    }

    let Some(span) = TileSpan::from_uvs(uvs, tolerance) else {
        return Err(MalformedReason::TooFewCorners { corners: 0 });
    };

    for axis in [Axis::U, Axis::V] {
        let tiles = span.tiles_along(axis);
        if tiles > MAX_TILE_SPAN {
            return Err(MalformedReason::UvSpanTooLarge { axis, tiles });
        }
    }

    let mut tiles = BTreeSet::new();
    if span.is_single_tile() {
        tiles.insert(span.tile_of(&uvs[0]));
        return Ok(Classification { span, tiles });
    }

    let n = uvs.len();
    let mut params: Vec<f64> = Vec::new();
    for i in 0..n {
        let a = uvs[i];
        let b = uvs[(i + 1) % n];
        tiles.insert(span.tile_of(&a));

        params.clear();
        params.push(0.0);
        for axis in [Axis::U, Axis::V] {
            let (from, to) = (a[axis.index()], b[axis.index()]);
            for line in span.interior_lines(axis) {
                if let Some(t) = strict_crossing(from, to, line as f64) {
                    params.push(t);
                }
            }
        }
        params.push(1.0);
        params.sort_by(f64::total_cmp);

        for pair in params.windows(2) {
            if pair[1] - pair[0] <= f64::EPSILON {
                continue;
            }
            let mid = f64::midpoint(pair[0], pair[1]);
            let p = Point2::new(a.x + (b.x - a.x) * mid, a.y + (b.y - a.y) * mid);
            tiles.insert(span.tile_of(&p));
        }
    }

    Ok(Classification { span, tiles })
}

/// Parameter where the segment `from -> to` crosses `line`, if the line
/// lies strictly between the endpoints.
fn strict_crossing(from: f64, to: f64, line: f64) -> Option<f64> {
    let strictly_between = (from < line && line < to) || (to < line && line < from);
    if !strictly_between {
        return None;
    }
    let t = (line - from) / (to - from);
    t.is_finite().then_some(t)
}
