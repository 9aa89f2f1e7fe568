//! Cutting polygons along integer grid lines.
//!
//! Works on [`Corner`] lists rather than mesh indices so planning can run
//! without touching the output mesh. A convex polygon is cut directly
//! with a half-plane split per grid line; anything else is ear clipped in
//! UV space first so every cut operates on a convex piece.

use mesh_types::{Point2, Point3};
use smallvec::SmallVec;

use crate::classify::Classification;
use crate::warning::{Axis, WarningKind};

/// Where a corner came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceCorner {
    /// Geometric vertex index in the input mesh.
    pub vertex: u32,
    /// Map vertex index for every channel, in channel id order.
    pub maps: SmallVec<[u32; 4]>,
}

/// A polygon corner carrying everything needed to interpolate it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Corner {
    /// Original corner, or `None` for a point created by a cut.
    pub origin: Option<SourceCorner>,
    /// 3D position.
    pub position: Point3<f64>,
    /// UVW on the sliced channel.
    pub uv: Point3<f64>,
    /// UVW on every other channel, in channel id order.
    pub extras: SmallVec<[Point3<f64>; 2]>,
}

impl Corner {
    fn uv2(&self) -> Point2<f64> {
        Point2::new(self.uv.x, self.uv.y)
    }

    /// Point at parameter `t` along `a -> b`, with `axis` pinned to `line`.
    fn interpolate(a: &Self, b: &Self, t: f64, axis: Axis, line: f64) -> Self {
        let mut uv = Point3::from(a.uv.coords.lerp(&b.uv.coords, t));
        uv[axis.index()] = line;
        Self {
            origin: None,
            position: Point3::from(a.position.coords.lerp(&b.position.coords, t)),
            uv,
            extras: a
                .extras
                .iter()
                .zip(&b.extras)
                .map(|(pa, pb)| Point3::from(pa.coords.lerp(&pb.coords, t)))
                .collect(),
        }
    }

    /// Copy of `self` moved onto `line` in UV space.
    fn snapped(&self, axis: Axis, line: f64) -> Self {
        let mut uv = self.uv;
        uv[axis.index()] = line;
        Self {
            origin: None,
            position: self.position,
            uv,
            extras: self.extras.clone(),
        }
    }
}

/// Pieces and diagnostics produced by slicing one polygon.
#[derive(Debug, Default)]
pub(crate) struct SliceOutcome {
    /// Sub-polygons, each confined to one tile.
    pub pieces: Vec<Vec<Corner>>,
    /// Recovered problems.
    pub warnings: Vec<WarningKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Back,
    On,
    Front,
}

fn side_of(value: f64, line: f64, tolerance: f64) -> Side {
    if value > line + tolerance {
        Side::Front
    } else if value < line - tolerance {
        Side::Back
    } else {
        Side::On
    }
}

/// Parameter where `a -> b` reaches `line`, if it can be computed.
pub(crate) fn crossing_parameter(a: f64, b: f64, line: f64) -> Option<f64> {
    let t = (line - a) / (b - a);
    (t.is_finite() && (0.0..=1.0).contains(&t)).then_some(t)
}

/// Split a polygon by the grid line `axis = line`.
///
/// Returns `(back, front)`: corners below the line and corners above it.
/// Corners within `tolerance` of the line go to both sides. If either
/// side has no corner strictly off the line, the whole polygon goes to
/// the other side unchanged.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn split_by_line(
    corners: &[Corner],
    axis: Axis,
    line: i64,
    tolerance: f64,
    warnings: &mut Vec<WarningKind>,
) -> (Vec<Corner>, Vec<Corner>) {
    let k = line as f64;
    let ai = axis.index();
    let sides: Vec<Side> = corners
        .iter()
        .map(|c| side_of(c.uv[ai], k, tolerance))
        .collect();

    if !sides.contains(&Side::Back) {
        return (Vec::new(), corners.to_vec());
    }
    if !sides.contains(&Side::Front) {
        return (corners.to_vec(), Vec::new());
    }

    let n = corners.len();
    let mut back = Vec::with_capacity(n + 2);
    let mut front = Vec::with_capacity(n + 2);

    for i in 0..n {
        let j = (i + 1) % n;
        let (cur, next) = (&corners[i], &corners[j]);

        match sides[i] {
            Side::Back => back.push(cur.clone()),
            Side::Front => front.push(cur.clone()),
            Side::On => {
                back.push(cur.clone());
                front.push(cur.clone());
            }
        }

        let crosses = matches!(
            (sides[i], sides[j]),
            (Side::Back, Side::Front) | (Side::Front, Side::Back)
        );
        if !crosses {
            continue;
        }

        // Only non-finite UVs get here; the classifier rejects those first.
        let cut = if let Some(t) = crossing_parameter(cur.uv[ai], next.uv[ai], k) {
            Corner::interpolate(cur, next, t, axis, k)
        } else {
            warnings.push(WarningKind::NumericInstability { axis, line });
            let nearer = if (cur.uv[ai] - k).abs() <= (next.uv[ai] - k).abs() {
                cur
            } else {
                next
            };
            nearer.snapped(axis, k)
        };
        back.push(cut.clone());
        front.push(cut);
    }

    (back, front)
}

/// Slice a polygon into pieces that each lie in one tile.
///
/// Every interior U line of the span is cut first, then every interior V
/// line. Pieces below a line come before pieces above it. Pieces left with
/// fewer than three corners are dropped.
pub(crate) fn slice_polygon(
    corners: Vec<Corner>,
    class: &Classification,
    tolerance: f64,
) -> SliceOutcome {
    let mut warnings = Vec::new();
    let uvs: Vec<Point2<f64>> = corners.iter().map(Corner::uv2).collect();

    let mut work = if is_convex(&uvs) {
        vec![corners]
    } else {
        triangulate(corners, &uvs, &mut warnings)
    };

    for axis in [Axis::U, Axis::V] {
        for line in class.span.interior_lines(axis) {
            let mut next = Vec::with_capacity(work.len() + 1);
            for piece in work {
                let (back, front) = split_by_line(&piece, axis, line, tolerance, &mut warnings);
                if back.len() >= 3 {
                    next.push(back);
                }
                if front.len() >= 3 {
                    next.push(front);
                }
            }
            work = next;
        }
    }

    SliceOutcome {
        pieces: work,
        warnings,
    }
}

fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Twice the signed UV area. Positive for counter-clockwise winding.
fn signed_area2(uvs: &[Point2<f64>]) -> f64 {
    let n = uvs.len();
    (0..n)
        .map(|i| {
            let (a, b) = (uvs[i], uvs[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Check whether a UV polygon is convex and simple.
///
/// Collinear corners are allowed. A polygon whose corners all lie on one
/// line counts as convex: a half-plane split handles it without
/// triangulation.
pub(crate) fn is_convex(uvs: &[Point2<f64>]) -> bool {
    let n = uvs.len();
    let mut counter_clockwise: Option<bool> = None;
    let mut total_turn = 0.0_f64;
    let mut folded = false;
    for i in 0..n {
        let a = uvs[i];
        let b = uvs[(i + 1) % n];
        let c = uvs[(i + 2) % n];
        let (e0, e1) = (b - a, c - b);
        let scale = e0.norm() * e1.norm();
        if scale <= 0.0 {
            continue;
        }

        let turn = e0.perp(&e1);
        if turn.abs() <= f64::EPSILON * scale {
            folded |= e0.dot(&e1) < 0.0;
            continue;
        }
        match counter_clockwise {
            None => counter_clockwise = Some(turn > 0.0),
            Some(ccw) if ccw != (turn > 0.0) => return false,
            Some(_) => {}
        }
        total_turn += turn.atan2(e0.dot(&e1));
    }

    // Flat.
    if counter_clockwise.is_none() {
        return true;
    }

    !folded && (total_turn.abs() - std::f64::consts::TAU).abs() < 1e-6
}

/// Ear clip a polygon in UV space, keeping its winding.
///
/// Falls back to a fan over the remaining corners when no ear can be
/// found.
fn triangulate(
    corners: Vec<Corner>,
    uvs: &[Point2<f64>],
    warnings: &mut Vec<WarningKind>,
) -> Vec<Vec<Corner>> {
    let orientation = signed_area2(uvs).signum();
    let mut remaining: Vec<usize> = (0..corners.len()).collect();
    let mut triangles = Vec::with_capacity(corners.len().saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let prev = remaining[(i + m - 1) % m];
            let next = remaining[(i + 1) % m];
            is_ear(uvs, &remaining, prev, remaining[i], next, orientation)
        });

        let Some(i) = ear else {
            warnings.push(WarningKind::TriangulationFallback {
                corners: remaining.len(),
            });
            break;
        };

        let prev = remaining[(i + m - 1) % m];
        let next = remaining[(i + 1) % m];
        triangles.push([prev, remaining[i], next]);
        remaining.remove(i);
    }

    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    } else if remaining.len() > 3 {
        let center = remaining[0];
        for pair in remaining[1..].windows(2) {
            triangles.push([center, pair[0], pair[1]]);
        }
    }

    triangles
        .into_iter()
        .map(|tri| tri.iter().map(|&c| corners[c].clone()).collect())
        .collect()
}

fn is_ear(
    uvs: &[Point2<f64>],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    orientation: f64,
) -> bool {
    let (a, b, c) = (uvs[prev], uvs[curr], uvs[next]);
    if cross(&a, &b, &c) * orientation <= 0.0 {
        return false;
    }

    remaining.iter().all(|&idx| {
        if idx == prev || idx == curr || idx == next {
            return true;
        }
        let p = uvs[idx];
        p == a || p == b || p == c || !point_in_triangle(&p, &a, &b, &c)
    })
}

fn point_in_triangle(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_polygon;
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    const TOL: f64 = 0.001;

    /// Corner whose position equals its UV, with one extra channel at
    /// twice the UV.
    fn corner(vertex: u32, u: f64, v: f64) -> Corner {
        Corner {
            origin: Some(SourceCorner {
                vertex,
                maps: smallvec![vertex, vertex],
            }),
            position: Point3::new(u, v, 0.0),
            uv: Point3::new(u, v, 0.0),
            extras: smallvec![Point3::new(2.0 * u, 2.0 * v, 0.0)],
        }
    }

    fn corners(uvs: &[(f64, f64)]) -> Vec<Corner> {
        (0u32..)
            .zip(uvs)
            .map(|(i, &(u, v))| corner(i, u, v))
            .collect()
    }

    fn slice(uvs: &[(f64, f64)]) -> SliceOutcome {
        let input = corners(uvs);
        let points: Vec<_> = input.iter().map(Corner::uv2).collect();
        let class = classify_polygon(&points, TOL).unwrap();
        slice_polygon(input, &class, TOL)
    }

    fn area(piece: &[Corner]) -> f64 {
        let uvs: Vec<_> = piece.iter().map(Corner::uv2).collect();
        signed_area2(&uvs) / 2.0
    }

    fn u_range(piece: &[Corner]) -> (f64, f64) {
        piece.iter().fold((f64::MAX, f64::MIN), |(lo, hi), c| {
            (lo.min(c.uv.x), hi.max(c.uv.x))
        })
    }

    #[test]
    fn test_crossing_parameter() {
        assert_relative_eq!(crossing_parameter(0.5, 1.5, 1.0).unwrap(), 0.5);
        assert_relative_eq!(crossing_parameter(1.5, 0.5, 1.0).unwrap(), 0.5);
        assert!(crossing_parameter(1.0, 1.0, 1.0).is_none());
        assert!(crossing_parameter(0.0, 0.5, 1.0).is_none());
        assert!(crossing_parameter(f64::NAN, 2.0, 1.0).is_none());
        assert!(crossing_parameter(f64::NEG_INFINITY, 5.0, 1.0).is_none());
    }

    // =========================================================================
    // Half-plane split
    // =========================================================================

    #[test]
    fn test_split_square_across_u() {
        let quad = corners(&[(0.5, 0.2), (1.5, 0.2), (1.5, 0.8), (0.5, 0.8)]);
        let mut warnings = Vec::new();
        let (back, front) = split_by_line(&quad, Axis::U, 1, TOL, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(back.len(), 4);
        assert_eq!(front.len(), 4);
        assert_relative_eq!(area(&back), 0.3, epsilon = 1e-12);
        assert_relative_eq!(area(&front), 0.3, epsilon = 1e-12);

        let cuts: Vec<_> = back.iter().filter(|c| c.origin.is_none()).collect();
        assert_eq!(cuts.len(), 2);
        for cut in cuts {
            assert!(front.contains(cut));
            assert!((cut.uv.x - 1.0).abs() < f64::EPSILON);
            assert_relative_eq!(cut.position.x, 1.0);
            assert_relative_eq!(cut.extras[0].x, 2.0);
        }
    }

    #[test]
    fn test_split_keeps_corner_on_line_in_both() {
        let tri = corners(&[(0.5, 0.0), (1.0, 0.5), (1.5, 0.0)]);
        let mut warnings = Vec::new();
        let (back, front) = split_by_line(&tri, Axis::U, 1, TOL, &mut warnings);

        assert_eq!(back.len(), 3);
        assert_eq!(front.len(), 3);
        assert!(back.iter().any(|c| c.origin.as_ref().is_some_and(|o| o.vertex == 1)));
        assert!(front.iter().any(|c| c.origin.as_ref().is_some_and(|o| o.vertex == 1)));
    }

    #[test]
    fn test_split_one_sided_returns_whole() {
        let tri = corners(&[(1.0, 0.0), (1.5, 0.0), (1.0, 0.5)]);
        let mut warnings = Vec::new();
        let (back, front) = split_by_line(&tri, Axis::U, 1, TOL, &mut warnings);
        assert!(back.is_empty());
        assert_eq!(front, tri);
    }

    #[test]
    fn test_split_interpolates_w() {
        let mut quad = corners(&[(0.5, 0.2), (1.5, 0.2), (1.5, 0.8), (0.5, 0.8)]);
        quad[0].uv.z = 0.0;
        quad[1].uv.z = 1.0;
        let mut warnings = Vec::new();
        let (back, _) = split_by_line(&quad, Axis::U, 1, TOL, &mut warnings);
        let cut = back.iter().find(|c| c.origin.is_none()).unwrap();
        assert_relative_eq!(cut.uv.z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_split_snaps_when_crossing_cannot_be_computed() {
        // The edge from U = -inf to U = 5 has no finite crossing parameter.
        let tri = corners(&[(f64::NEG_INFINITY, 0.5), (5.0, 0.0), (5.0, 1.0)]);
        let mut warnings = Vec::new();
        let (back, front) = split_by_line(&tri, Axis::U, 1, TOL, &mut warnings);

        assert_eq!(
            warnings,
            vec![WarningKind::NumericInstability {
                axis: Axis::U,
                line: 1,
            }]
        );
        assert_eq!(back.len(), 3);
        assert_eq!(front.len(), 4);

        // The nearer endpoint, (5, 0), is moved onto the line as a new corner.
        let snapped = &front[0];
        assert!(snapped.origin.is_none());
        assert_relative_eq!(snapped.uv.x, 1.0);
        assert_relative_eq!(snapped.uv.y, 0.0);
        assert_relative_eq!(snapped.position.x, 5.0);
        assert_eq!(back[1], front[0]);
    }

    // =========================================================================
    // Whole-polygon slicing
    // =========================================================================

    #[test]
    fn test_slice_two_tiles() {
        let out = slice(&[(0.5, 0.2), (1.5, 0.2), (1.5, 0.8), (0.5, 0.8)]);
        assert!(out.warnings.is_empty());
        assert_eq!(out.pieces.len(), 2);

        let (lo, hi) = u_range(&out.pieces[0]);
        assert_relative_eq!(lo, 0.5);
        assert_relative_eq!(hi, 1.0);
        let (lo, hi) = u_range(&out.pieces[1]);
        assert_relative_eq!(lo, 1.0);
        assert_relative_eq!(hi, 1.5);
    }

    #[test]
    fn test_slice_four_tiles() {
        let out = slice(&[(0.5, 0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5)]);
        assert_eq!(out.pieces.len(), 4);
        let total: f64 = out.pieces.iter().map(|p| area(p)).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        for piece in &out.pieces {
            assert_relative_eq!(area(piece), 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_slice_wide_strip() {
        let out = slice(&[(0.25, 0.1), (3.75, 0.1), (3.75, 0.2), (0.25, 0.2)]);
        assert_eq!(out.pieces.len(), 4);
        let starts: Vec<f64> = out.pieces.iter().map(|p| u_range(p).0).collect();
        assert_eq!(starts, vec![0.25, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_slice_concave_polygon() {
        // L shape crossing U = 1 with a reflex corner at (1.5, 0.5).
        let out = slice(&[
            (0.5, 0.1),
            (1.8, 0.1),
            (1.8, 0.5),
            (1.5, 0.5),
            (1.5, 0.9),
            (0.5, 0.9),
        ]);
        assert!(out.warnings.is_empty());

        let total: f64 = out.pieces.iter().map(|p| area(p)).sum();
        assert_relative_eq!(total, 1.3 * 0.4 + 1.0 * 0.4, epsilon = 1e-9);
        for piece in &out.pieces {
            let (lo, hi) = u_range(piece);
            assert!(hi <= 1.0 + TOL || lo >= 1.0 - TOL, "piece spans U = 1");
            assert!(area(piece) > 0.0);
        }
    }

    #[test]
    fn test_slice_preserves_winding() {
        let out = slice(&[(0.5, 0.8), (1.5, 0.8), (1.5, 0.2), (0.5, 0.2)]);
        for piece in &out.pieces {
            assert!(area(piece) < 0.0);
        }
    }

    // =========================================================================
    // Convexity and triangulation
    // =========================================================================

    #[test]
    fn test_is_convex() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(is_convex(&square));

        let with_midpoint = [
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(is_convex(&with_midpoint));

        let arrow = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 0.5),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!is_convex(&arrow));

        let bowtie = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!is_convex(&bowtie));

        let line = [Point2::new(0.5, 0.5), Point2::new(1.5, 0.5), Point2::new(1.0, 0.5)];
        assert!(is_convex(&line));
    }

    #[test]
    fn test_triangulate_concave() {
        let input = corners(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.5), (2.0, 1.0), (0.0, 1.0)]);
        let uvs: Vec<_> = input.iter().map(Corner::uv2).collect();
        let mut warnings = Vec::new();
        let tris = triangulate(input, &uvs, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(tris.len(), 3);
        let total: f64 = tris.iter().map(|t| area(t)).sum();
        assert_relative_eq!(total, signed_area2(&uvs) / 2.0, epsilon = 1e-12);
        assert!(tris.iter().all(|t| area(t) > 0.0));
    }

    #[test]
    fn test_triangulate_fallback_warns() {
        let input = corners(&[(0.0, 0.0), (0.5, 0.0), (1.0, 0.0), (1.5, 0.0), (2.0, 0.0)]);
        let uvs: Vec<_> = input.iter().map(Corner::uv2).collect();
        let mut warnings = Vec::new();
        let tris = triangulate(input, &uvs, &mut warnings);

        assert_eq!(tris.len(), 3);
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, WarningKind::TriangulationFallback { .. }))
        );
    }
}
