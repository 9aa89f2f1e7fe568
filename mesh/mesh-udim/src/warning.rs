//! Per-polygon diagnostics.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A UV axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// The U axis (grid lines `U = k`).
    U,
    /// The V axis (grid lines `V = k`).
    V,
}

impl Axis {
    /// Component index in a UVW point.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::U => 0,
            Self::V => 1,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U => f.write_str("U"),
            Self::V => f.write_str("V"),
        }
    }
}

/// Why a polygon could not be sliced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MalformedReason {
    /// Fewer than three corners.
    TooFewCorners {
        /// Corner count of the polygon.
        corners: usize,
    },

    /// A corner references a vertex that does not exist. The polygon is
    /// dropped from the output.
    InvalidVertexIndex {
        /// The offending index.
        index: u32,
    },

    /// A map face does not match the polygon's corners.
    MapFaceMismatch {
        /// Channel whose map face is broken.
        channel: i32,
    },

    /// A UV coordinate on the sliced channel is NaN or infinite.
    NonFiniteUv {
        /// Corner holding the coordinate.
        corner: usize,
    },

    /// A UV coordinate on the sliced channel is too far from the origin
    /// to name a tile.
    UvOutOfRange {
        /// Corner holding the coordinate.
        corner: usize,
    },

    /// The polygon spans more tiles along one axis than can be sliced.
    UvSpanTooLarge {
        /// Axis of the span.
        axis: Axis,
        /// Tiles covered along that axis.
        tiles: i64,
    },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewCorners { corners } => write!(f, "only {corners} corners"),
            Self::InvalidVertexIndex { index } => write!(f, "vertex index {index} out of range"),
            Self::MapFaceMismatch { channel } => {
                write!(f, "map face on channel {channel} does not match the polygon")
            }
            Self::NonFiniteUv { corner } => write!(f, "non-finite UV at corner {corner}"),
            Self::UvOutOfRange { corner } => write!(f, "UV out of range at corner {corner}"),
            Self::UvSpanTooLarge { axis, tiles } => {
                write!(f, "UV span of {tiles} tiles along {axis}")
            }
        }
    }
}

/// Kind of a per-polygon warning.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WarningKind {
    /// The polygon was skipped.
    MalformedPolygon(MalformedReason),

    /// An edge crossing could not be located; the corner nearest the grid
    /// line was snapped onto it instead.
    NumericInstability {
        /// Axis of the grid line.
        axis: Axis,
        /// Integer coordinate of the grid line.
        line: i64,
    },

    /// Ear clipping got stuck; the rest of the polygon was fan
    /// triangulated.
    TriangulationFallback {
        /// Corners left when ear clipping stopped.
        corners: usize,
    },
}

/// A non-fatal problem with one source polygon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceWarning {
    /// Index of the polygon in the input mesh.
    pub polygon: u32,

    /// What went wrong.
    pub kind: WarningKind,
}

impl SliceWarning {
    /// Create a warning.
    #[inline]
    #[must_use]
    pub const fn new(polygon: u32, kind: WarningKind) -> Self {
        Self { polygon, kind }
    }

    /// Check if the polygon was skipped rather than sliced.
    #[inline]
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self.kind, WarningKind::MalformedPolygon(_))
    }
}

impl fmt::Display for SliceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::MalformedPolygon(reason) => {
                write!(f, "polygon {} skipped: {reason}", self.polygon)
            }
            WarningKind::NumericInstability { axis, line } => write!(
                f,
                "polygon {}: unstable crossing with {axis} = {line}, snapped",
                self.polygon
            ),
            WarningKind::TriangulationFallback { corners } => write!(
                f,
                "polygon {}: ear clipping stuck with {corners} corners, fan used",
                self.polygon
            ),
        }
    }
}
