//! UDIM tile keys.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of tiles per UDIM row.
pub const UDIM_ROW_WIDTH: i32 = 10;

/// UDIM number of tile `(0, 0)`.
pub const UDIM_BASE: u32 = 1001;

/// A UDIM tile, identified by the integer part of its UV coordinates.
///
/// Tile `(u, v)` covers the unit square `[u, u+1] x [v, v+1]`. Ordering
/// is row-major by `v`, then `u`, which matches UDIM numbering.
///
/// # Example
///
/// ```
/// use mesh_udim::TileKey;
///
/// let tile = TileKey::from_uv(1.25, 0.5);
/// assert_eq!(tile, TileKey::new(1, 0));
/// assert_eq!(tile.udim_number(), Some(1002));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileKey {
    /// Tile row (`floor(V)`). Declared first so ordering is row-major.
    pub v: i32,
    /// Tile column (`floor(U)`).
    pub u: i32,
}

impl TileKey {
    /// Create a tile key from column and row.
    #[inline]
    #[must_use]
    pub const fn new(u: i32, v: i32) -> Self {
        Self { v, u }
    }

    /// Tile containing a UV coordinate.
    ///
    /// A coordinate exactly on a grid line belongs to the tile on its
    /// positive side: `U = 1.0` is in column 1.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_uv(u: f64, v: f64) -> Self {
        Self::new(u.floor() as i32, v.floor() as i32)
    }

    /// UDIM number (`1001 + u + 10 * v`).
    ///
    /// Returns `None` for tiles outside the UDIM range, i.e. `u` outside
    /// `0..10` or negative `v`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn udim_number(&self) -> Option<u32> {
        if !(0..UDIM_ROW_WIDTH).contains(&self.u) || self.v < 0 {
            return None;
        }
        let offset = (self.v as u32).checked_mul(UDIM_ROW_WIDTH as u32)?;
        UDIM_BASE.checked_add(offset)?.checked_add(self.u as u32)
    }

    /// Tile for a UDIM number.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_udim::TileKey;
    ///
    /// assert_eq!(TileKey::from_udim(1001), Some(TileKey::new(0, 0)));
    /// assert_eq!(TileKey::from_udim(1014), Some(TileKey::new(3, 1)));
    /// assert_eq!(TileKey::from_udim(1000), None);
    /// ```
    #[must_use]
    pub fn from_udim(number: u32) -> Option<Self> {
        let offset = number.checked_sub(UDIM_BASE)?;
        let offset = i32::try_from(offset).ok()?;
        Some(Self::new(offset % UDIM_ROW_WIDTH, offset / UDIM_ROW_WIDTH))
    }

    /// Check if a UV coordinate lies in this tile's closed square,
    /// allowing `tolerance` outside each edge.
    #[must_use]
    pub fn contains(&self, u: f64, v: f64, tolerance: f64) -> bool {
        let (u0, v0) = (f64::from(self.u), f64::from(self.v));
        u >= u0 - tolerance
            && u <= u0 + 1.0 + tolerance
            && v >= v0 - tolerance
            && v <= v0 + 1.0 + tolerance
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.udim_number() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "({}, {})", self.u, self.v),
        }
    }
}
