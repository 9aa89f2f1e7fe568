//! Slicing parameters and presets.

use mesh_types::ChannelId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{UdimError, UdimResult};

/// Lowest map channel that can be sliced.
pub const MIN_MAP_CHANNEL: ChannelId = 1;

/// Highest map channel that can be sliced.
pub const MAX_MAP_CHANNEL: ChannelId = 99;

/// Smallest accepted weld threshold.
pub const MIN_WELD_THRESHOLD: f64 = 0.0001;

/// Largest accepted weld threshold.
pub const MAX_WELD_THRESHOLD: f64 = 1.0;

/// Parameters for a UDIM slicing pass.
///
/// # Example
///
/// ```
/// use mesh_udim::UdimSliceParams;
///
/// let params = UdimSliceParams::default()
///     .with_map_channel(2)
///     .with_weld_threshold(0.01);
///
/// assert!(params.validate().is_ok());
/// assert!(UdimSliceParams::default().with_map_channel(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UdimSliceParams {
    /// Map channel whose UVs decide the tile boundaries (`1..=99`).
    pub map_channel: ChannelId,

    /// Zero the W component on the sliced channel before slicing.
    pub flatten_w: bool,

    /// Remove degenerate polygons and orphaned vertices after slicing.
    pub remove_errors: bool,

    /// Merge vertices closer than `weld_threshold` after slicing.
    pub vertex_weld: bool,

    /// Distance under which two points count as coincident.
    ///
    /// Also the tolerance for treating near-integer UVs as lying on a
    /// tile boundary. Valid range `0.0001..=1.0`.
    pub weld_threshold: f64,

    /// Plan polygon slices on the rayon thread pool for large meshes.
    ///
    /// Output is identical either way.
    pub parallel: bool,
}

impl Default for UdimSliceParams {
    fn default() -> Self {
        Self {
            map_channel: 1,
            flatten_w: true,
            remove_errors: true,
            vertex_weld: true,
            weld_threshold: 0.001,
            parallel: true,
        }
    }
}

impl UdimSliceParams {
    /// Slice only: no welding and no error removal.
    ///
    /// Every vertex and polygon not touched by a slice keeps its index.
    #[must_use]
    pub fn slice_only() -> Self {
        Self {
            remove_errors: false,
            vertex_weld: false,
            ..Default::default()
        }
    }

    /// Default cleanup, but W coordinates on the sliced channel are kept
    /// and interpolated across slices.
    #[must_use]
    pub fn preserve_w() -> Self {
        Self {
            flatten_w: false,
            ..Default::default()
        }
    }

    /// Set the map channel.
    #[must_use]
    pub const fn with_map_channel(mut self, channel: ChannelId) -> Self {
        self.map_channel = channel;
        self
    }

    /// Set whether W is flattened.
    #[must_use]
    pub const fn with_flatten_w(mut self, flatten: bool) -> Self {
        self.flatten_w = flatten;
        self
    }

    /// Set whether degenerate geometry is removed.
    #[must_use]
    pub const fn with_remove_errors(mut self, remove: bool) -> Self {
        self.remove_errors = remove;
        self
    }

    /// Set whether vertices are welded.
    #[must_use]
    pub const fn with_vertex_weld(mut self, weld: bool) -> Self {
        self.vertex_weld = weld;
        self
    }

    /// Set the weld threshold.
    #[must_use]
    pub const fn with_weld_threshold(mut self, threshold: f64) -> Self {
        self.weld_threshold = threshold;
        self
    }

    /// Set whether slice planning may run in parallel.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Polygons with less area than this are degenerate.
    ///
    /// Half the square of the weld threshold: the area of a right
    /// triangle whose legs are both at the weld distance.
    #[must_use]
    pub fn degenerate_area(&self) -> f64 {
        0.5 * self.weld_threshold * self.weld_threshold
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`UdimError::InvalidChannel`] if the map channel is outside
    /// `1..=99`, or [`UdimError::InvalidWeldThreshold`] if the threshold
    /// is not a finite value in `0.0001..=1.0`.
    pub fn validate(&self) -> UdimResult<()> {
        if !(MIN_MAP_CHANNEL..=MAX_MAP_CHANNEL).contains(&self.map_channel) {
            return Err(UdimError::InvalidChannel {
                channel: self.map_channel,
                min: MIN_MAP_CHANNEL,
                max: MAX_MAP_CHANNEL,
            });
        }

        if !(MIN_WELD_THRESHOLD..=MAX_WELD_THRESHOLD).contains(&self.weld_threshold) {
            return Err(UdimError::InvalidWeldThreshold {
                threshold: self.weld_threshold,
                min: MIN_WELD_THRESHOLD,
                max: MAX_WELD_THRESHOLD,
            });
        }

        Ok(())
    }
}
