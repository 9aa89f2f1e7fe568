//! Error types for UDIM slicing.

use mesh_types::ChannelId;
use thiserror::Error;

/// Invocation-level errors. Any of these aborts the pass before the mesh
/// is touched; per-polygon problems are reported as
/// [`SliceWarning`](crate::SliceWarning)s instead.
#[derive(Debug, Error)]
pub enum UdimError {
    /// Map channel outside the valid texture channel range.
    #[error("invalid map channel {channel} (must be in {min}..={max})")]
    InvalidChannel {
        /// The requested channel.
        channel: ChannelId,
        /// Lowest valid channel.
        min: ChannelId,
        /// Highest valid channel.
        max: ChannelId,
    },

    /// The mesh does not carry the requested map channel.
    #[error("mesh has no map channel {channel}")]
    MissingChannel {
        /// The requested channel.
        channel: ChannelId,
    },

    /// Weld threshold outside the valid range.
    #[error("invalid weld threshold {threshold} (must be in {min}..={max})")]
    InvalidWeldThreshold {
        /// The requested threshold.
        threshold: f64,
        /// Smallest valid threshold.
        min: f64,
        /// Largest valid threshold.
        max: f64,
    },

    /// A map channel's face list is not parallel to the polygon list.
    #[error("map channel {channel} has {map_faces} faces but mesh has {polygons} polygons")]
    ChannelTopologyMismatch {
        /// The offending channel.
        channel: ChannelId,
        /// Number of map faces in the channel.
        map_faces: usize,
        /// Number of polygons in the mesh.
        polygons: usize,
    },
}

/// Result type for UDIM slicing operations.
pub type UdimResult<T> = std::result::Result<T, UdimError>;
