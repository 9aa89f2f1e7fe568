//! Core polygon mesh types.
//!
//! This crate provides the data model shared by the mesh processing crates:
//!
//! - [`Vertex`] - A point in 3D space
//! - [`Polygon`] - An n-gon referencing vertices by index, with material
//!   and smoothing group
//! - [`MapChannel`] - An indexed UVW coordinate set with one map face per
//!   polygon
//! - [`PolyMesh`] - Vertices, polygons and map channels together
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Coordinate System
//!
//! Right-handed. Polygon winding is **counter-clockwise (CCW) when viewed
//! from the front**. In map channels, `x`, `y`, `z` hold U, V, W.
//!
//! # Example
//!
//! ```
//! use mesh_types::{PolyMesh, MapChannel, MeshTopology, Point3};
//!
//! let mut mesh = PolyMesh::new();
//! let mut uv = MapChannel::new();
//! for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
//!     let v = mesh.add_vertex(Point3::new(x, y, 0.0));
//!     uv.add_vert(Point3::new(x, y, 0.0));
//!     assert_eq!(v as usize + 1, mesh.vertex_count());
//! }
//! mesh.add_polygon(vec![0, 1, 2]);
//! uv.faces.push(vec![0, 1, 2]);
//! mesh.set_channel(1, uv);
//!
//! assert_eq!(mesh.polygon_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod channel;
mod mesh;
mod polygon;
mod traits;
mod vertex;

// Re-export core types
pub use bounds::Aabb;
pub use channel::{ChannelId, MapChannel};
pub use mesh::{PolyMesh, grid_plane};
pub use polygon::{Polygon, newell_normal, polygon_area};
pub use traits::{MeshBounds, MeshTopology};
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};
