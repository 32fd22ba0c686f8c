//! Face-culled surface extraction from voxel grids

pub mod builder;
pub mod vertex;

pub use builder::{build_mesh, MeshInput, NeighborSlab};
pub use vertex::{MeshData, MeshVertex};
