//! Voxel data model: blocks, chunks and coordinate spaces

pub mod block;
pub mod coord;
pub mod grid;
pub mod chunk;
pub mod view;

pub use block::Block;
pub use chunk::{Chunk, ChunkFlags};
pub use coord::{ChunkCoord, Face, RegionCoord};
pub use grid::VoxelGrid;
pub use view::{GridView, NeighborRef};

/// Number of voxels per chunk side
pub const CHUNK_SIZE: usize = 16;

/// Voxels in one chunk face layer
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Total voxels in a chunk
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Chunks per region side
pub const REGION_SIZE: usize = 16;

/// Total chunk slots in a region file
pub const REGION_CHUNKS: usize = REGION_SIZE * REGION_SIZE * REGION_SIZE;
