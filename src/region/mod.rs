//! Compact on-disk chunk storage
//!
//! One file per region of `R^3` chunks. Chunks are encoded by the cheapest
//! safe scheme: absent, uniform, recursively run-length-encoded octree, or a
//! flat voxel array as the guaranteed worst-case fallback.

pub mod codec;
pub mod file;

pub use codec::{decode_octree, decode_octree_prefix, encode_chunk, ChunkPayload, SlotTag};
pub use file::RegionFile;
