//! Fixed-size voxel grid storage

use crate::voxel::block::Block;
use crate::voxel::coord::Face;
use crate::voxel::{CHUNK_AREA, CHUNK_SIZE, CHUNK_VOLUME};

/// A cube of `CHUNK_SIZE^3` block bytes with a running non-empty count.
///
/// Invariant: `block_count` equals the number of non-Empty bytes, so
/// `is_solid` and `is_empty` are O(1).
#[derive(Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    data: Box<[u8; CHUNK_VOLUME]>,
    block_count: u32,
}

impl std::fmt::Debug for VoxelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelGrid")
            .field("block_count", &self.block_count)
            .finish()
    }
}

#[inline]
fn index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE);
    x * CHUNK_AREA + y * CHUNK_SIZE + z
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelGrid {
    /// Create an all-Empty grid
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; CHUNK_VOLUME]),
            block_count: 0,
        }
    }

    /// Create a grid filled with one block type
    pub fn filled(block: Block) -> Self {
        let byte = block.to_byte();
        Self {
            data: Box::new([byte; CHUNK_VOLUME]),
            block_count: if block.is_empty() { 0 } else { CHUNK_VOLUME as u32 },
        }
    }

    /// Rebuild a grid from raw bytes, recounting non-empty voxels
    pub fn from_bytes(bytes: [u8; CHUNK_VOLUME]) -> Self {
        let block_count = bytes.iter().filter(|&&b| b != 0).count() as u32;
        Self {
            data: Box::new(bytes),
            block_count,
        }
    }

    /// Raw storage in `x * S^2 + y * S + z` order
    pub fn bytes(&self) -> &[u8; CHUNK_VOLUME] {
        &self.data
    }

    /// Read a voxel by chunk-local coordinates
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        Block::from_byte(self.data[index(x, y, z)])
    }

    /// Raw byte at chunk-local coordinates
    pub fn get_byte(&self, x: usize, y: usize, z: usize) -> u8 {
        self.data[index(x, y, z)]
    }

    /// Write a voxel by chunk-local coordinates.
    ///
    /// Returns `false` when the value is unchanged (no-op), `true` when the
    /// byte was stored; `block_count` tracks Empty/non-Empty transitions.
    /// Dirty-flag and neighbor bookkeeping is the chunk store's job.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) -> bool {
        let slot = &mut self.data[index(x, y, z)];
        let new = block.to_byte();
        if *slot == new {
            return false;
        }
        if *slot == 0 {
            self.block_count += 1;
        } else if new == 0 {
            self.block_count -= 1;
        }
        *slot = new;
        true
    }

    /// Number of non-Empty voxels
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Every voxel is non-Empty
    pub fn is_solid(&self) -> bool {
        self.block_count == CHUNK_VOLUME as u32
    }

    /// Every voxel is Empty
    pub fn is_empty(&self) -> bool {
        self.block_count == 0
    }

    /// If every voxel holds the same byte, return it
    pub fn uniform_value(&self) -> Option<u8> {
        let first = self.data[0];
        self.data.iter().all(|&b| b == first).then_some(first)
    }

    /// Copy the boundary layer of voxels on the given face.
    ///
    /// Plane indexing: X faces are `[y * S + z]`, Y faces `[x * S + z]`,
    /// Z faces `[x * S + y]` — the layout [`crate::mesh::MeshInput`] samples.
    pub fn face_plane(&self, face: Face) -> [u8; CHUNK_AREA] {
        let mut plane = [0u8; CHUNK_AREA];
        let edge = CHUNK_SIZE - 1;
        for a in 0..CHUNK_SIZE {
            for b in 0..CHUNK_SIZE {
                let (x, y, z) = match face {
                    Face::Left => (0, a, b),
                    Face::Right => (edge, a, b),
                    Face::Bottom => (a, 0, b),
                    Face::Top => (a, edge, b),
                    Face::Front => (a, b, 0),
                    Face::Back => (a, b, edge),
                };
                plane[a * CHUNK_SIZE + b] = self.data[index(x, y, z)];
            }
        }
        plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let grid = VoxelGrid::new();
        assert!(grid.is_empty());
        assert!(!grid.is_solid());
        assert_eq!(grid.get(0, 0, 0), Block::Empty);
        assert_eq!(grid.get(15, 15, 15), Block::Empty);
    }

    #[test]
    fn test_filled_is_solid() {
        let grid = VoxelGrid::filled(Block::Stone);
        assert!(grid.is_solid());
        assert_eq!(grid.block_count(), CHUNK_VOLUME as u32);
        assert_eq!(grid.get(7, 8, 9), Block::Stone);
        assert_eq!(grid.uniform_value(), Some(Block::Stone.to_byte()));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = VoxelGrid::new();
        assert!(grid.set(1, 2, 3, Block::Dirt));
        assert_eq!(grid.get(1, 2, 3), Block::Dirt);
        assert_eq!(grid.get(3, 2, 1), Block::Empty);
        assert_eq!(grid.block_count(), 1);
    }

    #[test]
    fn test_set_is_idempotent_for_block_count() {
        let mut grid = VoxelGrid::new();
        assert!(grid.set(0, 0, 0, Block::Grass));
        // Same value again is a no-op
        assert!(!grid.set(0, 0, 0, Block::Grass));
        assert_eq!(grid.block_count(), 1);
        // Replacing non-empty with non-empty keeps the count
        assert!(grid.set(0, 0, 0, Block::Stone));
        assert_eq!(grid.block_count(), 1);
        // Clearing decrements once
        assert!(grid.set(0, 0, 0, Block::Empty));
        assert_eq!(grid.block_count(), 0);
    }

    #[test]
    fn test_block_count_matches_distinct_positions() {
        let mut grid = VoxelGrid::new();
        let writes = [(0, 0, 0), (1, 1, 1), (0, 0, 0), (2, 3, 4), (1, 1, 1)];
        for (x, y, z) in writes {
            grid.set(x, y, z, Block::Stone);
        }
        assert_eq!(grid.block_count(), 3);
    }

    #[test]
    fn test_from_bytes_recounts() {
        let mut bytes = [0u8; CHUNK_VOLUME];
        bytes[0] = Block::Stone.to_byte();
        bytes[100] = Block::Grass.to_byte();
        let grid = VoxelGrid::from_bytes(bytes);
        assert_eq!(grid.block_count(), 2);
        assert_eq!(grid.get(0, 0, 0), Block::Stone);
    }

    #[test]
    fn test_uniform_value_mixed() {
        let mut grid = VoxelGrid::filled(Block::Stone);
        assert_eq!(grid.uniform_value(), Some(0x01));
        grid.set(5, 5, 5, Block::Dirt);
        assert_eq!(grid.uniform_value(), None);
    }

    #[test]
    fn test_face_plane() {
        let mut grid = VoxelGrid::new();
        grid.set(0, 2, 3, Block::Stone); // on the Left face
        grid.set(15, 2, 3, Block::Dirt); // on the Right face

        let left = grid.face_plane(Face::Left);
        assert_eq!(left[2 * CHUNK_SIZE + 3], Block::Stone.to_byte());
        let right = grid.face_plane(Face::Right);
        assert_eq!(right[2 * CHUNK_SIZE + 3], Block::Dirt.to_byte());
        // Interior voxels never show up in a face plane
        grid.set(7, 7, 7, Block::Grass);
        for face in Face::ALL {
            assert!(!grid.face_plane(face).contains(&Block::Grass.to_byte()));
        }
    }
}
