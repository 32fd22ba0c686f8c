//! Neighbor-aware read access to a chunk's grid

use crate::voxel::block::Block;
use crate::voxel::coord::Face;
use crate::voxel::grid::VoxelGrid;
use crate::voxel::CHUNK_SIZE;

/// What a chunk sees in one face direction
#[derive(Clone, Copy)]
pub enum NeighborRef<'a> {
    /// No chunk object exists at that coordinate
    Absent,
    /// A chunk exists but its grid has not been loaded yet
    Unloaded,
    /// A loaded neighbor grid
    Loaded(&'a VoxelGrid),
}

impl<'a> NeighborRef<'a> {
    pub fn grid(&self) -> Option<&'a VoxelGrid> {
        match self {
            NeighborRef::Loaded(grid) => Some(grid),
            _ => None,
        }
    }

    /// Loaded and completely filled; such a neighbor seals the shared face.
    pub fn is_solid(&self) -> bool {
        self.grid().is_some_and(|g| g.is_solid())
    }
}

/// A chunk's grid together with its six face-adjacent neighbors, borrowed
/// from the chunk store for the duration of a query.
pub struct GridView<'a> {
    pub grid: &'a VoxelGrid,
    pub neighbors: [NeighborRef<'a>; 6],
}

impl GridView<'_> {
    /// Read a voxel by chunk-local coordinates, resolving reads up to one
    /// chunk width outside the grid through the face-adjacent neighbor.
    ///
    /// An absent or unloaded neighbor reads as [`Block::Reserved`]: unknown
    /// space is opaque, so face culling never opens a hole it may later have
    /// to close.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is more than one chunk width out of range, or
    /// if more than one coordinate is out of range at once (diagonal
    /// neighbors are not addressable). Both are contract violations in the
    /// caller, not runtime conditions.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Block {
        let s = CHUNK_SIZE as i32;
        assert!(
            (-s..2 * s).contains(&x) && (-s..2 * s).contains(&y) && (-s..2 * s).contains(&z),
            "voxel read ({x},{y},{z}) beyond one neighbor chunk width"
        );

        let face = if x < 0 {
            Face::Left
        } else if x >= s {
            Face::Right
        } else if y < 0 {
            Face::Bottom
        } else if y >= s {
            Face::Top
        } else if z < 0 {
            Face::Front
        } else if z >= s {
            Face::Back
        } else {
            return self.grid.get(x as usize, y as usize, z as usize);
        };

        let d = face.offset();
        let (nx, ny, nz) = (x - d.x * s, y - d.y * s, z - d.z * s);
        assert!(
            (0..s).contains(&nx) && (0..s).contains(&ny) && (0..s).contains(&nz),
            "voxel read ({x},{y},{z}) crosses a chunk edge diagonally"
        );

        match self.neighbors[face.index()] {
            NeighborRef::Loaded(grid) => grid.get(nx as usize, ny as usize, nz as usize),
            NeighborRef::Absent | NeighborRef::Unloaded => Block::Reserved,
        }
    }
}
