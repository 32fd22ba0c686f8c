//! Resident chunk state

use crate::math::Aabb;
use crate::mesh::MeshData;
use crate::voxel::coord::ChunkCoord;
use crate::voxel::grid::VoxelGrid;

/// Per-chunk lifecycle flags, one independent boolean each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkFlags {
    /// The grid holds real world data (the region codec populated it)
    pub loaded: bool,
    /// The chunk is waiting for a region load
    pub needs_load: bool,
    /// The grid was mutated since load and must be persisted on eviction
    pub needs_save: bool,
    /// The mesh is stale (or was never built)
    pub needs_build: bool,
    /// `mesh` holds a renderable surface
    pub has_mesh: bool,
}

impl ChunkFlags {
    /// State of a freshly created, never-loaded chunk
    pub fn new_chunk() -> Self {
        Self {
            needs_load: true,
            needs_build: true,
            ..Self::default()
        }
    }
}

/// A resident chunk: voxel grid, lifecycle flags and the current mesh.
///
/// Owned exclusively by the chunk store; background tasks only ever see
/// snapshots of the grid.
pub struct Chunk {
    pub coord: ChunkCoord,
    pub grid: VoxelGrid,
    pub flags: ChunkFlags,
    /// Present iff `flags.has_mesh`
    pub mesh: Option<MeshData>,
}

impl Chunk {
    /// Create an unloaded chunk with a zeroed grid
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            grid: VoxelGrid::new(),
            flags: ChunkFlags::new_chunk(),
            mesh: None,
        }
    }

    /// World-space bounding box of this chunk
    pub fn world_bounds(&self) -> Aabb {
        self.coord.world_bounds()
    }

    /// Install the grid delivered by a region load
    pub fn complete_load(&mut self, grid: VoxelGrid) {
        self.grid = grid;
        self.flags.loaded = true;
        self.flags.needs_load = false;
    }

    /// Install (or clear) the mesh delivered by a build
    pub fn complete_build(&mut self, mesh: Option<MeshData>) {
        self.flags.has_mesh = mesh.is_some();
        self.mesh = mesh;
    }
}
