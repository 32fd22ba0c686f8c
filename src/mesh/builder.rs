//! Visibility-culled mesh construction
//!
//! Builds one quad per visible voxel face. A face is visible iff the voxel
//! on that side is Empty; Reserved (unknown) space is treated as opaque so a
//! chunk bordering unloaded space never shows a seam that would pop once the
//! neighbor arrives.

use crate::voxel::block::Block;
use crate::voxel::coord::Face;
use crate::voxel::grid::VoxelGrid;
use crate::voxel::view::NeighborRef;
use crate::voxel::{CHUNK_AREA, CHUNK_SIZE};

use super::vertex::{MeshData, MeshVertex};

/// Corner offsets and index pattern for one quad orientation.
///
/// Winding is clockwise seen from outside, uniform across faces, so the
/// backend can back-face cull.
struct FaceGeometry {
    corners: [[i32; 3]; 4],
    indices: [u16; 6],
}

fn geometry(face: Face) -> &'static FaceGeometry {
    const LEFT: FaceGeometry = FaceGeometry {
        corners: [[0, 0, 0], [0, 0, 1], [0, 1, 0], [0, 1, 1]],
        indices: [0, 2, 1, 1, 2, 3],
    };
    const RIGHT: FaceGeometry = FaceGeometry {
        corners: [[1, 0, 0], [1, 0, 1], [1, 1, 0], [1, 1, 1]],
        indices: [0, 1, 2, 2, 1, 3],
    };
    const BOTTOM: FaceGeometry = FaceGeometry {
        corners: [[0, 0, 0], [0, 0, 1], [1, 0, 0], [1, 0, 1]],
        indices: [0, 1, 2, 2, 1, 3],
    };
    const TOP: FaceGeometry = FaceGeometry {
        corners: [[0, 1, 0], [0, 1, 1], [1, 1, 0], [1, 1, 1]],
        indices: [0, 2, 1, 1, 2, 3],
    };
    const FRONT: FaceGeometry = FaceGeometry {
        corners: [[0, 0, 0], [0, 1, 0], [1, 0, 0], [1, 1, 0]],
        indices: [0, 2, 3, 3, 1, 0],
    };
    const BACK: FaceGeometry = FaceGeometry {
        corners: [[0, 0, 1], [0, 1, 1], [1, 0, 1], [1, 1, 1]],
        indices: [0, 1, 2, 2, 1, 3],
    };
    match face {
        Face::Left => &LEFT,
        Face::Right => &RIGHT,
        Face::Bottom => &BOTTOM,
        Face::Top => &TOP,
        Face::Front => &FRONT,
        Face::Back => &BACK,
    }
}

/// Snapshot of one neighbor chunk's state at build time
#[derive(Clone)]
pub struct NeighborSlab {
    pub loaded: bool,
    /// Loaded and completely filled (its side of the shared face is sealed)
    pub solid: bool,
    /// The neighbor's boundary voxel layer touching the shared face;
    /// all-Reserved when the neighbor is absent or unloaded.
    pub plane: [u8; CHUNK_AREA],
}

impl NeighborSlab {
    fn unknown() -> Self {
        Self {
            loaded: false,
            solid: false,
            plane: [Block::Reserved.to_byte(); CHUNK_AREA],
        }
    }
}

/// Owned input for one mesh build: a copy of the chunk's grid plus the six
/// neighbor boundary layers.
///
/// Captured synchronously by the chunk store so build tasks never touch
/// shared chunk state, then handed to a background worker.
pub struct MeshInput {
    pub grid: VoxelGrid,
    pub neighbors: [NeighborSlab; 6],
}

impl MeshInput {
    /// Snapshot a grid and its current neighbors
    pub fn capture(grid: &VoxelGrid, neighbors: &[NeighborRef<'_>; 6]) -> Self {
        let slabs = std::array::from_fn(|i| {
            let face = Face::ALL[i];
            match neighbors[i].grid() {
                Some(neighbor) => NeighborSlab {
                    loaded: true,
                    solid: neighbor.is_solid(),
                    plane: neighbor.face_plane(face.opposite()),
                },
                None => NeighborSlab::unknown(),
            }
        });
        Self {
            grid: grid.clone(),
            neighbors: slabs,
        }
    }

    /// Sample a voxel, reaching at most one voxel outside the grid.
    /// Mirrors [`crate::voxel::GridView::get`] over the captured planes.
    fn sample(&self, x: i32, y: i32, z: i32) -> Block {
        let s = CHUNK_SIZE as i32;
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

        let slab = &self.neighbors[face.index()];
        if !slab.loaded {
            return Block::Reserved;
        }
        let (a, b) = match face {
            Face::Left | Face::Right => (y, z),
            Face::Bottom | Face::Top => (x, z),
            Face::Front | Face::Back => (x, y),
        };
        debug_assert!((0..s).contains(&a) && (0..s).contains(&b));
        Block::from_byte(slab.plane[a as usize * CHUNK_SIZE + b as usize])
    }
}

fn emit_quad(mesh: &mut MeshData, face: Face, x: usize, y: usize, z: usize, color: [f32; 3]) {
    let geom = geometry(face);
    let base = mesh.vertices.len() as u16;
    let normal = face.normal().to_array();
    for corner in &geom.corners {
        mesh.vertices.push(MeshVertex {
            position: [
                (x as i32 + corner[0]) as f32,
                (y as i32 + corner[1]) as f32,
                (z as i32 + corner[2]) as f32,
            ],
            normal,
            color,
        });
    }
    mesh.indices.extend(geom.indices.iter().map(|i| base + i));
}

/// Boundary voxel of `face`'s layer for layer coordinates `(a, b)`
fn boundary_voxel(face: Face, a: usize, b: usize) -> (usize, usize, usize) {
    let edge = CHUNK_SIZE - 1;
    match face {
        Face::Left => (0, a, b),
        Face::Right => (edge, a, b),
        Face::Bottom => (a, 0, b),
        Face::Top => (a, edge, b),
        Face::Front => (a, b, 0),
        Face::Back => (a, b, edge),
    }
}

/// Build the visible surface of a chunk.
///
/// Returns `None` when no face is visible (empty chunk, or fully enclosed);
/// the caller clears `has_mesh` in that case.
pub fn build_mesh(input: &MeshInput) -> Option<MeshData> {
    if input.grid.is_empty() {
        return None;
    }

    let mut mesh = MeshData::default();

    if !input.grid.is_solid() {
        // Full per-voxel scan with 6 independent face tests
        for x in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                for z in 0..CHUNK_SIZE {
                    let block = input.grid.get(x, y, z);
                    if !block.is_meshable() {
                        continue;
                    }
                    let color = block.color();
                    for face in Face::ALL {
                        let d = face.offset();
                        let probe = input.sample(x as i32 + d.x, y as i32 + d.y, z as i32 + d.z);
                        if probe.is_empty() {
                            emit_quad(&mut mesh, face, x, y, z, color);
                        }
                    }
                }
            }
        }
    } else {
        // Solid chunk: interior voxels cannot show a face, so only the six
        // boundary layers need testing. A loaded, solid neighbor seals its
        // whole shared face and that layer is skipped outright.
        let draw: [bool; 6] = std::array::from_fn(|i| !input.neighbors[i].solid);
        if draw.iter().any(|&d| d) {
            for face in Face::ALL {
                if !draw[face.index()] {
                    continue;
                }
                let d = face.offset();
                for a in 0..CHUNK_SIZE {
                    for b in 0..CHUNK_SIZE {
                        let (x, y, z) = boundary_voxel(face, a, b);
                        let block = input.grid.get(x, y, z);
                        if !block.is_meshable() {
                            continue;
                        }
                        // A non-solid neighbor may still cover individual
                        // voxels; test the true neighbor voxel.
                        let probe = input.sample(x as i32 + d.x, y as i32 + d.y, z as i32 + d.z);
                        if probe.is_empty() {
                            emit_quad(&mut mesh, face, x, y, z, block.color());
                        }
                    }
                }
            }
        }
    }

    (!mesh.indices.is_empty()).then_some(mesh)
}
