//! Coordinate spaces and transforms
//!
//! Three integer spaces nest: world (voxels), chunk (cubes of
//! `CHUNK_SIZE` voxels) and region (cubes of `REGION_SIZE` chunks, one file
//! each). All downward transforms use floor division / Euclidean remainder so
//! negative coordinates address correctly; truncating division would fold
//! chunk `-1` onto chunk `0`.

use crate::core::types::{IVec3, Vec3};
use crate::math::Aabb;
use crate::voxel::{CHUNK_SIZE, REGION_SIZE};

/// One of the six face-adjacent directions of a chunk or voxel.
///
/// Front is -Z, Back is +Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Left,
    Right,
    Bottom,
    Top,
    Front,
    Back,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Left,
        Face::Right,
        Face::Bottom,
        Face::Top,
        Face::Front,
        Face::Back,
    ];

    /// Unit offset toward this face
    pub fn offset(self) -> IVec3 {
        match self {
            Face::Left => IVec3::new(-1, 0, 0),
            Face::Right => IVec3::new(1, 0, 0),
            Face::Bottom => IVec3::new(0, -1, 0),
            Face::Top => IVec3::new(0, 1, 0),
            Face::Front => IVec3::new(0, 0, -1),
            Face::Back => IVec3::new(0, 0, 1),
        }
    }

    /// Outward face normal
    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Left => Face::Right,
            Face::Right => Face::Left,
            Face::Bottom => Face::Top,
            Face::Top => Face::Bottom,
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Integer coordinate identifying a chunk in the world grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing a world-space position
    pub fn from_world_pos(pos: Vec3) -> Self {
        Self {
            x: (pos.x / CHUNK_SIZE as f32).floor() as i32,
            y: (pos.y / CHUNK_SIZE as f32).floor() as i32,
            z: (pos.z / CHUNK_SIZE as f32).floor() as i32,
        }
    }

    /// Chunk containing an integer world-space voxel coordinate
    pub fn from_world_block(block: IVec3) -> Self {
        let s = CHUNK_SIZE as i32;
        Self {
            x: block.x.div_euclid(s),
            y: block.y.div_euclid(s),
            z: block.z.div_euclid(s),
        }
    }

    /// Chunk-local coordinates of a world-space voxel
    pub fn block_local(block: IVec3) -> (usize, usize, usize) {
        let s = CHUNK_SIZE as i32;
        (
            block.x.rem_euclid(s) as usize,
            block.y.rem_euclid(s) as usize,
            block.z.rem_euclid(s) as usize,
        )
    }

    /// World-space origin (minimum corner) of this chunk
    pub fn world_origin(&self) -> Vec3 {
        Vec3::new(
            (self.x * CHUNK_SIZE as i32) as f32,
            (self.y * CHUNK_SIZE as i32) as f32,
            (self.z * CHUNK_SIZE as i32) as f32,
        )
    }

    /// World-space bounding box of this chunk
    pub fn world_bounds(&self) -> Aabb {
        let origin = self.world_origin();
        Aabb::new(origin, origin + Vec3::splat(CHUNK_SIZE as f32))
    }

    /// The region file this chunk lives in
    pub fn region(&self) -> RegionCoord {
        let r = REGION_SIZE as i32;
        RegionCoord {
            x: self.x.div_euclid(r),
            y: self.y.div_euclid(r),
            z: self.z.div_euclid(r),
        }
    }

    /// Index of this chunk's slot within its region file,
    /// `x * R^2 + y * R + z` over the region-local coordinates.
    pub fn region_slot(&self) -> usize {
        let r = REGION_SIZE as i32;
        let (x, y, z) = (
            self.x.rem_euclid(r) as usize,
            self.y.rem_euclid(r) as usize,
            self.z.rem_euclid(r) as usize,
        );
        x * REGION_SIZE * REGION_SIZE + y * REGION_SIZE + z
    }

    /// Coordinate of the face-adjacent chunk
    pub fn neighbor(&self, face: Face) -> ChunkCoord {
        let d = face.offset();
        ChunkCoord::new(self.x + d.x, self.y + d.y, self.z + d.z)
    }

    /// Squared distance to another chunk coordinate, in chunks
    pub fn distance_squared(&self, other: ChunkCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }
}

/// Integer coordinate identifying a region (one file of `R^3` chunks)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl RegionCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_pos() {
        let cs = CHUNK_SIZE as f32;
        assert_eq!(
            ChunkCoord::from_world_pos(Vec3::new(cs / 2.0, cs / 2.0, cs / 2.0)),
            ChunkCoord::new(0, 0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world_pos(Vec3::new(cs, 0.0, 0.0)),
            ChunkCoord::new(1, 0, 0)
        );
        // Negative positions floor toward negative infinity
        assert_eq!(
            ChunkCoord::from_world_pos(Vec3::new(-0.5, -20.0, -33.0)),
            ChunkCoord::new(-1, -2, -3)
        );
    }

    #[test]
    fn test_from_world_block_negative() {
        // Voxel -1 belongs to chunk -1, not chunk 0
        assert_eq!(
            ChunkCoord::from_world_block(IVec3::new(-1, 0, 0)),
            ChunkCoord::new(-1, 0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world_block(IVec3::new(-16, -17, 15)),
            ChunkCoord::new(-1, -2, 0)
        );
    }

    #[test]
    fn test_block_local_negative() {
        assert_eq!(ChunkCoord::block_local(IVec3::new(-1, 0, 0)), (15, 0, 0));
        assert_eq!(ChunkCoord::block_local(IVec3::new(-16, 33, -17)), (0, 1, 15));
    }

    #[test]
    fn test_world_round_trip() {
        let coord = ChunkCoord::new(5, -3, 10);
        let center = coord.world_origin() + Vec3::splat(CHUNK_SIZE as f32 / 2.0);
        assert_eq!(ChunkCoord::from_world_pos(center), coord);
    }

    #[test]
    fn test_region_of_negative_chunk() {
        assert_eq!(ChunkCoord::new(-1, 0, 0).region(), RegionCoord::new(-1, 0, 0));
        assert_eq!(ChunkCoord::new(-16, 15, 16).region(), RegionCoord::new(-1, 0, 1));
    }

    #[test]
    fn test_region_slot() {
        assert_eq!(ChunkCoord::new(0, 0, 0).region_slot(), 0);
        assert_eq!(ChunkCoord::new(1, 2, 3).region_slot(), 256 + 32 + 3);
        // Chunk -1 maps to region-local 15
        assert_eq!(
            ChunkCoord::new(-1, 0, 0).region_slot(),
            15 * REGION_SIZE * REGION_SIZE
        );
        assert_eq!(ChunkCoord::new(15, 15, 15).region_slot(), 4095);
    }

    #[test]
    fn test_neighbor_and_opposite() {
        let c = ChunkCoord::new(0, 0, 0);
        assert_eq!(c.neighbor(Face::Left), ChunkCoord::new(-1, 0, 0));
        assert_eq!(c.neighbor(Face::Back), ChunkCoord::new(0, 0, 1));
        for face in Face::ALL {
            assert_eq!(c.neighbor(face).neighbor(face.opposite()), c);
            assert_eq!(face.offset() + face.opposite().offset(), IVec3::ZERO);
        }
    }

    #[test]
    fn test_distance_squared() {
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(3, -4, 0);
        assert_eq!(a.distance_squared(b), 25);
    }

    #[test]
    fn test_world_bounds() {
        let bounds = ChunkCoord::new(1, 2, 3).world_bounds();
        assert_eq!(bounds.min, Vec3::new(16.0, 32.0, 48.0));
        assert_eq!(bounds.size(), Vec3::splat(16.0));
    }
}
