//! Octree run-length chunk codec
//!
//! The subdivided encoding walks the chunk as an octree: a cube whose voxels
//! all share one value collapses to a single literal byte no matter its size;
//! a mixed cube emits a control byte (one bit per octant, set = that octant
//! subdivided) followed by its eight half-size octants in canonical order.
//! The stream size is capped at the flat-array size, so the subdivided form
//! never regresses past the fallback.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::grid::VoxelGrid;
use crate::voxel::{CHUNK_SIZE, CHUNK_VOLUME};

/// Slot discriminant stored in the region index table
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotTag {
    Null = 0,
    Solid = 1,
    Subdivided = 2,
    Array = 3,
}

impl SlotTag {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(SlotTag::Null),
            1 => Ok(SlotTag::Solid),
            2 => Ok(SlotTag::Subdivided),
            3 => Ok(SlotTag::Array),
            other => Err(Error::Corrupt(format!("unknown slot tag 0x{other:02x}"))),
        }
    }
}

/// Encoded form of one chunk slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkPayload {
    /// No chunk; discriminant only
    Null,
    /// Uniform chunk; the value byte lives inline in the index table
    Solid(u8),
    /// Octree run-length stream for the body area
    Subdivided(Vec<u8>),
    /// Flat `S^3` voxel bytes for the body area
    Array(Vec<u8>),
}

impl ChunkPayload {
    pub fn tag(&self) -> SlotTag {
        match self {
            ChunkPayload::Null => SlotTag::Null,
            ChunkPayload::Solid(_) => SlotTag::Solid,
            ChunkPayload::Subdivided(_) => SlotTag::Subdivided,
            ChunkPayload::Array(_) => SlotTag::Array,
        }
    }

    /// Bytes destined for the body area (empty for Null/Solid)
    pub fn body(&self) -> &[u8] {
        match self {
            ChunkPayload::Subdivided(bytes) | ChunkPayload::Array(bytes) => bytes,
            _ => &[],
        }
    }
}

/// The octree stream grew past the flat-array size; recovered locally by
/// falling back to `Array`, never surfaced to callers.
struct EncodingOverflow;

/// Control bit for octant `i` in canonical order: Left/Right (x) outermost,
/// then Bottom/Top (y), then Front/Back (z).
#[inline]
fn octant_bit(octant: usize) -> u8 {
    0x80 >> octant
}

fn is_uniform(grid: &VoxelGrid, min: (usize, usize, usize), size: usize) -> Option<u8> {
    let first = grid.get_byte(min.0, min.1, min.2);
    for x in min.0..min.0 + size {
        for y in min.1..min.1 + size {
            for z in min.2..min.2 + size {
                if grid.get_byte(x, y, z) != first {
                    return None;
                }
            }
        }
    }
    Some(first)
}

/// Encode one cube. Returns whether it subdivided (the caller patches its
/// control bit accordingly).
fn encode_cell(
    grid: &VoxelGrid,
    out: &mut Vec<u8>,
    min: (usize, usize, usize),
    size: usize,
) -> std::result::Result<bool, EncodingOverflow> {
    let mut subdivided = false;
    match is_uniform(grid, min, size) {
        Some(value) => out.push(value),
        None => {
            // size == 1 cubes are always uniform, so this branch subdivides
            subdivided = true;
            let control_at = out.len();
            out.push(0);
            let half = size / 2;
            let mut control = 0u8;
            for (octant, (dx, dy, dz)) in octant_offsets().into_iter().enumerate() {
                let child = (min.0 + dx * half, min.1 + dy * half, min.2 + dz * half);
                if encode_cell(grid, out, child, half)? {
                    control |= octant_bit(octant);
                }
            }
            out[control_at] = control;
        }
    }

    if out.len() > CHUNK_VOLUME {
        return Err(EncodingOverflow);
    }
    Ok(subdivided)
}

#[inline]
fn octant_offsets() -> [(usize, usize, usize); 8] {
    [
        (0, 0, 0), // Left  Bottom Front
        (0, 0, 1), // Left  Bottom Back
        (0, 1, 0), // Left  Top    Front
        (0, 1, 1), // Left  Top    Back
        (1, 0, 0), // Right Bottom Front
        (1, 0, 1), // Right Bottom Back
        (1, 1, 0), // Right Top    Front
        (1, 1, 1), // Right Top    Back
    ]
}

/// Encode a chunk, choosing the cheapest safe representation:
/// Null (absent) > Solid (uniform) > Subdivided (octree) > Array (fallback).
pub fn encode_chunk(grid: Option<&VoxelGrid>) -> ChunkPayload {
    let Some(grid) = grid else {
        return ChunkPayload::Null;
    };
    if let Some(value) = grid.uniform_value() {
        return ChunkPayload::Solid(value);
    }

    let mut stream = Vec::new();
    match encode_cell(grid, &mut stream, (0, 0, 0), CHUNK_SIZE) {
        Ok(_) => ChunkPayload::Subdivided(stream),
        Err(EncodingOverflow) => ChunkPayload::Array(grid.bytes().to_vec()),
    }
}

fn next_byte(bytes: &[u8], pos: &mut usize) -> Result<u8> {
    let byte = *bytes
        .get(*pos)
        .ok_or_else(|| Error::Corrupt("octree stream truncated".into()))?;
    *pos += 1;
    Ok(byte)
}

fn decode_cell(
    grid: &mut VoxelGrid,
    bytes: &[u8],
    pos: &mut usize,
    min: (usize, usize, usize),
    size: usize,
    subdivided: bool,
) -> Result<()> {
    if subdivided && size > 1 {
        let control = next_byte(bytes, pos)?;
        let half = size / 2;
        for (octant, (dx, dy, dz)) in octant_offsets().into_iter().enumerate() {
            let child = (min.0 + dx * half, min.1 + dy * half, min.2 + dz * half);
            decode_cell(grid, bytes, pos, child, half, control & octant_bit(octant) != 0)?;
        }
    } else {
        let value = next_byte(bytes, pos)?;
        let block = crate::voxel::Block::from_byte(value);
        for x in min.0..min.0 + size {
            for y in min.1..min.1 + size {
                for z in min.2..min.2 + size {
                    grid.set(x, y, z, block);
                }
            }
        }
    }
    Ok(())
}

/// Decode a Subdivided stream sitting at the front of `bytes`, returning the
/// grid and the number of bytes consumed. The slot table stores only a start
/// offset, so the region reader hands over everything up to the stream's
/// worst-case size and lets the decoder find the end.
///
/// The top-level cube is always treated as subdivided: a uniform chunk would
/// have been encoded Solid and never reaches this decoder.
pub fn decode_octree_prefix(bytes: &[u8]) -> Result<(VoxelGrid, usize)> {
    let mut grid = VoxelGrid::new();
    let mut pos = 0;
    decode_cell(&mut grid, bytes, &mut pos, (0, 0, 0), CHUNK_SIZE, true)?;
    Ok((grid, pos))
}

/// Decode a complete Subdivided body stream back into a grid.
pub fn decode_octree(bytes: &[u8]) -> Result<VoxelGrid> {
    let (grid, consumed) = decode_octree_prefix(bytes)?;
    if consumed != bytes.len() {
        return Err(Error::Corrupt(format!(
            "octree stream has {} trailing bytes",
            bytes.len() - consumed
        )));
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Block;

    fn mixed_grid() -> VoxelGrid {
        // One stone octant in an otherwise empty chunk: compresses well
        let mut grid = VoxelGrid::new();
        for x in 0..8 {
            for y in 0..8 {
                for z in 0..8 {
                    grid.set(x, y, z, Block::Stone);
                }
            }
        }
        grid
    }

    fn checkerboard() -> VoxelGrid {
        // Alternation at the finest granularity defeats the octree encoding
        let mut grid = VoxelGrid::new();
        for x in 0..16 {
            for y in 0..16 {
                for z in 0..16 {
                    if (x + y + z) % 2 == 0 {
                        grid.set(x, y, z, Block::Stone);
                    }
                }
            }
        }
        grid
    }

    fn decode(payload: &ChunkPayload) -> VoxelGrid {
        match payload {
            ChunkPayload::Solid(value) => VoxelGrid::filled(Block::from_byte(*value)),
            ChunkPayload::Subdivided(bytes) => decode_octree(bytes).unwrap(),
            ChunkPayload::Array(bytes) => {
                VoxelGrid::from_bytes(bytes.as_slice().try_into().unwrap())
            }
            ChunkPayload::Null => panic!("null payload"),
        }
    }

    #[test]
    fn test_absent_chunk_encodes_null() {
        assert_eq!(encode_chunk(None), ChunkPayload::Null);
    }

    #[test]
    fn test_uniform_chunk_encodes_solid() {
        let grid = VoxelGrid::filled(Block::Dirt);
        let payload = encode_chunk(Some(&grid));
        assert_eq!(payload, ChunkPayload::Solid(Block::Dirt.to_byte()));
        assert!(payload.body().is_empty());
        // Uniform Empty is Solid(0), not Null: the chunk exists
        let empty = VoxelGrid::new();
        assert_eq!(encode_chunk(Some(&empty)), ChunkPayload::Solid(0));
    }

    #[test]
    fn test_mixed_chunk_encodes_subdivided() {
        let grid = mixed_grid();
        let payload = encode_chunk(Some(&grid));
        assert_eq!(payload.tag(), SlotTag::Subdivided);
        // 1 control byte + 8 octant leaves: far below the flat array
        assert!(payload.body().len() < CHUNK_VOLUME / 8);
    }

    #[test]
    fn test_one_stone_octant_is_nine_bytes() {
        // Control byte with no bits set + 8 uniform octant literals
        let payload = encode_chunk(Some(&mixed_grid()));
        let ChunkPayload::Subdivided(bytes) = payload else {
            panic!("expected subdivided");
        };
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[1], Block::Stone.to_byte()); // Left Bottom Front octant
        assert!(bytes[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_checkerboard_falls_back_to_array() {
        let grid = checkerboard();
        let payload = encode_chunk(Some(&grid));
        assert_eq!(payload.tag(), SlotTag::Array);
        assert_eq!(payload.body().len(), CHUNK_VOLUME);
    }

    #[test]
    fn test_round_trip_correctness() {
        for grid in [VoxelGrid::filled(Block::Grass), mixed_grid(), checkerboard()] {
            let payload = encode_chunk(Some(&grid));
            assert_eq!(decode(&payload), grid);
        }
    }

    #[test]
    fn test_round_trip_stability() {
        for grid in [VoxelGrid::filled(Block::Stone), mixed_grid(), checkerboard()] {
            let once = encode_chunk(Some(&grid));
            let again = encode_chunk(Some(&decode(&once)));
            assert_eq!(once, again);
        }
    }

    #[test]
    fn test_single_voxel_stream_stays_under_cap() {
        let mut grid = VoxelGrid::new();
        grid.set(9, 3, 14, Block::Grass);
        let payload = encode_chunk(Some(&grid));
        assert_eq!(payload.tag(), SlotTag::Subdivided);
        assert!(payload.body().len() <= CHUNK_VOLUME);
        assert_eq!(decode(&payload), grid);
    }

    #[test]
    fn test_decode_truncated_stream_is_corrupt() {
        let payload = encode_chunk(Some(&mixed_grid()));
        let bytes = payload.body();
        let err = decode_octree(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn test_decode_trailing_bytes_is_corrupt() {
        let payload = encode_chunk(Some(&mixed_grid()));
        let mut bytes = payload.body().to_vec();
        bytes.push(0xAB);
        assert!(matches!(decode_octree(&bytes), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_unknown_tag_byte_rejected() {
        assert!(SlotTag::from_byte(3).is_ok());
        assert!(matches!(SlotTag::from_byte(7), Err(Error::Corrupt(_))));
    }
}
