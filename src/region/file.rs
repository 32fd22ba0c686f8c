//! Region files on disk.
//!
//! A region file packs `REGION_CHUNKS` chunk slots into one file named
//! `{x}.{y}.{z}.rgn`. The file opens with a fixed index table, one 9-byte
//! entry per slot in region-local order: a tag byte followed by a
//! little-endian u64 payload. Solid chunks store their block value directly
//! in the payload; Subdivided and Array chunks store the absolute file
//! offset of their body, which lives in the area after the table. A region
//! holding only uniform chunks is exactly the table and nothing else.
//!
//! Saving a chunk back into an existing region rewrites its slot entry and
//! appends the new body at the end of the file. The old body bytes are
//! simply abandoned; they are reclaimed next time the region is generated
//! from scratch.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::region::codec::{decode_octree_prefix, encode_chunk, ChunkPayload, SlotTag};
use crate::voxel::{Block, RegionCoord, VoxelGrid, CHUNK_VOLUME, REGION_CHUNKS};

const SLOT_SIZE: u64 = 9;
const TABLE_SIZE: u64 = REGION_CHUNKS as u64 * SLOT_SIZE;

/// An open region file, positioned for random slot access.
pub struct RegionFile {
    file: File,
    coord: RegionCoord,
}

impl RegionFile {
    /// File name for a region, e.g. `0.0.0.rgn` or `-1.2.-3.rgn`.
    pub fn file_name(coord: RegionCoord) -> String {
        format!("{}.{}.{}.rgn", coord.x, coord.y, coord.z)
    }

    /// Full path of a region file under a world directory.
    pub fn path(world_dir: &Path, coord: RegionCoord) -> PathBuf {
        world_dir.join(Self::file_name(coord))
    }

    /// Whether a region file exists on disk.
    pub fn exists(world_dir: &Path, coord: RegionCoord) -> bool {
        Self::path(world_dir, coord).is_file()
    }

    /// Create a fresh region file with every slot marked Null, truncating
    /// any existing file at that path.
    pub fn create(world_dir: &Path, coord: RegionCoord) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(Self::path(world_dir, coord))?;
        file.write_all(&vec![0u8; TABLE_SIZE as usize])?;
        Ok(Self { file, coord })
    }

    /// Open an existing region file for reading and writing.
    pub fn open(world_dir: &Path, coord: RegionCoord) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(Self::path(world_dir, coord))?;
        let len = file.metadata()?.len();
        if len < TABLE_SIZE {
            return Err(Error::Corrupt(format!(
                "region {} is {} bytes, shorter than its index table",
                Self::file_name(coord),
                len
            )));
        }
        Ok(Self { file, coord })
    }

    /// Open a region file, creating an empty one if it does not exist.
    pub fn open_or_create(world_dir: &Path, coord: RegionCoord) -> Result<Self> {
        if Self::exists(world_dir, coord) {
            Self::open(world_dir, coord)
        } else {
            Self::create(world_dir, coord)
        }
    }

    pub fn coord(&self) -> RegionCoord {
        self.coord
    }

    fn read_slot(&mut self, slot: usize) -> Result<(SlotTag, u64)> {
        assert!(slot < REGION_CHUNKS, "slot {slot} out of range");
        self.file.seek(SeekFrom::Start(slot as u64 * SLOT_SIZE))?;
        let mut entry = [0u8; SLOT_SIZE as usize];
        self.file.read_exact(&mut entry)?;
        let tag = SlotTag::from_byte(entry[0])?;
        let payload = u64::from_le_bytes(entry[1..9].try_into().unwrap());
        Ok((tag, payload))
    }

    fn write_slot(&mut self, slot: usize, tag: SlotTag, payload: u64) -> Result<()> {
        assert!(slot < REGION_CHUNKS, "slot {slot} out of range");
        let mut entry = [0u8; SLOT_SIZE as usize];
        entry[0] = tag as u8;
        entry[1..9].copy_from_slice(&payload.to_le_bytes());
        self.file.seek(SeekFrom::Start(slot as u64 * SLOT_SIZE))?;
        self.file.write_all(&entry)?;
        Ok(())
    }

    /// The stored tag for a slot, without decoding its body.
    pub fn slot_tag(&mut self, slot: usize) -> Result<SlotTag> {
        Ok(self.read_slot(slot)?.0)
    }

    /// Read one chunk's voxel grid. A Null slot yields `Error::ChunkAbsent`.
    pub fn read_chunk(&mut self, slot: usize) -> Result<VoxelGrid> {
        let (tag, payload) = self.read_slot(slot)?;
        match tag {
            SlotTag::Null => Err(Error::ChunkAbsent {
                region: self.coord,
                slot,
            }),
            SlotTag::Solid => Ok(VoxelGrid::filled(Block::from_byte(payload as u8))),
            SlotTag::Subdivided => {
                let body = self.read_body(payload, CHUNK_VOLUME)?;
                let (grid, _) = decode_octree_prefix(&body)?;
                Ok(grid)
            }
            SlotTag::Array => {
                let body = self.read_body(payload, CHUNK_VOLUME)?;
                let bytes: [u8; CHUNK_VOLUME] = body.try_into().map_err(|_| {
                    Error::Corrupt(format!("array body at offset {payload} is truncated"))
                })?;
                Ok(VoxelGrid::from_bytes(bytes))
            }
        }
    }

    /// Read up to `max` body bytes starting at an absolute file offset.
    fn read_body(&mut self, offset: u64, max: usize) -> Result<Vec<u8>> {
        if offset < TABLE_SIZE {
            return Err(Error::Corrupt(format!(
                "body offset {offset} points inside the index table"
            )));
        }
        self.file.seek(SeekFrom::Start(offset))?;
        let mut body = Vec::with_capacity(max);
        (&mut self.file).take(max as u64).read_to_end(&mut body)?;
        Ok(body)
    }

    /// Encode one chunk and store it in its slot. `None` marks the slot
    /// Null. Bodies are appended at the end of the file.
    pub fn write_chunk(&mut self, slot: usize, grid: Option<&VoxelGrid>) -> Result<()> {
        match encode_chunk(grid) {
            ChunkPayload::Null => self.write_slot(slot, SlotTag::Null, 0),
            ChunkPayload::Solid(value) => self.write_slot(slot, SlotTag::Solid, value as u64),
            payload @ (ChunkPayload::Subdivided(_) | ChunkPayload::Array(_)) => {
                let offset = self.file.seek(SeekFrom::End(0))?;
                self.file.write_all(payload.body())?;
                self.write_slot(slot, payload.tag(), offset)
            }
        }
    }

    /// Flush buffered writes through to the OS.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
