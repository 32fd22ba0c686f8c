//! Error types for the engine

use thiserror::Error;

use crate::voxel::coord::RegionCoord;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The region file has no data for the requested chunk (Null slot).
    /// The chunk stays `needs_load` and is retried on a later tick.
    #[error("chunk slot {slot} in region {region:?} is empty")]
    ChunkAbsent { region: RegionCoord, slot: usize },

    /// The region file contents do not match the expected layout.
    #[error("corrupt region file: {0}")]
    Corrupt(String),

    /// A scheduler invariant was broken upstream. Fatal, never retried.
    #[error("invalid chunk state: {0}")]
    InvalidState(&'static str),
}
