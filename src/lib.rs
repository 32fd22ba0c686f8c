//! Voxworld - a chunked voxel world engine with compact region storage

pub mod core;
pub mod math;
pub mod voxel;
pub mod mesh;
pub mod region;
pub mod streaming;
