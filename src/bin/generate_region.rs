//! Region generator binary — pre-generates one region file to disk.
//!
//! Usage: cargo run --release --bin generate_region -- [OPTIONS]
//!
//! Options:
//!   --seed <SEED>     Surface noise seed (default: 12345)
//!   --name <NAME>     World name recorded in the manifest (default: "world")
//!   --dir <DIR>       Output directory (default: "worlds/<name>")
//!
//! Output structure:
//!   worlds/<name>/
//!     manifest.json   # World metadata + slot tag counts
//!     0.0.0.rgn       # Region (0,0,0)

use std::path::PathBuf;
use std::time::Instant;

use noise::{NoiseFn, Perlin};
use serde_json::json;

use voxworld::region::{RegionFile, SlotTag};
use voxworld::voxel::{Block, ChunkCoord, RegionCoord, VoxelGrid, CHUNK_SIZE, REGION_CHUNKS, REGION_SIZE};

/// Region-local chunk y below which everything is solid stone
const STONE_TOP: i32 = 4;
/// Region-local chunk y below which everything above stone is solid dirt
const DIRT_TOP: i32 = 8;
/// Region-local chunk y holding the noise-driven surface
const SURFACE_LAYER: i32 = 8;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let name = parse_str_arg(&args, "--name").unwrap_or_else(|| "world".to_string());
    let output_dir = parse_str_arg(&args, "--dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("worlds/{}", name)));

    println!("=== Voxworld Region Generator ===");
    println!("World: {}", name);
    println!("Seed:  {}", seed);
    println!("Output: {}", output_dir.display());
    println!();

    std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");

    let start = Instant::now();
    let region_coord = RegionCoord::new(0, 0, 0);
    let mut region =
        RegionFile::create(&output_dir, region_coord).expect("Failed to create region file");
    let perlin = Perlin::new(seed);

    let mut written = 0usize;
    for rx in 0..REGION_SIZE as i32 {
        for ry in 0..REGION_SIZE as i32 {
            for rz in 0..REGION_SIZE as i32 {
                let coord = ChunkCoord::new(rx, ry, rz);
                let grid = generate_chunk(coord, &perlin);
                region
                    .write_chunk(coord.region_slot(), grid.as_ref())
                    .expect("Failed to write chunk slot");
                if grid.is_some() {
                    written += 1;
                }
            }
        }
    }
    region.sync().expect("Failed to flush region file");

    let elapsed = start.elapsed();
    let region_path = RegionFile::path(&output_dir, region_coord);
    let region_bytes = std::fs::metadata(&region_path)
        .expect("Failed to stat region file")
        .len();
    println!(
        "Region: {} chunks in {:.1}s ({:.1} MB on disk)",
        written,
        elapsed.as_secs_f64(),
        region_bytes as f64 / (1024.0 * 1024.0)
    );

    // Tally slot tags for the manifest.
    let mut counts = [0usize; 4];
    for slot in 0..REGION_CHUNKS {
        let tag = region.slot_tag(slot).expect("Failed to read slot tag");
        counts[tag as usize] += 1;
    }

    let manifest = json!({
        "name": name,
        "version": 1,
        "seed": seed,
        "chunk_size": CHUNK_SIZE,
        "region_size": REGION_SIZE,
        "regions": [{"x": 0, "y": 0, "z": 0}],
        "slots": {
            "null": counts[SlotTag::Null as usize],
            "solid": counts[SlotTag::Solid as usize],
            "subdivided": counts[SlotTag::Subdivided as usize],
            "array": counts[SlotTag::Array as usize],
        },
    });
    let manifest_path = output_dir.join("manifest.json");
    std::fs::write(
        &manifest_path,
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .expect("Failed to write manifest");

    println!();
    println!("=== Generation Complete ===");
    println!(
        "Slots:  {} solid, {} subdivided, {} array, {} null",
        counts[SlotTag::Solid as usize],
        counts[SlotTag::Subdivided as usize],
        counts[SlotTag::Array as usize],
        counts[SlotTag::Null as usize]
    );
    println!("Output: {}", output_dir.display());
}

/// Generate one chunk of the layered test world. `None` above the surface.
fn generate_chunk(coord: ChunkCoord, perlin: &Perlin) -> Option<VoxelGrid> {
    if coord.y < STONE_TOP {
        return Some(VoxelGrid::filled(Block::Stone));
    }
    if coord.y < DIRT_TOP {
        return Some(VoxelGrid::filled(Block::Dirt));
    }
    if coord.y == SURFACE_LAYER {
        return Some(surface_chunk(coord, perlin));
    }
    None
}

/// Rolling dirt-and-grass surface inside the surface chunk layer.
fn surface_chunk(coord: ChunkCoord, perlin: &Perlin) -> VoxelGrid {
    let s = CHUNK_SIZE as i32;
    let mut grid = VoxelGrid::new();
    for x in 0..s {
        for z in 0..s {
            let wx = (coord.x * s + x) as f64;
            let wz = (coord.z * s + z) as f64;
            let noise = perlin.get([wx * 0.02, wz * 0.02]);
            // Chunk-local surface height, kept inside this chunk layer.
            let height = (s as f64 / 2.0 + noise * 6.0)
                .round()
                .clamp(0.0, (s - 1) as f64) as i32;
            for y in 0..height {
                grid.set(x as usize, y as usize, z as usize, Block::Dirt);
            }
            grid.set(x as usize, height as usize, z as usize, Block::Grass);
        }
    }
    grid
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
