//! The chunk store: a synchronous per-tick driver over the resident chunk
//! map.
//!
//! The store owns every resident `Chunk`. Background work (disk loads, mesh
//! builds) runs in the bounded loader/worker pair; their results are applied
//! at the start of the next tick, so all chunk state changes happen on the
//! driver's thread. Work dispatched this tick is therefore observed no
//! earlier than the next tick.

use std::collections::HashMap;

use crate::core::config::StreamConfig;
use crate::core::error::Error;
use crate::core::types::{IVec3, Result, Vec3};
use crate::math::Frustum;
use crate::mesh::{MeshData, MeshInput};
use crate::region::RegionFile;
use crate::streaming::loader::{LoadResult, RegionLoader};
use crate::streaming::mesher::MeshWorker;
use crate::voxel::{Block, Chunk, ChunkCoord, Face, GridView, NeighborRef};

pub struct ChunkStore {
    config: StreamConfig,
    chunks: HashMap<ChunkCoord, Chunk>,
    loader: RegionLoader,
    mesher: MeshWorker,
    /// Viewer chunk as of the last tick; `None` before the first tick
    origin: Option<ChunkCoord>,
    /// Render set from the last tick, nearest first
    render_order: Vec<ChunkCoord>,
}

impl ChunkStore {
    pub fn new(config: StreamConfig) -> Self {
        let loader = RegionLoader::new(config.world_dir.clone(), config.max_async_load);
        let mesher = MeshWorker::new(config.max_async_build);
        Self {
            config,
            chunks: HashMap::new(),
            loader,
            mesher,
            origin: None,
            render_order: Vec::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.values().filter(|c| c.flags.loaded).count()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Advance streaming by one tick for a viewer at `viewer` looking through
    /// `frustum`.
    ///
    /// Fails only on a broken scheduler invariant (`Error::InvalidState`);
    /// I/O problems are per-chunk conditions handled inside the tick.
    pub fn tick(&mut self, viewer: Vec3, frustum: &Frustum) -> Result<()> {
        self.apply_results();

        let origin = ChunkCoord::from_world_pos(viewer);
        let check_unloads = self.origin != Some(origin);
        self.origin = Some(origin);

        let to_load = self.scan_sphere(origin);
        let (to_build, to_unload) = self.partition(origin, check_unloads);

        self.dispatch_builds(origin, to_build)?;
        self.dispatch_loads(origin, to_load);
        self.unload(to_unload);
        self.refresh_render_order(origin, frustum);
        Ok(())
    }

    /// Apply every finished load and build. Results for chunks that were
    /// evicted while the work ran are dropped.
    fn apply_results(&mut self) {
        for result in self.loader.poll_results() {
            match result {
                LoadResult::Loaded(coord, grid) => {
                    let Some(chunk) = self.chunks.get_mut(&coord) else {
                        continue;
                    };
                    chunk.complete_load(grid);
                    // Neighbor meshes culled against this chunk while it was
                    // unloaded; they must re-mesh against real data.
                    self.mark_neighbors_dirty(coord);
                }
                // Absent data keeps needs_load set; the sphere scan will
                // re-request it next tick.
                LoadResult::Missing(_) => {}
                LoadResult::Failed(coord, message) => {
                    log::warn!("load failed for chunk {coord:?}: {message}");
                }
            }
        }

        for result in self.mesher.poll_results() {
            if let Some(chunk) = self.chunks.get_mut(&result.coord) {
                if chunk.flags.loaded {
                    chunk.complete_build(result.mesh);
                }
            }
        }
    }

    /// Visit every chunk within the visibility sphere, creating missing ones,
    /// and collect those still waiting for a load.
    fn scan_sphere(&mut self, origin: ChunkCoord) -> Vec<ChunkCoord> {
        let r = self.config.visibility_radius;
        let r_sq = (r as i64) * (r as i64);
        let mut to_load = Vec::new();

        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    let d_sq = (dx as i64) * (dx as i64)
                        + (dy as i64) * (dy as i64)
                        + (dz as i64) * (dz as i64);
                    if d_sq > r_sq {
                        continue;
                    }
                    let coord = ChunkCoord::new(origin.x + dx, origin.y + dy, origin.z + dz);
                    let chunk = self.chunks.entry(coord).or_insert_with(|| Chunk::new(coord));
                    if chunk.flags.needs_load && !self.loader.is_pending(coord) {
                        to_load.push(coord);
                    }
                }
            }
        }

        to_load
    }

    /// Split resident chunks into build and unload work for this tick.
    fn partition(&self, origin: ChunkCoord, check_unloads: bool) -> (Vec<ChunkCoord>, Vec<ChunkCoord>) {
        let unload_sq = {
            let r = self.config.unload_radius as i64;
            r * r
        };
        let mut to_build = Vec::new();
        let mut to_unload = Vec::new();

        for chunk in self.chunks.values() {
            if check_unloads && chunk.coord.distance_squared(origin) > unload_sq {
                to_unload.push(chunk.coord);
                continue;
            }
            if chunk.flags.loaded && chunk.flags.needs_build && !self.mesher.is_pending(chunk.coord)
            {
                to_build.push(chunk.coord);
            }
        }

        (to_build, to_unload)
    }

    /// Hand builds to the mesh worker, nearest first, over owned snapshots.
    fn dispatch_builds(&mut self, origin: ChunkCoord, mut to_build: Vec<ChunkCoord>) -> Result<()> {
        to_build.sort_by_key(|c| c.distance_squared(origin));
        for coord in to_build {
            let input = self.capture_input(coord)?;
            let priority = -(coord.distance_squared(origin) as f32);
            if self.mesher.request(coord, priority, input) {
                if let Some(chunk) = self.chunks.get_mut(&coord) {
                    chunk.flags.needs_build = false;
                }
            }
        }
        Ok(())
    }

    /// Snapshot a chunk's grid and neighbor boundary planes for a build.
    ///
    /// Only loaded resident chunks are buildable; anything else here is a
    /// scheduler bug, surfaced as `InvalidState` rather than retried.
    fn capture_input(&self, coord: ChunkCoord) -> Result<MeshInput> {
        let chunk = self
            .chunks
            .get(&coord)
            .ok_or(Error::InvalidState("mesh build scheduled for a non-resident chunk"))?;
        if !chunk.flags.loaded {
            return Err(Error::InvalidState(
                "mesh build scheduled for an unloaded chunk",
            ));
        }
        let neighbors = self.neighbor_refs(coord);
        Ok(MeshInput::capture(&chunk.grid, &neighbors))
    }

    fn neighbor_refs(&self, coord: ChunkCoord) -> [NeighborRef<'_>; 6] {
        Face::ALL.map(|face| match self.chunks.get(&coord.neighbor(face)) {
            None => NeighborRef::Absent,
            Some(neighbor) if !neighbor.flags.loaded => NeighborRef::Unloaded,
            Some(neighbor) => NeighborRef::Loaded(&neighbor.grid),
        })
    }

    /// Queue loads nearest first. The loader bounds in-flight reads itself;
    /// everything queued here beyond that limit waits in its priority queue.
    fn dispatch_loads(&mut self, origin: ChunkCoord, mut to_load: Vec<ChunkCoord>) {
        to_load.sort_by_key(|c| c.distance_squared(origin));
        for coord in to_load {
            let priority = -(coord.distance_squared(origin) as f32);
            self.loader.request(coord, priority);
        }
    }

    /// Evict chunks synchronously, persisting dirty grids first. Saving from
    /// the authoritative grid here means in-flight work for these chunks can
    /// be discarded later without losing data.
    fn unload(&mut self, to_unload: Vec<ChunkCoord>) {
        for coord in to_unload {
            let Some(chunk) = self.chunks.get(&coord) else {
                continue;
            };
            if chunk.flags.needs_save {
                if let Err(e) = Self::save_chunk(&self.config.world_dir, chunk) {
                    log::error!("failed to save chunk {coord:?}, keeping it resident: {e}");
                    continue;
                }
            }
            self.chunks.remove(&coord);
            self.mark_neighbors_dirty(coord);
        }
    }

    fn save_chunk(world_dir: &std::path::Path, chunk: &Chunk) -> crate::core::types::Result<()> {
        let mut region = RegionFile::open_or_create(world_dir, chunk.coord.region())?;
        region.write_chunk(chunk.coord.region_slot(), Some(&chunk.grid))?;
        region.sync()
    }

    fn mark_neighbors_dirty(&mut self, coord: ChunkCoord) {
        for face in Face::ALL {
            if let Some(neighbor) = self.chunks.get_mut(&coord.neighbor(face)) {
                if neighbor.flags.loaded {
                    neighbor.flags.needs_build = true;
                }
            }
        }
    }

    fn refresh_render_order(&mut self, origin: ChunkCoord, frustum: &Frustum) {
        self.render_order.clear();
        self.render_order.extend(
            self.chunks
                .values()
                .filter(|c| {
                    c.flags.loaded && c.flags.has_mesh && frustum.intersects_aabb(&c.world_bounds())
                })
                .map(|c| c.coord),
        );
        self.render_order
            .sort_by_key(|c| c.distance_squared(origin));
    }

    /// Renderable chunks from the last tick, front to back.
    pub fn render_set(&self) -> impl Iterator<Item = (ChunkCoord, &MeshData)> {
        self.render_order.iter().filter_map(|coord| {
            let mesh = self.chunks.get(coord)?.mesh.as_ref()?;
            Some((*coord, mesh))
        })
    }

    /// Read a block at a world coordinate. Unloaded or non-resident space
    /// reads as `Reserved`.
    pub fn get_block(&self, world: IVec3) -> Block {
        let coord = ChunkCoord::from_world_block(world);
        match self.chunks.get(&coord) {
            Some(chunk) if chunk.flags.loaded => {
                let (x, y, z) = ChunkCoord::block_local(world);
                chunk.grid.get(x, y, z)
            }
            _ => Block::Reserved,
        }
    }

    /// Write a block at a world coordinate. No-op (returning `false`) unless
    /// the chunk is resident and loaded; a write of the stored value is also
    /// a no-op. A real change marks the chunk dirty for build and save and
    /// flags every loaded face-adjacent neighbor for rebuild.
    pub fn set_block(&mut self, world: IVec3, block: Block) -> bool {
        let coord = ChunkCoord::from_world_block(world);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if !chunk.flags.loaded {
            return false;
        }
        let (x, y, z) = ChunkCoord::block_local(world);
        if !chunk.grid.set(x, y, z, block) {
            return false;
        }
        chunk.flags.needs_build = true;
        chunk.flags.needs_save = true;
        self.mark_neighbors_dirty(coord);
        true
    }

    /// Neighbor-aware view of one loaded chunk.
    pub fn chunk_view(&self, coord: ChunkCoord) -> Option<GridView<'_>> {
        let chunk = self.chunks.get(&coord)?;
        if !chunk.flags.loaded {
            return None;
        }
        Some(GridView {
            grid: &chunk.grid,
            neighbors: self.neighbor_refs(coord),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mat4;
    use crate::voxel::{VoxelGrid, CHUNK_SIZE};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    impl ChunkStore {
        fn insert_loaded(&mut self, coord: ChunkCoord, grid: VoxelGrid) {
            let mut chunk = Chunk::new(coord);
            chunk.complete_load(grid);
            self.chunks.insert(coord, chunk);
        }
    }

    fn test_config(dir: &TempDir, visibility: i32, unload: i32) -> StreamConfig {
        StreamConfig {
            world_dir: dir.path().to_path_buf(),
            visibility_radius: visibility,
            unload_radius: unload,
            max_async_load: 4,
            max_async_build: 2,
        }
    }

    fn wide_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(2.0, 1.0, 0.1, 10_000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO, Vec3::Y);
        Frustum::from_view_projection(&(proj * view))
    }

    fn sphere_volume(r: i32) -> usize {
        let mut count = 0;
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    if dx * dx + dy * dy + dz * dz <= r * r {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_first_tick_populates_visibility_sphere() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 2, 4));
        store.tick(Vec3::new(8.0, 8.0, 8.0), &wide_frustum()).unwrap();

        assert_eq!(store.chunk_count(), sphere_volume(2));
        let origin = store.chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        assert!(origin.flags.needs_load);
        assert!(!origin.flags.loaded);
    }

    #[test]
    fn test_unload_hysteresis_on_origin_change() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 3));
        let frustum = wide_frustum();
        store.tick(Vec3::ZERO, &frustum).unwrap();
        assert!(store.chunk(ChunkCoord::new(0, 0, 0)).is_some());

        // One chunk over: everything stays within the unload radius.
        store.tick(Vec3::new(CHUNK_SIZE as f32 * 2.0 + 1.0, 0.0, 0.0), &frustum).unwrap();
        assert!(store.chunk(ChunkCoord::new(-1, 0, 0)).is_some());

        // Far away: the old neighborhood is evicted.
        store.tick(Vec3::new(CHUNK_SIZE as f32 * 40.0, 0.0, 0.0), &frustum).unwrap();
        assert!(store.chunk(ChunkCoord::new(-1, 0, 0)).is_none());
        assert!(store.chunk(ChunkCoord::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_unchanged_origin_skips_unload_checks() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        let frustum = wide_frustum();
        store.tick(Vec3::ZERO, &frustum).unwrap();

        // Plant an out-of-range chunk, then tick without moving.
        store.insert_loaded(ChunkCoord::new(50, 0, 0), VoxelGrid::new());
        store.tick(Vec3::ZERO, &frustum).unwrap();
        assert!(store.chunk(ChunkCoord::new(50, 0, 0)).is_some());

        // Moving the viewer triggers the check.
        store.tick(Vec3::new(CHUNK_SIZE as f32, 0.0, 0.0), &frustum).unwrap();
        assert!(store.chunk(ChunkCoord::new(50, 0, 0)).is_none());
    }

    #[test]
    fn test_block_access_outside_loaded_world() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        assert_eq!(store.get_block(IVec3::new(0, 0, 0)), Block::Reserved);
        assert!(!store.set_block(IVec3::new(0, 0, 0), Block::Stone));
    }

    #[test]
    fn test_set_block_marks_chunk_and_neighbors() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        store.insert_loaded(ChunkCoord::new(0, 0, 0), VoxelGrid::new());
        store.insert_loaded(ChunkCoord::new(-1, 0, 0), VoxelGrid::new());

        // Loaded chunks start clean for this test.
        for coord in [ChunkCoord::new(0, 0, 0), ChunkCoord::new(-1, 0, 0)] {
            store.chunks.get_mut(&coord).unwrap().flags.needs_build = false;
        }

        assert!(store.set_block(IVec3::new(0, 5, 5), Block::Grass));
        assert_eq!(store.get_block(IVec3::new(0, 5, 5)), Block::Grass);

        let edited = store.chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        assert!(edited.flags.needs_build);
        assert!(edited.flags.needs_save);
        let neighbor = store.chunk(ChunkCoord::new(-1, 0, 0)).unwrap();
        assert!(neighbor.flags.needs_build);

        // Writing the same value again changes nothing.
        assert!(!store.set_block(IVec3::new(0, 5, 5), Block::Grass));
    }

    #[test]
    fn test_negative_world_coordinates_address_their_chunk() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        store.insert_loaded(ChunkCoord::new(-1, -1, -1), VoxelGrid::new());

        assert!(store.set_block(IVec3::new(-1, -16, -9), Block::Dirt));
        assert_eq!(store.get_block(IVec3::new(-1, -16, -9)), Block::Dirt);
        let chunk = store.chunk(ChunkCoord::new(-1, -1, -1)).unwrap();
        assert_eq!(chunk.grid.get(15, 0, 7), Block::Dirt);
    }

    #[test]
    fn test_render_set_empty_until_meshes_exist() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        store.tick(Vec3::ZERO, &wide_frustum()).unwrap();
        assert_eq!(store.render_set().count(), 0);
    }

    #[test]
    fn test_render_set_orders_chunks_front_to_back() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 10));

        // Meshed chunks at squared distances 36, 4 and 16, inserted out of
        // order.
        let mut quad = MeshData::default();
        quad.vertices = vec![Default::default(); 4];
        quad.indices = vec![0, 1, 2, 2, 1, 3];
        for x in [6, 2, -4] {
            let coord = ChunkCoord::new(x, 0, 0);
            store.insert_loaded(coord, VoxelGrid::new());
            let chunk = store.chunks.get_mut(&coord).unwrap();
            chunk.flags.needs_build = false;
            chunk.complete_build(Some(quad.clone()));
        }

        store.tick(Vec3::ZERO, &wide_frustum()).unwrap();
        let order: Vec<i32> = store.render_set().map(|(coord, _)| coord.x).collect();
        assert_eq!(order, vec![2, -4, 6]);
    }

    #[test]
    fn test_building_an_unloaded_chunk_is_invalid_state() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        let coord = ChunkCoord::new(0, 0, 0);
        store.chunks.insert(coord, Chunk::new(coord));

        assert!(matches!(
            store.capture_input(coord),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            store.capture_input(ChunkCoord::new(9, 9, 9)),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_disk_load_and_build_pipeline() {
        let dir = tempdir().unwrap();
        let origin = ChunkCoord::new(0, 0, 0);
        let mut region = RegionFile::create(dir.path(), origin.region()).unwrap();
        let mut grid = VoxelGrid::new();
        grid.set(8, 8, 8, Block::Stone);
        region.write_chunk(origin.region_slot(), Some(&grid)).unwrap();
        region.sync().unwrap();
        drop(region);

        let mut store = ChunkStore::new(test_config(&dir, 1, 3));
        let frustum = wide_frustum();

        // Results land at a later tick's join point; poll with a bound.
        let mut loaded = false;
        for _ in 0..200 {
            store.tick(Vec3::new(8.0, 8.0, 8.0), &frustum).unwrap();
            if store
                .chunk(origin)
                .is_some_and(|c| c.flags.loaded && c.flags.has_mesh)
            {
                loaded = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(loaded, "chunk never finished loading and meshing");

        assert_eq!(store.get_block(IVec3::new(8, 8, 8)), Block::Stone);
        let rendered: Vec<_> = store.render_set().collect();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, origin);
        assert_eq!(rendered[0].1.quad_count(), 6);
    }

    #[test]
    fn test_eviction_persists_dirty_chunks() {
        let dir = tempdir().unwrap();
        let mut store = ChunkStore::new(test_config(&dir, 1, 2));
        let coord = ChunkCoord::new(0, 0, 0);
        store.insert_loaded(coord, VoxelGrid::new());
        store.origin = Some(coord);
        assert!(store.set_block(IVec3::new(3, 3, 3), Block::Stone));

        // Move far: the dirty chunk must be written out before eviction.
        store
            .tick(Vec3::new(CHUNK_SIZE as f32 * 40.0, 0.0, 0.0), &wide_frustum())
            .unwrap();
        assert!(store.chunk(coord).is_none());

        let mut region = RegionFile::open(dir.path(), coord.region()).unwrap();
        let saved = region.read_chunk(coord.region_slot()).unwrap();
        assert_eq!(saved.get(3, 3, 3), Block::Stone);
    }
}
