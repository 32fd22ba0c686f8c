//! Bounded async region loading.
//!
//! The loader owns a dedicated tokio runtime. Requests flow to a worker loop
//! over an unbounded channel; the worker keeps at most `max_concurrent` file
//! reads in flight via a `JoinSet` of blocking tasks and queues the rest
//! sorted by priority. Results come back over a second channel and are
//! drained by the store each tick.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::core::error::Error;
use crate::region::RegionFile;
use crate::voxel::{ChunkCoord, VoxelGrid};

/// Request to load one chunk from its region file
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub coord: ChunkCoord,
    /// Higher runs first; the store uses negated squared viewer distance
    pub priority: f32,
}

/// Outcome of one chunk load
#[derive(Debug)]
pub enum LoadResult {
    /// Grid read and decoded from disk
    Loaded(ChunkCoord, VoxelGrid),
    /// Region file absent or slot marked Null
    Missing(ChunkCoord),
    /// I/O or decode failure; the chunk stays wanting a load
    Failed(ChunkCoord, String),
}

impl LoadResult {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            LoadResult::Loaded(coord, _) => *coord,
            LoadResult::Missing(coord) => *coord,
            LoadResult::Failed(coord, _) => *coord,
        }
    }
}

/// Concurrent chunk loader over region files
pub struct RegionLoader {
    request_tx: mpsc::UnboundedSender<LoadRequest>,
    result_rx: mpsc::UnboundedReceiver<LoadResult>,
    /// Chunks requested but not yet delivered through `poll_results`
    pending: HashSet<ChunkCoord>,
    world_dir: PathBuf,
    _runtime: Runtime,
}

impl RegionLoader {
    /// Create a loader reading regions under `world_dir`, with at most
    /// `max_concurrent` file reads in flight.
    pub fn new(world_dir: PathBuf, max_concurrent: usize) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<LoadResult>();

        let runtime = Runtime::new().expect("failed to create tokio runtime");

        let dir = world_dir.clone();
        runtime.spawn(async move {
            worker_loop(dir, max_concurrent, &mut request_rx, result_tx).await;
        });

        Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
            world_dir,
            _runtime: runtime,
        }
    }

    /// Queue a load. Returns `false` if the chunk is already pending.
    pub fn request(&mut self, coord: ChunkCoord, priority: f32) -> bool {
        if !self.pending.insert(coord) {
            return false;
        }
        self.request_tx
            .send(LoadRequest { coord, priority })
            .expect("loader worker died");
        true
    }

    /// Drain all completed loads (non-blocking).
    pub fn poll_results(&mut self) -> Vec<LoadResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.pending.remove(&result.coord());
            results.push(result);
        }
        results
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    pub fn world_dir(&self) -> &PathBuf {
        &self.world_dir
    }
}

async fn worker_loop(
    world_dir: PathBuf,
    max_concurrent: usize,
    request_rx: &mut mpsc::UnboundedReceiver<LoadRequest>,
    result_tx: mpsc::UnboundedSender<LoadResult>,
) {
    let mut active = JoinSet::new();
    let mut queued: Vec<LoadRequest> = Vec::new();

    loop {
        tokio::select! {
            Some(request) = request_rx.recv() => {
                queued.push(request);
            }

            Some(joined) = active.join_next(), if !active.is_empty() => {
                match joined {
                    Ok(result) => {
                        let _ = result_tx.send(result);
                    }
                    Err(e) => {
                        log::error!("chunk load task panicked: {e}");
                    }
                }
            }

            else => {
                if queued.is_empty() && active.is_empty() {
                    break;
                }
            }
        }

        while active.len() < max_concurrent && !queued.is_empty() {
            queued.sort_by(|a, b| {
                b.priority
                    .partial_cmp(&a.priority)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let request = queued.remove(0);
            let dir = world_dir.clone();
            active.spawn_blocking(move || load_task(dir, request.coord));
        }
    }
}

/// Blocking read of one chunk slot from its region file.
fn load_task(world_dir: PathBuf, coord: ChunkCoord) -> LoadResult {
    let region = coord.region();
    if !RegionFile::exists(&world_dir, region) {
        return LoadResult::Missing(coord);
    }
    let read = RegionFile::open(&world_dir, region)
        .and_then(|mut file| file.read_chunk(coord.region_slot()));
    match read {
        Ok(grid) => LoadResult::Loaded(coord, grid),
        Err(Error::ChunkAbsent { .. }) => LoadResult::Missing(coord),
        Err(e) => LoadResult::Failed(coord, e.to_string()),
    }
}
