//! Bounded async mesh building.
//!
//! Mirrors the loader's shape: unbounded request/result channels around a
//! worker loop that keeps at most `max_concurrent` builds in flight. Each
//! request carries an owned `MeshInput` snapshot, so build tasks never touch
//! resident chunk state.

use std::collections::HashSet;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::mesh::{build_mesh, MeshData, MeshInput};
use crate::voxel::ChunkCoord;

/// Request to rebuild one chunk's mesh from a snapshot
pub struct BuildRequest {
    pub coord: ChunkCoord,
    pub priority: f32,
    pub input: MeshInput,
}

/// Finished build. `mesh` is `None` when the chunk produced zero quads.
pub struct BuildResult {
    pub coord: ChunkCoord,
    pub mesh: Option<MeshData>,
}

/// Concurrent mesh builder
pub struct MeshWorker {
    request_tx: mpsc::UnboundedSender<BuildRequest>,
    result_rx: mpsc::UnboundedReceiver<BuildResult>,
    pending: HashSet<ChunkCoord>,
    _runtime: Runtime,
}

impl MeshWorker {
    /// Create a worker with at most `max_concurrent` builds in flight.
    pub fn new(max_concurrent: usize) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<BuildRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<BuildResult>();

        let runtime = Runtime::new().expect("failed to create tokio runtime");

        runtime.spawn(async move {
            worker_loop(max_concurrent, &mut request_rx, result_tx).await;
        });

        Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
            _runtime: runtime,
        }
    }

    /// Queue a build over an owned snapshot. Returns `false` if a build for
    /// this chunk is already pending.
    pub fn request(&mut self, coord: ChunkCoord, priority: f32, input: MeshInput) -> bool {
        if !self.pending.insert(coord) {
            return false;
        }
        self.request_tx
            .send(BuildRequest {
                coord,
                priority,
                input,
            })
            .expect("mesh worker died");
        true
    }

    /// Drain all finished builds (non-blocking).
    pub fn poll_results(&mut self) -> Vec<BuildResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.pending.remove(&result.coord);
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
}

async fn worker_loop(
    max_concurrent: usize,
    request_rx: &mut mpsc::UnboundedReceiver<BuildRequest>,
    result_tx: mpsc::UnboundedSender<BuildResult>,
) {
    let mut active = JoinSet::new();
    let mut queued: Vec<BuildRequest> = Vec::new();

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
                        log::error!("mesh build task panicked: {e}");
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
            active.spawn_blocking(move || BuildResult {
                coord: request.coord,
                mesh: build_mesh(&request.input),
            });
        }
    }
}
