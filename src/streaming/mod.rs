//! Chunk streaming: the synchronous store driver plus its bounded async
//! loader and mesh worker.

pub mod loader;
pub mod mesher;
pub mod store;

pub use loader::{LoadRequest, LoadResult, RegionLoader};
pub use mesher::{BuildRequest, BuildResult, MeshWorker};
pub use store::ChunkStore;
