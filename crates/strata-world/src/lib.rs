//! Live chunk orchestration: the resident chunk map, its load → mesh → save
//! lifecycle over the job scheduler, and radius-based streaming.

mod chunk_manager;
mod streaming;

pub use chunk_manager::{ChunkManager, MeshSink, UpdateStats};
pub use streaming::{ChunkStreamer, StreamTickResult, StreamingConfig};
