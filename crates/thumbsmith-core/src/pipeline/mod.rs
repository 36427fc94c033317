//! The two-stage thumbnail pipeline.
//!
//! - **queue**: joinable work queues with the end-of-stream protocol
//! - **codec**: decode, aspect-preserving resize, encode
//! - **fetch**: the I/O-bound fetch stage and its `Fetcher` seam
//! - **resize**: the CPU-bound variant-production stage
//! - **runner**: the controller that wires queues, pools, and shutdown

pub mod codec;
pub mod fetch;
pub mod queue;
pub mod resize;
pub mod runner;

// Re-exports for convenient access
pub use codec::{Codec, DecodedArtifact};
pub use fetch::{FetchStage, Fetcher, HttpFetcher};
pub use queue::{Message, WorkQueue};
pub use resize::ResizeStage;
pub use runner::ThumbnailPipeline;

use std::future::Future;
use tokio::task::JoinHandle;

/// Start `count` workers running the same loop: the one way both stages
/// (and any future execution strategy) put a pool on the runtime.
pub(crate) fn spawn_pool<F, Fut>(count: usize, worker: F) -> Vec<JoinHandle<()>>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    (0..count).map(|id| tokio::spawn(worker(id))).collect()
}
