//! Thumbsmith Core - Embeddable thumbnail pipeline library.
//!
//! Thumbsmith fetches remote images and produces resized variants at a set
//! of target widths, overlapping network I/O with CPU-bound resizing.
//!
//! # Architecture
//!
//! Two worker pools connected by a joinable queue:
//!
//! ```text
//! URLs → [fetch pool] → artifact queue → [resize pool] → variants + stats
//! ```
//!
//! The fetch pool is small and fixed (I/O bound); the resize pool defaults
//! to one worker per CPU (compute bound). The controller waits for the
//! fetch side to drain, then shuts the resize pool down with one
//! end-of-stream marker per worker.
//!
//! # Usage
//!
//! ```rust,ignore
//! use thumbsmith_core::{Config, SourceDescriptor, ThumbnailPipeline};
//!
//! #[tokio::main]
//! async fn main() -> thumbsmith_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = ThumbnailPipeline::from_config(&config)?;
//!
//!     let sources = vec![SourceDescriptor::new("https://example.com/photo.jpg")];
//!     let stats = pipeline.run(sources).await?;
//!     println!("{} bytes downloaded", stats.downloaded_bytes);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, FetchError, PipelineError, PipelineResult, Result, ThumbsmithError,
};
pub use pipeline::{Fetcher, HttpFetcher, Message, ThumbnailPipeline, WorkQueue};
pub use stats::{Counters, RunStats};
pub use types::{
    FetchJob, LocalArtifact, SourceDescriptor, ThumbnailSpec, ThumbnailVariant,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
