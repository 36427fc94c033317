//! Pipeline orchestration: queue wiring, pool sizing, and shutdown ordering.
//!
//! One run moves through fixed phases: load the input queue, start the
//! worker pools (resize first, so a just-staged artifact is picked up
//! immediately), wait for the fetch side to drain, append one end-of-stream
//! marker per resize worker, then wait for the resize pool to exit. Markers
//! are enqueued only after the input queue's drain certifies that no
//! further artifacts can be produced, and their count always equals the
//! spawned pool size, so a stalled or premature shutdown cannot occur.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::stats::{Counters, RunStats};
use crate::types::{staging_file_names, SourceDescriptor, ThumbnailSpec};

use super::codec::Codec;
use super::fetch::{FetchStage, Fetcher, HttpFetcher};
use super::queue::{Message, WorkQueue};
use super::resize::ResizeStage;

/// The pipeline controller: owns the queues, sizes the pools, and blocks the
/// caller until a run is observably complete.
pub struct ThumbnailPipeline {
    fetcher: Arc<dyn Fetcher>,
    codec: Arc<Codec>,
    specs: Vec<ThumbnailSpec>,
    fetch_workers: usize,
    resize_workers: usize,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl ThumbnailPipeline {
    /// Build a pipeline from configuration, with the stock HTTP fetcher.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch.timeout_secs))?;
        Self::with_fetcher(Arc::new(fetcher), config)
    }

    /// Build a pipeline with a custom [`Fetcher`].
    ///
    /// The seam used by tests and by embedders with their own transport.
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fetcher,
            codec: Arc::new(Codec::new(&config.resize)),
            specs: config.resize.specs(),
            fetch_workers: config.fetch.workers,
            resize_workers: config.resize.effective_workers(),
            input_dir: config.input_dir(),
            output_dir: config.output_dir(),
        })
    }

    /// Fetch every source and produce all configured variants.
    ///
    /// Per-item failures are logged, counted, and skipped; the returned
    /// stats always reflect everything that did complete. Only setup
    /// failures (directories, worker panics) surface as errors.
    pub async fn run(&self, sources: Vec<SourceDescriptor>) -> Result<RunStats> {
        let start = std::time::Instant::now();

        create_dir(&self.input_dir)?;
        create_dir(&self.output_dir)?;

        let jobs = staging_file_names(&sources);
        let counters = Arc::new(Counters::new());
        let input: Arc<WorkQueue<Message<_>>> = Arc::new(WorkQueue::new());
        let artifacts: Arc<WorkQueue<Message<_>>> = Arc::new(WorkQueue::new());

        // The whole input is known up front, so the fetch side's markers can
        // be enqueued with it: one per fetch worker, after all real jobs.
        for job in jobs {
            input.push(Message::Work(job));
        }
        for _ in 0..self.fetch_workers {
            input.push(Message::Shutdown);
        }

        tracing::info!(
            "starting run: {} sources, {} fetch workers, {} resize workers, widths {:?}",
            sources.len(),
            self.fetch_workers,
            self.resize_workers,
            self.specs.iter().map(|s| s.target_width).collect::<Vec<_>>()
        );

        // Resize pool first, so artifacts are consumed as soon as they land.
        let resize_stage = Arc::new(ResizeStage::new(
            Arc::clone(&self.codec),
            self.specs.clone(),
            Arc::clone(&artifacts),
            Arc::clone(&counters),
            self.output_dir.clone(),
        ));
        let resize_handles = resize_stage.spawn(self.resize_workers);

        let fetch_stage = Arc::new(FetchStage::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&input),
            Arc::clone(&artifacts),
            Arc::clone(&counters),
            self.input_dir.clone(),
        ));
        let fetch_handles = fetch_stage.spawn(self.fetch_workers);

        // Every source fetch-attempted and accounted, markers included.
        input.join().await;
        join_workers(fetch_handles, "fetch").await?;
        tracing::debug!("fetch side drained in {:?}", start.elapsed());

        // No further artifacts can arrive: release the resize pool, exactly
        // one marker per worker.
        for _ in 0..self.resize_workers {
            artifacts.push(Message::Shutdown);
        }
        join_workers(resize_handles, "resize").await?;
        artifacts.join().await;
        tracing::debug!("resize side drained in {:?}", start.elapsed());

        let stats = counters.snapshot();
        tracing::info!(
            "run complete in {:?}: {} bytes downloaded, {} variants ({} bytes) produced, {} fetch / {} resize failures",
            start.elapsed(),
            stats.downloaded_bytes,
            stats.variants_written,
            stats.produced_bytes,
            stats.fetch_failures,
            stats.resize_failures
        );
        Ok(stats)
    }
}

fn create_dir(path: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        PipelineError::Storage {
            path: path.clone(),
            source: e,
        }
        .into()
    })
}

/// Await a worker pool; a panicked or cancelled worker is fatal and must
/// surface as a diagnosable error instead of a silent stall.
async fn join_workers(handles: Vec<JoinHandle<()>>, stage: &'static str) -> Result<()> {
    for handle in handles {
        handle.await.map_err(|e| PipelineError::Worker {
            stage,
            message: e.to_string(),
        })?;
    }
    Ok(())
}
