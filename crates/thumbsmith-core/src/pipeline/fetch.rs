//! Source fetching: the I/O-bound half of the pipeline.
//!
//! Workers pull [`FetchJob`]s from the input queue and stage each source in
//! the input directory. Every successful artifact is published onto the
//! inter-stage queue immediately, so resizing starts while later fetches are
//! still in flight. One failing source never stops the batch.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::FetchError;
use crate::stats::Counters;
use crate::types::{FetchJob, LocalArtifact, SourceDescriptor};

use super::queue::{Message, WorkQueue};
use super::spawn_pool;

/// Stages the bytes behind a source descriptor on local storage.
///
/// Implementations decide transport and timeout policy; the pipeline treats
/// any error uniformly as a skip-and-log.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Stage the resource at `dest`, returning the staged size in bytes.
    async fn fetch(&self, source: &SourceDescriptor, dest: &Path) -> Result<u64, FetchError>;
}

/// HTTP fetcher streaming response bodies straight to disk.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &SourceDescriptor, dest: &Path) -> Result<u64, FetchError> {
        use futures_util::StreamExt;
        use tokio::io::AsyncWriteExt;

        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: source.url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: source.url.clone(),
                status: status.as_u16(),
            });
        }

        let stage_err = |e: std::io::Error| FetchError::Stage {
            url: source.url.clone(),
            path: dest.to_path_buf(),
            source: e,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(stage_err)?;
        let mut stream = response.bytes_stream();
        let mut staged: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Request {
                url: source.url.clone(),
                source: e,
            })?;
            file.write_all(&chunk).await.map_err(stage_err)?;
            staged += chunk.len() as u64;
        }
        file.flush().await.map_err(stage_err)?;

        Ok(staged)
    }
}

/// The fetch worker pool: drains the input queue into local artifacts.
pub struct FetchStage {
    fetcher: Arc<dyn Fetcher>,
    input: Arc<WorkQueue<Message<FetchJob>>>,
    artifacts: Arc<WorkQueue<Message<LocalArtifact>>>,
    counters: Arc<Counters>,
    input_dir: PathBuf,
}

impl FetchStage {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        input: Arc<WorkQueue<Message<FetchJob>>>,
        artifacts: Arc<WorkQueue<Message<LocalArtifact>>>,
        counters: Arc<Counters>,
        input_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            input,
            artifacts,
            counters,
            input_dir,
        }
    }

    /// Start `workers` fetch workers on the runtime.
    pub fn spawn(self: &Arc<Self>, workers: usize) -> Vec<JoinHandle<()>> {
        spawn_pool(workers, |id| {
            let stage = Arc::clone(self);
            async move { stage.worker(id).await }
        })
    }

    /// Worker loop: pop a job, attempt it, acknowledge it. Exits on the
    /// end-of-stream marker.
    async fn worker(&self, id: usize) {
        loop {
            match self.input.pop().await {
                Message::Work(job) => {
                    self.fetch_one(job).await;
                    self.input.mark_done();
                }
                Message::Shutdown => {
                    tracing::trace!(worker = id, "fetch worker exiting");
                    self.input.mark_done();
                    break;
                }
            }
        }
    }

    async fn fetch_one(&self, job: FetchJob) {
        let dest = self.input_dir.join(&job.file_name);
        match self.fetcher.fetch(&job.source, &dest).await {
            Ok(size_bytes) => {
                tracing::debug!("downloaded {} [{} bytes] to {:?}", job.source, size_bytes, dest);
                self.counters.add_downloaded(size_bytes);
                self.artifacts.push(Message::Work(LocalArtifact {
                    file_name: job.file_name,
                    path: dest,
                    size_bytes,
                }));
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", job.source, e);
                self.counters.record_fetch_failure();
            }
        }
    }
}
