//! Thumbnail production: the CPU-bound half of the pipeline.
//!
//! Workers pull staged artifacts off the inter-stage queue, decode each one
//! once, and produce every configured variant in spec order on the blocking
//! thread pool. An artifact either yields its full variant set or none:
//! on a mid-artifact failure the variants already written are removed, the
//! staged source is left in place for retry tooling, and the worker moves on.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::{PipelineError, PipelineResult};
use crate::stats::Counters;
use crate::types::{variant_file_name, LocalArtifact, ThumbnailSpec, ThumbnailVariant};

use super::codec::Codec;
use super::queue::{Message, WorkQueue};
use super::spawn_pool;

/// The resize worker pool: consumes artifacts, produces variant files.
pub struct ResizeStage {
    codec: Arc<Codec>,
    specs: Arc<Vec<ThumbnailSpec>>,
    artifacts: Arc<WorkQueue<Message<LocalArtifact>>>,
    counters: Arc<Counters>,
    output_dir: PathBuf,
}

impl ResizeStage {
    pub fn new(
        codec: Arc<Codec>,
        specs: Vec<ThumbnailSpec>,
        artifacts: Arc<WorkQueue<Message<LocalArtifact>>>,
        counters: Arc<Counters>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            codec,
            specs: Arc::new(specs),
            artifacts,
            counters,
            output_dir,
        }
    }

    /// Start `workers` resize workers on the runtime.
    pub fn spawn(self: &Arc<Self>, workers: usize) -> Vec<JoinHandle<()>> {
        spawn_pool(workers, |id| {
            let stage = Arc::clone(self);
            async move { stage.worker(id).await }
        })
    }

    /// Worker loop: pop an artifact, produce its variants, acknowledge it.
    /// Exits on the end-of-stream marker. The acknowledgment runs on success
    /// and failure alike, so drain accounting never stalls on a bad item.
    async fn worker(&self, id: usize) {
        loop {
            match self.artifacts.pop().await {
                Message::Work(artifact) => {
                    let path = artifact.path.clone();
                    match self.process(artifact).await {
                        Ok(variants) => {
                            tracing::debug!(
                                "resized {:?} into {} variants",
                                path,
                                variants.len()
                            );
                        }
                        Err(e) => {
                            tracing::warn!("skipping artifact {:?}: {}", path, e);
                            self.counters.record_resize_failure();
                        }
                    }
                    self.artifacts.mark_done();
                }
                Message::Shutdown => {
                    tracing::trace!(worker = id, "resize worker exiting");
                    self.artifacts.mark_done();
                    break;
                }
            }
        }
    }

    /// Produce all variants for one artifact on the blocking pool, then
    /// update the shared counters and delete the staged source.
    async fn process(&self, artifact: LocalArtifact) -> PipelineResult<Vec<ThumbnailVariant>> {
        let codec = Arc::clone(&self.codec);
        let specs = Arc::clone(&self.specs);
        let output_dir = self.output_dir.clone();

        let (variants, produced_bytes) =
            tokio::task::spawn_blocking(move || produce_variants(&codec, &specs, &output_dir, &artifact))
                .await
                .map_err(|e| PipelineError::Worker {
                    stage: "resize",
                    message: e.to_string(),
                })??;

        self.counters.add_produced(produced_bytes);
        self.counters.add_variants(variants.len() as u64);
        Ok(variants)
    }
}

/// Decode once, then resize and encode per spec, in spec order.
///
/// Returns the variants plus their total encoded size. On any failure the
/// variants written so far are removed and the staged source kept.
fn produce_variants(
    codec: &Codec,
    specs: &[ThumbnailSpec],
    output_dir: &PathBuf,
    artifact: &LocalArtifact,
) -> PipelineResult<(Vec<ThumbnailVariant>, u64)> {
    let decoded = codec.decode(&artifact.path)?;

    let mut variants = Vec::with_capacity(specs.len());
    let mut produced_bytes: u64 = 0;

    for spec in specs {
        let resized = codec.resize(&decoded.image, spec.target_width);
        let dest = output_dir.join(variant_file_name(&artifact.file_name, spec.target_width));

        match codec.encode(&resized, decoded.format, &dest) {
            Ok(size_bytes) => {
                produced_bytes += size_bytes;
                variants.push(ThumbnailVariant {
                    source: artifact.file_name.clone(),
                    width: resized.width(),
                    height: resized.height(),
                    size_bytes,
                    path: dest,
                });
            }
            Err(e) => {
                discard_partial_set(&variants);
                return Err(e);
            }
        }
    }

    // Variants are complete; the artifact's lifetime ends here. A failed
    // delete leaves a stale staging file but the output is already valid.
    if let Err(e) = std::fs::remove_file(&artifact.path) {
        tracing::warn!("could not remove staged file {:?}: {}", artifact.path, e);
    }

    Ok((variants, produced_bytes))
}

/// Partial variant sets are not a valid terminal state; remove what was
/// written before the failure.
fn discard_partial_set(variants: &[ThumbnailVariant]) {
    for variant in variants {
        if let Err(e) = std::fs::remove_file(&variant.path) {
            tracing::warn!("could not remove partial variant {:?}: {}", variant.path, e);
        }
    }
}
