//! End-to-end pipeline runs against an in-memory fetcher.
//!
//! No network: the mock fetcher serves PNG bytes generated with the image
//! crate, and everything else (staging, resizing, accounting, shutdown) is
//! the real pipeline.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thumbsmith_core::{
    Config, FetchError, Fetcher, RunStats, SourceDescriptor, ThumbnailPipeline,
};

/// Serves canned bytes per URL; unknown URLs fail like a 404.
struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

impl MockFetcher {
    fn new() -> Self {
        Self {
            bodies: HashMap::new(),
        }
    }

    fn serve(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, source: &SourceDescriptor, dest: &Path) -> Result<u64, FetchError> {
        let bytes = self.bodies.get(&source.url).ok_or_else(|| FetchError::Status {
            url: source.url.clone(),
            status: 404,
        })?;
        tokio::fs::write(dest, bytes)
            .await
            .map_err(|e| FetchError::Stage {
                url: source.url.clone(),
                path: dest.to_path_buf(),
                source: e,
            })?;
        Ok(bytes.len() as u64)
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn test_config(staging: &Path, output: &Path) -> Config {
    let mut config = Config::default();
    config.storage.input_dir = staging.to_string_lossy().into_owned();
    config.storage.output_dir = output.to_string_lossy().into_owned();
    config.fetch.workers = 2;
    config.resize.workers = 2;
    config
}

fn sources(urls: &[&str]) -> Vec<SourceDescriptor> {
    urls.iter().map(|url| SourceDescriptor::new(*url)).collect()
}

fn output_files(output: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(output)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn run(fetcher: MockFetcher, config: &Config, urls: &[&str]) -> RunStats {
    let pipeline = ThumbnailPipeline::with_fetcher(Arc::new(fetcher), config).unwrap();
    tokio::time::timeout(Duration::from_secs(30), pipeline.run(sources(urls)))
        .await
        .expect("pipeline run did not terminate")
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_run_produces_one_variant_per_width() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());

    let fetcher = MockFetcher::new()
        .serve("http://imgs.example/alpha.png", png_bytes(400, 300))
        .serve("http://imgs.example/beta.png", png_bytes(640, 480))
        .serve("http://imgs.example/gamma.png", png_bytes(200, 200));

    let stats = run(
        fetcher,
        &config,
        &[
            "http://imgs.example/alpha.png",
            "http://imgs.example/beta.png",
            "http://imgs.example/gamma.png",
        ],
    )
    .await;

    assert_eq!(stats.variants_written, 9);
    assert_eq!(stats.fetch_failures, 0);
    assert_eq!(stats.resize_failures, 0);
    assert!(stats.downloaded_bytes > 0);
    assert!(stats.produced_bytes > 0);

    assert_eq!(
        output_files(output.path()),
        [
            "alpha_200.png",
            "alpha_32.png",
            "alpha_64.png",
            "beta_200.png",
            "beta_32.png",
            "beta_64.png",
            "gamma_200.png",
            "gamma_32.png",
            "gamma_64.png",
        ]
    );

    // Staged originals are consumed once their variants exist
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_input_terminates_with_zero_stats() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());

    let stats = run(MockFetcher::new(), &config, &[]).await;

    assert_eq!(stats, RunStats::default());
    assert_eq!(output_files(output.path()).len(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_source_does_not_stop_the_batch() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());

    // missing.png is not served and fails with a 404
    let fetcher = MockFetcher::new()
        .serve("http://imgs.example/alpha.png", png_bytes(400, 300))
        .serve("http://imgs.example/beta.png", png_bytes(300, 400));

    let stats = run(
        fetcher,
        &config,
        &[
            "http://imgs.example/alpha.png",
            "http://imgs.example/missing.png",
            "http://imgs.example/beta.png",
        ],
    )
    .await;

    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(stats.variants_written, 6);
    assert_eq!(output_files(output.path()).len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn undecodable_artifact_is_skipped_whole() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());

    let fetcher = MockFetcher::new()
        .serve("http://imgs.example/good.png", png_bytes(400, 300))
        .serve(
            "http://imgs.example/corrupt.png",
            b"these bytes are not an image".to_vec(),
        );

    let stats = run(
        fetcher,
        &config,
        &[
            "http://imgs.example/good.png",
            "http://imgs.example/corrupt.png",
        ],
    )
    .await;

    assert_eq!(stats.resize_failures, 1);
    assert_eq!(stats.variants_written, 3);
    // No partial variant set for the corrupt artifact
    assert_eq!(
        output_files(output.path()),
        ["good_200.png", "good_32.png", "good_64.png"]
    );
    // The failed artifact stays staged for retry tooling
    assert!(staging.path().join("corrupt.png").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn variants_preserve_aspect_ratio() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());

    let fetcher =
        MockFetcher::new().serve("http://imgs.example/wide.png", png_bytes(1000, 375));

    run(fetcher, &config, &["http://imgs.example/wide.png"]).await;

    for (name, expected) in [
        ("wide_32.png", (32, 12)),
        ("wide_64.png", (64, 24)),
        ("wide_200.png", (200, 75)),
    ] {
        let dims = image::image_dimensions(output.path().join(name)).unwrap();
        assert_eq!(dims, expected, "{name}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rerun_overwrites_instead_of_accumulating() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());
    let urls = ["http://imgs.example/alpha.png"];

    let fetcher = || MockFetcher::new().serve(urls[0], png_bytes(400, 300));

    run(fetcher(), &config, &urls).await;
    let first = output_files(output.path());

    run(fetcher(), &config, &urls).await;
    let second = output_files(output.path());

    assert_eq!(first, second);
    assert_eq!(second.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_base_names_do_not_collide() {
    let staging = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = test_config(staging.path(), output.path());

    let fetcher = MockFetcher::new()
        .serve("http://a.example/photo.png", png_bytes(400, 300))
        .serve("http://b.example/photo.png", png_bytes(200, 200));

    let stats = run(
        fetcher,
        &config,
        &["http://a.example/photo.png", "http://b.example/photo.png"],
    )
    .await;

    assert_eq!(stats.variants_written, 6);
    assert_eq!(
        output_files(output.path()),
        [
            "photo-2_200.png",
            "photo-2_32.png",
            "photo-2_64.png",
            "photo_200.png",
            "photo_32.png",
            "photo_64.png",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_counts_do_not_change_byte_accounting() {
    let bodies: Vec<(String, Vec<u8>)> = (0..6)
        .map(|i| {
            (
                format!("http://imgs.example/img{i}.png"),
                png_bytes(100 + 20 * i, 80),
            )
        })
        .collect();
    let expected_download: u64 = bodies.iter().map(|(_, b)| b.len() as u64).sum();

    let mut per_config_stats = Vec::new();
    for (fetch_workers, resize_workers) in [(1, 1), (4, 2), (8, 4)] {
        let staging = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut config = test_config(staging.path(), output.path());
        config.fetch.workers = fetch_workers;
        config.resize.workers = resize_workers;

        let mut fetcher = MockFetcher::new();
        for (url, body) in &bodies {
            fetcher = fetcher.serve(url, body.clone());
        }
        let urls: Vec<&str> = bodies.iter().map(|(url, _)| url.as_str()).collect();

        let stats = run(fetcher, &config, &urls).await;
        assert_eq!(stats.downloaded_bytes, expected_download);
        assert_eq!(stats.variants_written, 18);
        per_config_stats.push(stats);
    }

    // Concurrency must not lose or double-count bytes
    assert_eq!(per_config_stats[0], per_config_stats[1]);
    assert_eq!(per_config_stats[1], per_config_stats[2]);
}
