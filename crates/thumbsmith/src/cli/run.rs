//! The `thumbsmith run` command: one pipeline run over a list of URLs.

use clap::Args;
use std::path::PathBuf;

use thumbsmith_core::{Config, RunStats, SourceDescriptor, ThumbnailPipeline};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image URLs to fetch
    pub urls: Vec<String>,

    /// Read additional URLs from a file (one per line, `#` starts a comment)
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    /// Number of fetch workers (overrides config)
    #[arg(long)]
    pub fetch_workers: Option<usize>,

    /// Number of resize workers; 0 = one per CPU (overrides config)
    #[arg(long)]
    pub resize_workers: Option<usize>,

    /// Target widths, comma-separated (overrides config)
    #[arg(long, value_delimiter = ',')]
    pub widths: Vec<u32>,

    /// Staging directory for fetched originals (overrides config)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output directory for thumbnail variants (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Per-request fetch timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print run statistics as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);

    let mut urls = args.urls.clone();
    if let Some(path) = &args.urls_file {
        urls.extend(read_urls_file(path)?);
    }
    if urls.is_empty() {
        anyhow::bail!("No URLs given. Pass them as arguments or via --urls-file.");
    }

    let sources: Vec<SourceDescriptor> = urls.iter().map(SourceDescriptor::new).collect();
    let input_count = sources.len();

    let pipeline = ThumbnailPipeline::from_config(&config)?;
    let start = std::time::Instant::now();
    let stats = pipeline.run(sources).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    print_summary(input_count, &stats, start.elapsed());

    Ok(())
}

/// Fold CLI flags into the loaded configuration.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(workers) = args.fetch_workers {
        config.fetch.workers = workers;
    }
    if let Some(workers) = args.resize_workers {
        config.resize.workers = workers;
    }
    if !args.widths.is_empty() {
        config.resize.widths = args.widths.clone();
    }
    if let Some(dir) = &args.input_dir {
        config.storage.input_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(dir) = &args.output_dir {
        config.storage.output_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(secs) = args.timeout {
        config.fetch.timeout_secs = secs;
    }
}

/// Read URLs from a file, one per line; blank lines and `#` comments are
/// skipped.
fn read_urls_file(path: &PathBuf) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read URL file {:?}: {e}", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Print a formatted summary table after a run.
fn print_summary(input_count: usize, stats: &RunStats, elapsed: std::time::Duration) {
    let fetched = input_count as u64 - stats.fetch_failures;
    let mb_down = stats.downloaded_bytes as f64 / 1_000_000.0;
    let mb_out = stats.produced_bytes as f64 / 1_000_000.0;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Sources:      {:>8}", input_count);
    eprintln!("    Fetched:      {:>8}", fetched);
    if stats.fetch_failures > 0 {
        eprintln!("    Fetch fails:  {:>8}", stats.fetch_failures);
    }
    if stats.resize_failures > 0 {
        eprintln!("    Resize fails: {:>8}", stats.resize_failures);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Variants:     {:>8}", stats.variants_written);
    eprintln!("    Downloaded:   {:>7.1} MB", mb_down);
    eprintln!("    Produced:     {:>7.1} MB", mb_out);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_urls_file_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(
            &path,
            "# staging hosts\nhttp://a.example/1.jpg\n\n  http://b.example/2.jpg  \n# done\n",
        )
        .unwrap();

        let urls = read_urls_file(&path).unwrap();
        assert_eq!(urls, ["http://a.example/1.jpg", "http://b.example/2.jpg"]);
    }

    #[test]
    fn test_read_urls_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.txt");
        assert!(read_urls_file(&path).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let args = RunArgs {
            urls: vec![],
            urls_file: None,
            fetch_workers: Some(8),
            resize_workers: Some(2),
            widths: vec![48, 96],
            input_dir: Some(PathBuf::from("/tmp/in")),
            output_dir: Some(PathBuf::from("/tmp/out")),
            timeout: Some(10),
            json: false,
        };

        apply_overrides(&mut config, &args);
        assert_eq!(config.fetch.workers, 8);
        assert_eq!(config.resize.workers, 2);
        assert_eq!(config.resize.widths, vec![48, 96]);
        assert_eq!(config.storage.input_dir, "/tmp/in");
        assert_eq!(config.storage.output_dir, "/tmp/out");
        assert_eq!(config.fetch.timeout_secs, 10);
    }

    #[test]
    fn test_apply_overrides_keeps_config_defaults() {
        let mut config = Config::default();
        let args = RunArgs {
            urls: vec!["http://a.example/1.jpg".to_string()],
            urls_file: None,
            fetch_workers: None,
            resize_workers: None,
            widths: vec![],
            input_dir: None,
            output_dir: None,
            timeout: None,
            json: false,
        };

        apply_overrides(&mut config, &args);
        assert_eq!(config.fetch.workers, 4);
        assert_eq!(config.resize.widths, vec![32, 64, 200]);
    }
}
