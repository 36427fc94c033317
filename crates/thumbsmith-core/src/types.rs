//! Core data types flowing through the thumbnail pipeline.
//!
//! Ownership follows the pipeline: a [`SourceDescriptor`] becomes a
//! [`FetchJob`] when its staging file name is derived, a [`LocalArtifact`]
//! once staged on disk, and one [`ThumbnailVariant`] per configured width
//! once resized. The artifact's backing file is deleted by the resize stage,
//! ending its lifetime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Locator for one fetchable input (a URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// The source URL
    pub url: String,
}

impl SourceDescriptor {
    /// Create a new descriptor from anything string-like.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A source paired with the unique staging file name derived for it.
///
/// File names are fixed before the run starts so that concurrent workers
/// never write the same path.
#[derive(Debug, Clone)]
pub struct FetchJob {
    /// Where to fetch from
    pub source: SourceDescriptor,
    /// Unique file name inside the staging directory
    pub file_name: String,
}

/// A locally staged, decodable unit of input data.
///
/// `file_name` doubles as the artifact's id: it is unique within a run and
/// names every variant derived from it.
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    /// Unique file name (artifact id)
    pub file_name: String,
    /// Full path of the staged file
    pub path: PathBuf,
    /// Staged size in bytes
    pub size_bytes: u64,
}

/// One resize target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSpec {
    /// Target width in pixels; height is derived to preserve aspect ratio
    pub target_width: u32,
}

/// One resized output derived from one artifact at one target width.
#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailVariant {
    /// File name of the source artifact
    pub source: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels (aspect-preserving)
    pub height: u32,
    /// Encoded size in bytes
    pub size_bytes: u64,
    /// Where the variant was written
    pub path: PathBuf,
}

/// Derive unique staging file names for an ordered list of sources.
///
/// The name is the final path segment of the URL (query and fragment
/// stripped), falling back to `download` when the URL has no usable segment.
/// Repeated base names are disambiguated with an occurrence suffix before
/// the extension (`photo.jpg`, `photo-2.jpg`, ...). Derivation is a pure
/// function of the input order, so re-runs map the same sources to the same
/// paths.
pub fn staging_file_names(sources: &[SourceDescriptor]) -> Vec<FetchJob> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    sources
        .iter()
        .map(|source| {
            let base = url_file_name(&source.url);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let file_name = if *count == 1 {
                base
            } else {
                let (stem, ext) = split_extension(&base);
                format!("{stem}-{count}{ext}")
            };
            FetchJob {
                source: source.clone(),
                file_name,
            }
        })
        .collect()
}

/// Build the output name for one variant: `{stem}_{width}.{ext}`.
pub fn variant_file_name(file_name: &str, width: u32) -> String {
    let (stem, ext) = split_extension(file_name);
    format!("{stem}_{width}{ext}")
}

/// Extract the last path segment of a URL, without query or fragment.
fn url_file_name(url: &str) -> String {
    let trimmed = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or_default();
    // Scheme remnants ("https:") or an empty host mean there was no real path
    if segment.is_empty() || segment.ends_with(':') {
        "download".to_string()
    } else {
        segment.to_string()
    }
}

/// Split `photo.jpg` into `("photo", ".jpg")`; names without a dot keep an
/// empty extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(urls: &[&str]) -> Vec<SourceDescriptor> {
        urls.iter().map(|url| SourceDescriptor::new(*url)).collect()
    }

    #[test]
    fn test_url_file_name() {
        assert_eq!(url_file_name("http://example.com/a/photo.jpg"), "photo.jpg");
        assert_eq!(url_file_name("http://example.com/photo.jpg?w=1"), "photo.jpg");
        assert_eq!(url_file_name("http://example.com/photo.jpg#frag"), "photo.jpg");
        assert_eq!(url_file_name("http://example.com/"), "download");
        assert_eq!(url_file_name("http://example.com"), "download");
    }

    #[test]
    fn test_staging_names_unique_for_duplicates() {
        let jobs = staging_file_names(&sources(&[
            "http://a.example/photo.jpg",
            "http://b.example/photo.jpg",
            "http://c.example/photo.jpg",
            "http://d.example/other.png",
        ]));
        let names: Vec<_> = jobs.iter().map(|j| j.file_name.as_str()).collect();
        assert_eq!(names, ["photo.jpg", "photo-2.jpg", "photo-3.jpg", "other.png"]);
    }

    #[test]
    fn test_staging_names_deterministic() {
        let urls = sources(&["http://a.example/x.png", "http://b.example/x.png"]);
        assert_eq!(
            staging_file_names(&urls)
                .iter()
                .map(|j| j.file_name.clone())
                .collect::<Vec<_>>(),
            staging_file_names(&urls)
                .iter()
                .map(|j| j.file_name.clone())
                .collect::<Vec<_>>(),
        );
    }

    #[test]
    fn test_variant_file_name() {
        assert_eq!(variant_file_name("photo.jpg", 64), "photo_64.jpg");
        assert_eq!(variant_file_name("archive.tar.gz", 32), "archive.tar_32.gz");
        assert_eq!(variant_file_name("noext", 200), "noext_200");
        assert_eq!(variant_file_name(".hidden", 32), ".hidden_32");
    }
}
