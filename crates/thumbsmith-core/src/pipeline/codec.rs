//! Decoding, aspect-preserving resizing, and encoding of staged artifacts.
//!
//! Variants keep the source's format: a staged `photo.jpg` produces JPEG
//! thumbnails, a `logo.png` produces PNGs. The format is detected from the
//! file content, not the extension.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

use crate::config::ResizeConfig;
use crate::error::PipelineError;

/// Image codec with a configurable resampling filter.
pub struct Codec {
    filter: FilterType,
}

/// Result of decoding a staged artifact.
pub struct DecodedArtifact {
    /// The decoded pixel data
    pub image: DynamicImage,
    /// Detected source format, reused when encoding variants
    pub format: ImageFormat,
    /// Source width in pixels
    pub width: u32,
    /// Source height in pixels
    pub height: u32,
}

impl Codec {
    /// Create a codec from the resize configuration.
    ///
    /// An unrecognized filter name falls back to Lanczos3 with a warning;
    /// it is not worth failing a run over.
    pub fn new(config: &ResizeConfig) -> Self {
        let filter = filter_from_name(&config.filter).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown resize filter '{}', falling back to lanczos3",
                config.filter
            );
            FilterType::Lanczos3
        });
        Self { filter }
    }

    /// Decode a staged file, detecting the format from its content.
    pub fn decode(&self, path: &Path) -> Result<DecodedArtifact, PipelineError> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read staged file: {e}"),
        })?;

        let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {e}"),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unknown image format".to_string(),
            })?,
        };
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedArtifact {
            image,
            format,
            width,
            height,
        })
    }

    /// Resize to `target_width`, deriving the height from the aspect ratio.
    pub fn resize(&self, image: &DynamicImage, target_width: u32) -> DynamicImage {
        let (width, height) = image.dimensions();
        let target_height = scaled_height(width, height, target_width);
        image.resize_exact(target_width, target_height, self.filter)
    }

    /// Encode `image` at `dest` in the given format, returning the encoded
    /// size in bytes. An existing file at `dest` is overwritten.
    pub fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        dest: &Path,
    ) -> Result<u64, PipelineError> {
        image
            .save_with_format(dest, format)
            .map_err(|e| PipelineError::Resize {
                path: dest.to_path_buf(),
                width: image.width(),
                message: e.to_string(),
            })?;
        let meta = std::fs::metadata(dest).map_err(|e| PipelineError::Resize {
            path: dest.to_path_buf(),
            width: image.width(),
            message: format!("Cannot stat encoded variant: {e}"),
        })?;
        Ok(meta.len())
    }
}

/// `round(height * target_width / width)`, clamped to at least one pixel.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (f64::from(height) * f64::from(target_width) / f64::from(width)).round() as u32;
    scaled.max(1)
}

/// Map a config filter name to the image crate's filter type.
pub fn filter_from_name(name: &str) -> Option<FilterType> {
    match name {
        "nearest" => Some(FilterType::Nearest),
        "triangle" => Some(FilterType::Triangle),
        "catmull-rom" => Some(FilterType::CatmullRom),
        "gaussian" => Some(FilterType::Gaussian),
        "lanczos3" => Some(FilterType::Lanczos3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_height_preserves_aspect_ratio() {
        assert_eq!(scaled_height(1000, 500, 200), 100);
        assert_eq!(scaled_height(640, 480, 32), 24);
        // Rounds rather than truncates
        assert_eq!(scaled_height(1000, 375, 200), 75);
        assert_eq!(scaled_height(3, 2, 200), 133);
    }

    #[test]
    fn test_scaled_height_never_zero() {
        assert_eq!(scaled_height(10_000, 10, 32), 1);
    }

    #[test]
    fn test_filter_from_name() {
        assert_eq!(filter_from_name("lanczos3"), Some(FilterType::Lanczos3));
        assert_eq!(filter_from_name("nearest"), Some(FilterType::Nearest));
        assert_eq!(filter_from_name("bicubic"), None);
    }

    #[test]
    fn test_resize_dimensions() {
        let codec = Codec::new(&ResizeConfig::default());
        let image = DynamicImage::new_rgb8(400, 300);

        let resized = codec.resize(&image, 64);
        assert_eq!(resized.dimensions(), (64, 48));
    }

    #[test]
    fn test_decode_and_encode_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("source.png");

        let image = DynamicImage::new_rgb8(120, 80);
        image.save_with_format(&staged, ImageFormat::Png).unwrap();

        let codec = Codec::new(&ResizeConfig::default());
        let decoded = codec.decode(&staged).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (120, 80));

        let dest = dir.path().join("source_32.png");
        let size = codec
            .encode(&codec.resize(&decoded.image, 32), decoded.format, &dest)
            .unwrap();
        assert!(size > 0);
        assert_eq!(size, std::fs::metadata(&dest).unwrap().len());
    }

    #[test]
    fn test_decode_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("not-an-image.jpg");
        std::fs::write(&staged, b"plain text, not pixels").unwrap();

        let codec = Codec::new(&ResizeConfig::default());
        assert!(matches!(
            codec.decode(&staged),
            Err(PipelineError::Decode { .. })
        ));
    }
}
