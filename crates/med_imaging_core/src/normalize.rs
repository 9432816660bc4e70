//! crates/med_imaging_core/src/normalize.rs
//!
//! Decodes an uploaded byte blob, rescales it to the fixed display width and
//! stages the result in a per-request temporary artifact.

use std::io::{Cursor, Write};
use std::path::Path;

use image::{imageops::FilterType, ImageFormat};
use tempfile::NamedTempFile;

use crate::domain::{NormalizedImage, DISPLAY_WIDTH};

/// Errors from the normalization step. All of these abort the request before
/// any remote call is made.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Image has a zero dimension")]
    DegenerateImage,
    #[error("Could not stage temporary image artifact: {0}")]
    Artifact(#[from] std::io::Error),
}

/// A uniquely named temporary file holding the encoded resized image.
///
/// The file is created with a random per-request name, so concurrent
/// requests never collide, and it is removed when this value is dropped -
/// on every exit path, including panics unwinding the request scope.
#[derive(Debug)]
pub struct ScopedArtifact {
    file: NamedTempFile,
}

impl ScopedArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Decodes `raw_bytes`, rescales to [`DISPLAY_WIDTH`] preserving the aspect
/// ratio and re-encodes as PNG, both in memory and into a scoped temp file.
pub fn normalize(raw_bytes: &[u8]) -> Result<(NormalizedImage, ScopedArtifact), NormalizeError> {
    let decoded =
        image::load_from_memory(raw_bytes).map_err(|e| NormalizeError::Decode(e.to_string()))?;

    let (orig_w, orig_h) = (decoded.width(), decoded.height());
    if orig_w == 0 || orig_h == 0 {
        return Err(NormalizeError::DegenerateImage);
    }

    let aspect_ratio = f64::from(orig_w) / f64::from(orig_h);
    let new_height = (f64::from(DISPLAY_WIDTH) / aspect_ratio).round().max(1.0) as u32;

    let resized = decoded.resize_exact(DISPLAY_WIDTH, new_height, FilterType::Lanczos3);

    let mut png_bytes = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| NormalizeError::Decode(e.to_string()))?;

    let mut file = NamedTempFile::with_prefix("med-scan-")?;
    file.write_all(&png_bytes)?;
    file.flush()?;

    Ok((
        NormalizedImage {
            width: DISPLAY_WIDTH,
            height: new_height,
            png_bytes,
        },
        ScopedArtifact { file },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 130, 140]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn rescales_to_fixed_width_preserving_aspect() {
        let (normalized, _artifact) = normalize(&png_fixture(100, 50)).unwrap();
        assert_eq!(normalized.width, 500);
        assert_eq!(normalized.height, 250);

        let (normalized, _artifact) = normalize(&png_fixture(300, 200)).unwrap();
        assert_eq!(normalized.width, 500);
        // 500 / (300/200) = 333.33 -> 333, allow the rounding pixel.
        assert!((normalized.height as i64 - 333).abs() <= 1);
    }

    #[test]
    fn upscales_small_images_too() {
        let (normalized, _artifact) = normalize(&png_fixture(50, 100)).unwrap();
        assert_eq!(normalized.width, 500);
        assert_eq!(normalized.height, 1000);
    }

    #[test]
    fn output_bytes_are_a_decodable_png_of_the_new_size() {
        let (normalized, _artifact) = normalize(&png_fixture(200, 100)).unwrap();
        let reread = image::load_from_memory(&normalized.png_bytes).unwrap();
        assert_eq!(reread.width(), normalized.width);
        assert_eq!(reread.height(), normalized.height);
    }

    #[test]
    fn zero_height_input_fails_cleanly() {
        // A syntactically valid PNG declaring 1x0 dimensions: signature plus
        // an IHDR chunk with a correct CRC, so the decoder reaches its
        // dimension validation rather than bailing on framing.
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]); // IHDR length
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&[
            0x00, 0x00, 0x00, 0x01, // width = 1
            0x00, 0x00, 0x00, 0x00, // height = 0
            0x08, 0x00, 0x00, 0x00, 0x00, // 8-bit grayscale, no interlace
        ]);
        bytes.extend_from_slice(&[0xF1, 0x22, 0x48, 0xF0]); // CRC

        let err = normalize(&bytes).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::Decode(_) | NormalizeError::DegenerateImage
        ));
    }

    #[test]
    fn corrupt_bytes_fail_with_decode_error() {
        let err = normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));

        // A truncated PNG header alone is not decodable either.
        let err = normalize(&png_fixture(10, 10)[..20]).unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));
    }

    #[test]
    fn artifact_exists_while_scoped_and_is_removed_on_drop() {
        let (normalized, artifact) = normalize(&png_fixture(64, 64)).unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), normalized.png_bytes);

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn artifact_paths_are_unique_per_request() {
        let bytes = png_fixture(32, 32);
        let (_, a) = normalize(&bytes).unwrap();
        let (_, b) = normalize(&bytes).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
