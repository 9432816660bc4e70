//! crates/med_imaging_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

/// Target display width for every normalized image, in pixels.
pub const DISPLAY_WIDTH: u32 = 500;

/// Represents a user account - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

// Only used internally for signup/login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password_hash: String,
}

/// MIME subtypes accepted at the upload boundary, before any decoding runs.
pub const SUPPORTED_MIME_SUBTYPES: [&str; 5] = ["jpeg", "jpg", "png", "bmp", "gif"];

/// An image as it arrives from the upload boundary: raw bytes plus the
/// MIME type the client declared for them.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub raw_bytes: Vec<u8>,
    pub declared_mime_type: String,
}

impl UploadedImage {
    pub fn new(raw_bytes: Vec<u8>, declared_mime_type: impl Into<String>) -> Self {
        Self {
            raw_bytes,
            declared_mime_type: declared_mime_type.into(),
        }
    }

    /// Whether the declared type is on the raster-format allow-list.
    /// Accepts a full MIME type (`image/png`) or a bare subtype (`png`).
    pub fn mime_type_supported(&self) -> bool {
        let subtype = self
            .declared_mime_type
            .strip_prefix("image/")
            .unwrap_or(&self.declared_mime_type);
        SUPPORTED_MIME_SUBTYPES.contains(&subtype)
    }
}

/// A decoded upload rescaled to [`DISPLAY_WIDTH`] with its aspect ratio
/// preserved, re-encoded as PNG.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub width: u32,
    pub height: u32,
    pub png_bytes: Vec<u8>,
}

/// The outcome of one analysis request: the model's markdown report and the
/// resized image it was produced from, ready for display.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub markdown_text: String,
    pub image: NormalizedImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_the_supported_image_subtypes() {
        for ok in ["image/jpeg", "image/jpg", "image/png", "image/bmp", "image/gif", "gif"] {
            assert!(
                UploadedImage::new(vec![], ok).mime_type_supported(),
                "{ok} should be accepted"
            );
        }
        for bad in ["image/tiff", "image/webp", "application/pdf", "text/plain", ""] {
            assert!(
                !UploadedImage::new(vec![], bad).mime_type_supported(),
                "{bad} should be rejected"
            );
        }
    }
}
