//! Image downscaling seam for embedded uploads.
//!
//! # Responsibility
//! - Decide which payloads are eligible for lossy compression.
//! - Expose the codec as a trait so hosts can plug in a real encoder.
//!
//! # Invariants
//! - Only image MIME types above the configured threshold are transcoded.
//! - Non-image payloads always pass through unmodified.

use crate::store::{CompressionSettings, StoreResult};

/// Lossy re-encoder applied to oversized embedded images.
///
/// Implementations receive the bounded-dimension/quality parameters and
/// return the payload to embed. The default implementation passes bytes
/// through untouched.
pub trait ImageTranscoder {
    fn transcode(
        &self,
        bytes: &[u8],
        mime_type: &str,
        settings: &CompressionSettings,
    ) -> StoreResult<Vec<u8>>;
}

/// Transcoder that embeds every payload as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranscoder;

impl ImageTranscoder for PassthroughTranscoder {
    fn transcode(
        &self,
        bytes: &[u8],
        _mime_type: &str,
        _settings: &CompressionSettings,
    ) -> StoreResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// Returns whether `mime_type` names an image format.
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.to_ascii_lowercase().starts_with("image/")
}

/// Returns whether a payload qualifies for the compression pass.
pub fn should_compress(mime_type: &str, size: u64, settings: &CompressionSettings) -> bool {
    is_image_mime(mime_type) && size > settings.image_threshold_bytes
}

#[cfg(test)]
mod tests {
    use super::{is_image_mime, should_compress};
    use crate::store::CompressionSettings;

    #[test]
    fn only_large_images_qualify() {
        let settings = CompressionSettings {
            image_threshold_bytes: 100,
            ..CompressionSettings::default()
        };
        assert!(should_compress("image/png", 101, &settings));
        assert!(!should_compress("image/png", 100, &settings));
        assert!(!should_compress("application/pdf", 10_000, &settings));
    }

    #[test]
    fn mime_detection_is_case_insensitive() {
        assert!(is_image_mime("IMAGE/JPEG"));
        assert!(!is_image_mime("application/octet-stream"));
    }
}
