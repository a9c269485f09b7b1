//! Image decoding with format detection, limits, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::RuntimeLimits;
use crate::error::{PipelineError, RejectionReason};
use crate::types::RawUpload;

use super::metadata::OrientationCorrector;

/// Image decoder with configurable limits and timeout.
pub struct SourceDecoder {
    limits: RuntimeLimits,
}

/// The decoded, orientation-corrected source image plus its raw bytes.
///
/// The raw bytes are kept so the durable original copy can be stored at
/// commit time without re-reading the temp file.
#[derive(Debug)]
pub struct DecodedSource {
    /// Decoded pixel data, upright
    pub image: DynamicImage,
    /// Detected source format
    pub format: ImageFormat,
    /// Width in pixels after orientation correction
    pub width: u32,
    /// Height in pixels after orientation correction
    pub height: u32,
    /// Uploaded size in bytes
    pub byte_len: u64,
    /// Whether the decoded image carries an alpha channel
    pub has_alpha: bool,
    /// The original encoded bytes
    pub bytes: Vec<u8>,
}

impl SourceDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: RuntimeLimits) -> Self {
        Self { limits }
    }

    /// Read and decode the spooled upload, with validation and timeout.
    ///
    /// A decode failure is an [`RejectionReason::Undecodable`] rejection:
    /// it happens before any variant work and leaves nothing behind.
    pub async fn decode(&self, upload: &RawUpload) -> Result<DecodedSource, PipelineError> {
        let bytes = tokio::fs::read(&upload.temp_path)
            .await
            .map_err(|e| PipelineError::TempFile {
                path: upload.temp_path.clone(),
                source: e,
            })?;

        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let decode_result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || Self::decode_bytes_sync(bytes)),
        )
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                if decoded.width > self.limits.max_image_dimension
                    || decoded.height > self.limits.max_image_dimension
                {
                    return Err(PipelineError::ImageTooLarge {
                        width: decoded.width,
                        height: decoded.height,
                        max_dim: self.limits.max_image_dimension,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::Task(e.to_string())),
            Err(_) => Err(PipelineError::Timeout {
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    fn decode_bytes_sync(bytes: Vec<u8>) -> Result<DecodedSource, PipelineError> {
        use std::io::Cursor;

        let byte_len = bytes.len() as u64;
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| {
                PipelineError::Rejected(RejectionReason::Undecodable {
                    message: format!("cannot detect image format: {}", e),
                })
            })?;
        let format = reader.format().ok_or_else(|| {
            PipelineError::Rejected(RejectionReason::Undecodable {
                message: "no recognizable image format".to_string(),
            })
        })?;
        let image = reader.decode().map_err(|e| {
            PipelineError::Rejected(RejectionReason::Undecodable {
                message: e.to_string(),
            })
        })?;

        let image = match OrientationCorrector::orientation(&bytes) {
            Some(orientation) if orientation > 1 => {
                tracing::trace!("Applying EXIF orientation {}", orientation);
                OrientationCorrector::apply(image, orientation)
            }
            _ => image,
        };

        let (width, height) = image.dimensions();
        let has_alpha = image.color().has_alpha();
        Ok(DecodedSource {
            image,
            format,
            width,
            height,
            byte_len,
            has_alpha,
            bytes,
        })
    }
}

/// Convert an ImageFormat to its canonical lowercase name.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Preferred file extension for an encoded format name.
pub fn extension_for(format: &str) -> &str {
    match format {
        "jpeg" => "jpg",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_format_to_string() {
        assert_eq!(format_to_string(ImageFormat::Jpeg), "jpeg");
        assert_eq!(format_to_string(ImageFormat::Png), "png");
        assert_eq!(format_to_string(ImageFormat::WebP), "webp");
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("jpeg"), "jpg");
        assert_eq!(extension_for("png"), "png");
        assert_eq!(extension_for("avif"), "avif");
    }

    #[test]
    fn test_decode_bytes_sync_png() {
        let decoded = SourceDecoder::decode_bytes_sync(png_bytes(64, 32)).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (64, 32));
        assert!(!decoded.has_alpha);
    }

    #[test]
    fn test_decode_bytes_sync_rejects_garbage() {
        let err = SourceDecoder::decode_bytes_sync(b"definitely not pixels".to_vec()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Rejected(RejectionReason::Undecodable { .. })
        ));
    }

    #[tokio::test]
    async fn test_decode_rejects_oversized_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, png_bytes(200, 100)).unwrap();

        let decoder = SourceDecoder::new(RuntimeLimits {
            max_image_dimension: 150,
            ..Default::default()
        });
        let upload = RawUpload {
            temp_path: path,
            declared_mime: "image/png".to_string(),
            declared_len: 0,
            original_filename: "big.png".to_string(),
        };
        let err = decoder.decode(&upload).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { .. }));
    }
}
