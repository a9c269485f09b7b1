//! Per-variant pixel transforms: resize policies and encoders.

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::config::DerivativeConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::VariantKind;

use super::decode::format_to_string;

/// AVIF encoder speed (0 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// One encoded derivative, not yet written anywhere.
pub struct EncodedVariant {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Performs the pixel transforms for each variant kind.
///
/// Every invocation reads the same immutable decoded buffer and is
/// independent of the others, so the coordinator may dispatch them onto
/// parallel workers.
pub struct DerivativeGenerator;

impl DerivativeGenerator {
    /// Produce the encoded bytes for one variant kind.
    pub fn generate(
        image: &DynamicImage,
        kind: VariantKind,
        config: &DerivativeConfig,
        source_format: ImageFormat,
    ) -> PipelineResult<EncodedVariant> {
        let (resized, target_format, quality) = match kind {
            VariantKind::Optimized => {
                let (w, h) = fit_inside(
                    image.width(),
                    image.height(),
                    config.max_width,
                    config.max_height,
                );
                (
                    image.resize_exact(w, h, FilterType::Lanczos3),
                    source_format,
                    config.quality,
                )
            }
            VariantKind::WebCodec => {
                let (w, h) = fit_inside(
                    image.width(),
                    image.height(),
                    config.max_width,
                    config.max_height,
                );
                (
                    image.resize_exact(w, h, FilterType::Lanczos3),
                    ImageFormat::Avif,
                    config.quality,
                )
            }
            VariantKind::Thumbnail => {
                // Cover-crop: fill the exact square, cropping centered
                let size = config.thumbnail_size;
                (
                    image.resize_to_fill(size, size, FilterType::Lanczos3),
                    source_format,
                    config.thumbnail_quality,
                )
            }
            VariantKind::Responsive(width) => {
                let (w, h) = fit_width(image.width(), image.height(), width);
                (
                    image.resize_exact(w, h, FilterType::Lanczos3),
                    source_format,
                    config.quality,
                )
            }
        };

        let bytes = encode(&resized, target_format, quality).map_err(|e| {
            PipelineError::Transform {
                variant: kind.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(EncodedVariant {
            bytes,
            width: resized.width(),
            height: resized.height(),
            format: format_to_string(target_format),
        })
    }
}

/// Scale down to fit within `max_w` x `max_h`, preserving aspect ratio,
/// never enlarging.
pub fn fit_inside(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale = (max_w as f64 / width as f64)
        .min(max_h as f64 / height as f64)
        .min(1.0);
    scale_dims(width, height, scale, max_w, max_h)
}

/// Scale down to the target width with unconstrained height, preserving
/// aspect ratio, never enlarging.
pub fn fit_width(width: u32, height: u32, target_w: u32) -> (u32, u32) {
    let scale = (target_w as f64 / width as f64).min(1.0);
    scale_dims(width, height, scale, target_w, u32::MAX)
}

fn scale_dims(width: u32, height: u32, scale: f64, max_w: u32, max_h: u32) -> (u32, u32) {
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Encode an image in the given format at the given quality.
///
/// Quality applies to JPEG and AVIF. PNG and GIF are not quality-driven,
/// and the WebP encoder in `image` is lossless only.
fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        }
        ImageFormat::Avif => {
            let encoder = AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality);
            if image.color().has_alpha() {
                image.to_rgba8().write_with_encoder(encoder)?;
            } else {
                image.to_rgb8().write_with_encoder(encoder)?;
            }
        }
        ImageFormat::Png => {
            image.write_to(&mut buf, ImageFormat::Png)?;
        }
        other => {
            // GIF and WebP encoders want 8-bit buffers
            if image.color().has_alpha() {
                DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buf, other)?;
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buf, other)?;
            }
        }
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_inside_reference_scenario() {
        // 4000x3000 into 1920x1080 -> height constrains: 1440x1080
        assert_eq!(fit_inside(4000, 3000, 1920, 1080), (1440, 1080));
    }

    #[test]
    fn test_fit_inside_never_enlarges() {
        assert_eq!(fit_inside(800, 600, 1920, 1080), (800, 600));
        assert_eq!(fit_inside(100, 50, 1920, 1080), (100, 50));
    }

    #[test]
    fn test_fit_inside_width_constrained() {
        assert_eq!(fit_inside(4000, 1000, 1920, 1080), (1920, 480));
    }

    #[test]
    fn test_fit_width_reference_scenario() {
        assert_eq!(fit_width(4000, 3000, 640), (640, 480));
        assert_eq!(fit_width(4000, 3000, 1024), (1024, 768));
    }

    #[test]
    fn test_fit_width_never_enlarges() {
        assert_eq!(fit_width(500, 400, 1920), (500, 400));
    }

    #[test]
    fn test_fit_never_collapses_to_zero() {
        assert_eq!(fit_width(10000, 1, 100), (100, 1));
    }

    #[test]
    fn test_generate_optimized_constrains_dimensions() {
        let img = DynamicImage::new_rgb8(2400, 1800);
        let config = DerivativeConfig::default();
        let out =
            DerivativeGenerator::generate(&img, VariantKind::Optimized, &config, ImageFormat::Png)
                .unwrap();
        assert_eq!((out.width, out.height), (1440, 1080));
        assert_eq!(out.format, "png");
        assert!(!out.bytes.is_empty());
    }

    #[test]
    fn test_generate_thumbnail_exact_square() {
        // A wide panorama still yields the exact configured square
        let img = DynamicImage::new_rgb8(1600, 400);
        let config = DerivativeConfig::default();
        let out =
            DerivativeGenerator::generate(&img, VariantKind::Thumbnail, &config, ImageFormat::Png)
                .unwrap();
        assert_eq!((out.width, out.height), (300, 300));
    }

    #[test]
    fn test_generate_responsive_preserves_aspect() {
        let img = DynamicImage::new_rgb8(2000, 1500);
        let config = DerivativeConfig::default();
        let out = DerivativeGenerator::generate(
            &img,
            VariantKind::Responsive(640),
            &config,
            ImageFormat::Jpeg,
        )
        .unwrap();
        assert_eq!((out.width, out.height), (640, 480));
        assert_eq!(out.format, "jpeg");
        // JPEG magic
        assert_eq!(&out.bytes[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_generate_responsive_small_source_keeps_size() {
        let img = DynamicImage::new_rgb8(400, 300);
        let config = DerivativeConfig::default();
        let out = DerivativeGenerator::generate(
            &img,
            VariantKind::Responsive(1920),
            &config,
            ImageFormat::Png,
        )
        .unwrap();
        assert_eq!((out.width, out.height), (400, 300));
    }

    #[test]
    fn test_generate_webcodec_is_avif() {
        let img = DynamicImage::new_rgb8(320, 240);
        let config = DerivativeConfig::default();
        let out =
            DerivativeGenerator::generate(&img, VariantKind::WebCodec, &config, ImageFormat::Png)
                .unwrap();
        assert_eq!(out.format, "avif");
        // ISO BMFF: "ftyp" box at offset 4
        assert_eq!(&out.bytes[4..8], b"ftyp");
    }
}
