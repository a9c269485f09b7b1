//! EXIF orientation handling.
//!
//! Derivatives must be generated from the upright image, so the pipeline
//! reads the orientation tag and bakes the rotation into the decoded
//! buffer before any resize runs.

use exif::{In, Reader, Tag, Value};
use image::DynamicImage;
use std::io::{BufReader, Cursor};

/// Reads and applies EXIF orientation.
pub struct OrientationCorrector;

impl OrientationCorrector {
    /// Extract the orientation tag (1-8 per the EXIF spec) from raw file bytes.
    ///
    /// Returns `None` when there is no EXIF payload or no orientation tag;
    /// extraction is intentionally lenient.
    pub fn orientation(bytes: &[u8]) -> Option<u32> {
        let mut reader = BufReader::new(Cursor::new(bytes));
        let exif = Reader::new().read_from_container(&mut reader).ok()?;
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            })
    }

    /// Bake the given orientation into the pixel data.
    ///
    /// Orientation 1 (and anything unrecognized) returns the image as-is.
    pub fn apply(image: DynamicImage, orientation: u32) -> DynamicImage {
        match orientation {
            2 => image.fliph(),
            3 => image.rotate180(),
            4 => image.flipv(),
            5 => image.rotate90().fliph(),
            6 => image.rotate90(),
            7 => image.rotate270().fliph(),
            8 => image.rotate270(),
            _ => image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_orientation_none_for_plain_bytes() {
        assert_eq!(OrientationCorrector::orientation(b"not exif"), None);
    }

    #[test]
    fn test_apply_identity() {
        let img = DynamicImage::new_rgb8(40, 20);
        let out = OrientationCorrector::apply(img, 1);
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn test_apply_rotation_swaps_dimensions() {
        let img = DynamicImage::new_rgb8(40, 20);
        let out = OrientationCorrector::apply(img, 6);
        assert_eq!(out.dimensions(), (20, 40));

        let img = DynamicImage::new_rgb8(40, 20);
        let out = OrientationCorrector::apply(img, 8);
        assert_eq!(out.dimensions(), (20, 40));
    }

    #[test]
    fn test_apply_flip_keeps_dimensions() {
        let img = DynamicImage::new_rgb8(40, 20);
        let out = OrientationCorrector::apply(img, 3);
        assert_eq!(out.dimensions(), (40, 20));
    }
}
