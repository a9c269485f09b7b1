//! Content fingerprinting for cache keys and dedup comparisons.

use image::imageops::FilterType;
use image::DynamicImage;

/// Edge length of the sample grid the fingerprint is folded from.
const GRID: u32 = 8;

/// Computes stable fingerprints from decoded pixel data.
///
/// The pixel fingerprint is perceptual-ish: visually identical re-encodes
/// of the same image tend to land in the same hash bucket. It is not a
/// security or integrity primitive. Pure and side-effect-free, so it can
/// run concurrently with the variant transforms on the same buffer.
pub struct ContentHasher;

impl ContentHasher {
    /// Fingerprint decoded pixel content.
    ///
    /// Downscales to an 8x8 grid, reduces to single-channel intensity,
    /// and folds the samples into a wrapping 64-bit accumulator.
    pub fn fingerprint(image: &DynamicImage) -> u64 {
        let grid = image.resize_exact(GRID, GRID, FilterType::Triangle).to_luma8();
        let mut hash: u64 = 0;
        for sample in grid.as_raw() {
            hash = hash.wrapping_mul(31).wrapping_add(*sample as u64);
        }
        hash
    }

    /// Fingerprint rendered as the hex string stored on the asset record.
    pub fn fingerprint_hex(image: &DynamicImage) -> String {
        format!("{:016x}", Self::fingerprint(image))
    }

    /// BLAKE3 digest of raw bytes, for exact identity (asset ids).
    pub fn digest(bytes: &[u8]) -> String {
        blake3::hash(bytes).to_hex().to_string()
    }
}
