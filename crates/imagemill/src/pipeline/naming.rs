//! Collision-free, URL-safe file identifiers for stored derivatives.
//!
//! Filenames follow `{sanitized_basename}_{variant_tag}_{disambiguator}.{ext}`.
//! The disambiguator is the invocation's millisecond timestamp, so
//! re-uploads of the same logical file never collide with earlier ones;
//! the content hash stays a cache/dedup key for consumers.

use crate::types::VariantKind;

/// Longest sanitized basename kept in generated filenames.
const MAX_BASENAME_LEN: usize = 64;

/// Computes stored file identifiers.
pub struct AssetNamer;

impl AssetNamer {
    /// Reduce an untrusted client filename to a safe basename.
    ///
    /// Strips any directory components (both separator styles), drops the
    /// extension, and replaces everything outside `[A-Za-z0-9_-]`.
    /// Traversal is impossible by construction: the result never contains
    /// a separator, a dot, or a `..` segment.
    pub fn sanitize(original_filename: &str) -> String {
        let basename = original_filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(original_filename);

        // Drop the extension; the encoder decides the real one
        let stem = match basename.rfind('.') {
            Some(idx) if idx > 0 => &basename[..idx],
            _ => basename,
        };

        let mut safe: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();

        // No leading or trailing dashes, no empty result
        safe = safe.trim_matches('-').to_string();
        if safe.len() > MAX_BASENAME_LEN {
            safe.truncate(MAX_BASENAME_LEN);
        }
        if safe.is_empty() {
            safe = "upload".to_string();
        }
        safe
    }

    /// Build the stored filename for one variant.
    pub fn file_name(base: &str, kind: VariantKind, disambiguator: u64, ext: &str) -> String {
        format!("{}_{}_{}.{}", base, kind.tag(), disambiguator, ext)
    }

    /// Build the stored filename for the durable original copy.
    pub fn original_file_name(base: &str, disambiguator: u64, ext: &str) -> String {
        format!("{}_original_{}.{}", base, disambiguator, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain() {
        assert_eq!(AssetNamer::sanitize("holiday photo.jpg"), "holiday-photo");
    }

    #[test]
    fn test_sanitize_strips_traversal() {
        let safe = AssetNamer::sanitize("../../etc/passwd.png");
        assert!(!safe.contains(".."));
        assert!(!safe.contains('/'));
        assert!(!safe.contains('\\'));
        assert_eq!(safe, "passwd");
    }

    #[test]
    fn test_sanitize_strips_windows_paths() {
        assert_eq!(AssetNamer::sanitize("C:\\Users\\me\\cat.png"), "cat");
    }

    #[test]
    fn test_sanitize_hidden_file() {
        // ".bashrc" has no stem before the dot; the whole name is the stem
        assert_eq!(AssetNamer::sanitize(".bashrc"), "bashrc");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(AssetNamer::sanitize(""), "upload");
        assert_eq!(AssetNamer::sanitize("...."), "upload");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(200);
        assert_eq!(AssetNamer::sanitize(&long).len(), MAX_BASENAME_LEN);
    }

    #[test]
    fn test_file_name_shape() {
        let name = AssetNamer::file_name("photo", VariantKind::Responsive(640), 1700000000123, "jpg");
        assert_eq!(name, "photo_w640_1700000000123.jpg");

        let name = AssetNamer::file_name("photo", VariantKind::Thumbnail, 42, "png");
        assert_eq!(name, "photo_thumbnail_42.png");
    }

    #[test]
    fn test_original_file_name_shape() {
        assert_eq!(
            AssetNamer::original_file_name("photo", 42, "jpg"),
            "photo_original_42.jpg"
        );
    }
}
