//! Core data types for the derivative pipeline.
//!
//! `MediaAsset` is the pipeline's output of record: the thing the owning
//! collaborator (an article's cover-image field, a user avatar slot)
//! persists and later hands to the delivery layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Descriptor handed in by the upload intake collaborator.
///
/// Transient: the temp file is removed by the pipeline once processing
/// finishes, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct RawUpload {
    /// Where intake spooled the uploaded bytes
    pub temp_path: PathBuf,

    /// MIME type as declared by the client
    pub declared_mime: String,

    /// Size in bytes as declared by the client
    pub declared_len: u64,

    /// Original filename as supplied by the client (untrusted)
    pub original_filename: String,
}

/// One derived encoding of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariantKind {
    /// Size-capped copy in the source's native raster format
    Optimized,
    /// Same fit as optimized, re-encoded as AVIF
    WebCodec,
    /// Square centered cover-crop
    Thumbnail,
    /// Fit-inside resize to the given pixel width
    Responsive(u32),
}

impl VariantKind {
    /// Directory prefix under the asset root where files of this kind live.
    pub fn dir(&self) -> &'static str {
        match self {
            VariantKind::Optimized => "optimized",
            VariantKind::WebCodec => "webcodec",
            VariantKind::Thumbnail => "thumbnails",
            VariantKind::Responsive(_) => "responsive",
        }
    }

    /// Short tag embedded in generated filenames.
    pub fn tag(&self) -> String {
        match self {
            VariantKind::Optimized => "optimized".to_string(),
            VariantKind::WebCodec => "webcodec".to_string(),
            VariantKind::Thumbnail => "thumbnail".to_string(),
            VariantKind::Responsive(w) => format!("w{}", w),
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKind::Optimized => write!(f, "optimized"),
            VariantKind::WebCodec => write!(f, "webcodec"),
            VariantKind::Thumbnail => write!(f, "thumbnail"),
            VariantKind::Responsive(w) => write!(f, "responsive-{}", w),
        }
    }
}

impl FromStr for VariantKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "optimized" => Ok(VariantKind::Optimized),
            "webcodec" => Ok(VariantKind::WebCodec),
            "thumbnail" => Ok(VariantKind::Thumbnail),
            other => {
                if let Some(w) = other.strip_prefix("responsive-") {
                    w.parse::<u32>()
                        .map(VariantKind::Responsive)
                        .map_err(|_| format!("invalid responsive width in '{}'", other))
                } else {
                    Err(format!("unknown variant kind '{}'", other))
                }
            }
        }
    }
}

// Serialized as its string form so it can key a JSON map.
impl Serialize for VariantKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VariantKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One stored derivative file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantRecord {
    /// Filename under the kind's directory prefix
    pub file_name: String,

    /// Encoded width in pixels
    pub width: u32,

    /// Encoded height in pixels
    pub height: u32,

    /// Encoded format ("jpeg", "png", "avif", ...)
    pub format: String,
}

/// Properties of the decoded source image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Source width in pixels (after orientation correction)
    pub width: u32,

    /// Source height in pixels (after orientation correction)
    pub height: u32,

    /// Decoded format ("jpeg", "png", "webp", "gif")
    pub format: String,

    /// Uploaded file size in bytes
    pub byte_len: u64,

    /// Whether the decoded image carries an alpha channel
    pub has_alpha: bool,
}

/// Lifecycle state of a MediaAsset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Pipeline invocation has started, nothing durable yet
    Pending,
    /// Every configured variant is durably written
    Committed,
    /// Invocation aborted; all partial files were removed
    Failed,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetStatus::Pending => write!(f, "pending"),
            AssetStatus::Committed => write!(f, "committed"),
            AssetStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The complete output for one processed upload.
///
/// Immutable once committed: re-processing an upload creates a new asset
/// and the owning collaborator swaps its reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Opaque identifier, stable for the lifetime of the asset
    pub id: String,

    /// Fingerprint of the decoded pixel content (not the raw bytes);
    /// cache-key/dedup comparisons only, not an integrity primitive
    pub content_hash: String,

    /// Properties of the decoded source
    pub source: SourceMetadata,

    /// Filename of the durable source copy under `original/`
    pub original_file: String,

    /// Every derivative produced for this asset, keyed by kind
    pub variants: BTreeMap<VariantKind, VariantRecord>,

    /// Lifecycle state; only `Committed` assets reach collaborators
    pub status: AssetStatus,

    /// Creation time in milliseconds since the Unix epoch
    pub created_at_ms: u64,
}

impl MediaAsset {
    /// Look up a variant by kind.
    pub fn variant(&self, kind: VariantKind) -> Option<&VariantRecord> {
        self.variants.get(&kind)
    }

    /// All responsive-breakpoint variants, sorted by width.
    pub fn responsive_variants(&self) -> Vec<(u32, &VariantRecord)> {
        // BTreeMap ordering already sorts Responsive entries by width
        self.variants
            .iter()
            .filter_map(|(kind, record)| match kind {
                VariantKind::Responsive(w) => Some((*w, record)),
                _ => None,
            })
            .collect()
    }
}
