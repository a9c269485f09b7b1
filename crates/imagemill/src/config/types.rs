//! Sub-configuration structs with the reference policy as defaults.

use serde::{Deserialize, Serialize};

/// Upload acceptance policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    /// MIME types accepted for upload
    pub allowed_mime_types: Vec<String>,

    /// Ceiling for general uploads, in megabytes
    pub max_upload_mb: u64,

    /// Ceiling for cover-image uploads, in megabytes
    pub max_cover_mb: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "image/gif".to_string(),
            ],
            max_upload_mb: 10,
            max_cover_mb: 5,
        }
    }
}

/// Size ceiling for one pipeline invocation.
///
/// Passed per call so the same pipeline can serve both the general and
/// the cover-image profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum accepted upload size in bytes
    pub max_bytes: u64,
}

impl UploadLimits {
    /// Policy for general uploads.
    pub fn general(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_mb * 1024 * 1024,
        }
    }

    /// Policy for cover-image uploads.
    pub fn cover(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_cover_mb * 1024 * 1024,
        }
    }
}

/// Which variant kinds the pipeline produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantToggles {
    pub optimized: bool,
    pub web_codec: bool,
    pub thumbnail: bool,
    pub responsive: bool,
}

impl Default for VariantToggles {
    fn default() -> Self {
        Self {
            optimized: true,
            web_codec: true,
            thumbnail: true,
            responsive: true,
        }
    }
}

impl VariantToggles {
    /// Whether any variant kind is enabled at all.
    pub fn any_enabled(&self) -> bool {
        self.optimized || self.web_codec || self.thumbnail || self.responsive
    }
}

/// Transform targets for each variant kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivativeConfig {
    /// Lossy encode quality for optimized/webcodec/responsive variants (1-100)
    pub quality: u8,

    /// Lossy encode quality for thumbnails; slightly higher since quality
    /// loss is proportionally more visible at small sizes
    pub thumbnail_quality: u8,

    /// Fit-inside bound for the optimized variant: width
    pub max_width: u32,

    /// Fit-inside bound for the optimized variant: height
    pub max_height: u32,

    /// Edge length of the square thumbnail
    pub thumbnail_size: u32,

    /// Target widths for responsive variants
    pub breakpoints: Vec<u32>,

    /// Which variant kinds to generate
    pub variants: VariantToggles,
}

impl Default for DerivativeConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            thumbnail_quality: 85,
            max_width: 1920,
            max_height: 1080,
            thumbnail_size: 300,
            breakpoints: vec![640, 768, 1024, 1280, 1920],
            variants: VariantToggles::default(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeLimits {
    /// Maximum decoded image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Optional wall-clock bound for a whole invocation, in milliseconds.
    /// Expiry is treated as a failed invocation (full cleanup runs).
    pub pipeline_timeout_ms: Option<u64>,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            pipeline_timeout_ms: None,
        }
    }
}

/// Asset storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for stored assets (supports ~ expansion)
    pub asset_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            asset_root: "./assets".to_string(),
        }
    }
}
