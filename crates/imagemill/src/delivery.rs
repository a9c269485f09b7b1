//! Consumer-facing delivery descriptors for committed assets.
//!
//! Pure functions over the in-memory [`MediaAsset`]: never touches the
//! filesystem. This is the only interface the page and meta-tag
//! generators consume.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DeliveryError;
use crate::types::{AssetStatus, MediaAsset, VariantKind};

/// One responsive-width candidate, `srcset`-style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SrcsetCandidate {
    /// Encoded pixel width
    pub width: u32,
    /// Absolute URL of the variant
    pub url: String,
}

/// Everything a renderer needs to deliver one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDescriptor {
    /// Best-effort single URL (the optimized variant) for consumers that
    /// cannot use responsive markup
    pub fallback_url: String,

    /// Absolute URL per variant kind
    pub urls: BTreeMap<VariantKind, String>,

    /// Responsive candidates, sorted by ascending width
    pub candidates: Vec<SrcsetCandidate>,
}

impl DeliveryDescriptor {
    /// Render the candidates as an HTML `srcset` attribute value.
    pub fn srcset(&self) -> String {
        self.candidates
            .iter()
            .map(|c| format!("{} {}w", c.url, c.width))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render fallback `<img>` markup with responsive candidates attached.
    pub fn img_markup(&self, alt: &str) -> String {
        if self.candidates.is_empty() {
            format!(
                "<img src=\"{}\" alt=\"{}\">",
                self.fallback_url,
                escape_attr(alt)
            )
        } else {
            format!(
                "<img src=\"{}\" srcset=\"{}\" alt=\"{}\">",
                self.fallback_url,
                self.srcset(),
                escape_attr(alt)
            )
        }
    }
}

/// Builds delivery descriptors from committed assets.
pub struct DeliveryDescriptorBuilder;

impl DeliveryDescriptorBuilder {
    /// Describe a committed asset under the given base URL.
    ///
    /// Rejects anything that is not `Committed`: a renderer must be able
    /// to assume every expected variant exists.
    pub fn describe(asset: &MediaAsset, base_url: &str) -> Result<DeliveryDescriptor, DeliveryError> {
        if asset.status != AssetStatus::Committed {
            return Err(DeliveryError::NotCommitted {
                id: asset.id.clone(),
                status: asset.status.to_string(),
            });
        }

        let base = base_url.trim_end_matches('/');
        let mut urls = BTreeMap::new();
        for (kind, record) in &asset.variants {
            urls.insert(*kind, format!("{}/{}/{}", base, kind.dir(), record.file_name));
        }

        let fallback_url = urls
            .get(&VariantKind::Optimized)
            .cloned()
            .ok_or_else(|| DeliveryError::MissingVariant {
                id: asset.id.clone(),
                variant: VariantKind::Optimized.to_string(),
            })?;

        let candidates = asset
            .responsive_variants()
            .into_iter()
            .map(|(width, record)| SrcsetCandidate {
                width,
                url: format!(
                    "{}/{}/{}",
                    base,
                    VariantKind::Responsive(width).dir(),
                    record.file_name
                ),
            })
            .collect();

        Ok(DeliveryDescriptor {
            fallback_url,
            urls,
            candidates,
        })
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
