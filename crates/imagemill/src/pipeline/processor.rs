//! Pipeline orchestration: validate, decode, transform, commit or roll back.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::config::{Config, DerivativeConfig, UploadPolicy};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{AssetStatus, MediaAsset, RawUpload, SourceMetadata, VariantKind, VariantRecord};

use super::decode::{extension_for, format_to_string, SourceDecoder};
use super::fingerprint::ContentHasher;
use super::naming::AssetNamer;
use super::store::{AssetStore, CleanupGuard};
use super::validate::Validator;
use super::variants::{DerivativeGenerator, EncodedVariant};

/// Orchestrates one upload through the full derivative pipeline.
///
/// The commit policy is all-or-nothing: a [`MediaAsset`] is returned only
/// when every configured variant is durably on disk. Any failure (or
/// cancellation) removes every file written for the invocation, and the
/// intake temp file is removed on every exit path.
pub struct AssetPipeline {
    config: Config,
    validator: Validator,
    decoder: SourceDecoder,
    store: AssetStore,
}

impl AssetPipeline {
    /// Create a new pipeline from the given configuration.
    pub fn new(config: Config) -> Self {
        let validator = Validator::new(config.uploads.clone());
        let decoder = SourceDecoder::new(config.limits.clone());
        let store = AssetStore::new(config.asset_root());
        Self {
            config,
            validator,
            decoder,
            store,
        }
    }

    /// Idempotently create the on-disk layout. Run once at service start.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        self.store.ensure_layout()
    }

    /// The store this pipeline writes into.
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Process an upload under the general size policy.
    pub async fn process(&self, upload: RawUpload) -> PipelineResult<MediaAsset> {
        let policy = self.config.uploads.general();
        self.process_with_policy(upload, &policy).await
    }

    /// Process an upload under an explicit size policy (e.g. cover images).
    pub async fn process_with_policy(
        &self,
        upload: RawUpload,
        policy: &UploadPolicy,
    ) -> PipelineResult<MediaAsset> {
        let start = std::time::Instant::now();
        tracing::debug!("Processing upload {:?}", upload.original_filename);

        let result = match self.config.limits.pipeline_timeout_ms {
            Some(ms) => match timeout(Duration::from_millis(ms), self.run(&upload, policy)).await {
                Ok(result) => result,
                // Dropping the inner future runs the same cleanup as a failure
                Err(_) => Err(PipelineError::Timeout {
                    stage: "pipeline".to_string(),
                    timeout_ms: ms,
                }),
            },
            None => self.run(&upload, policy).await,
        };

        // The source temp file is never a long-lived artifact
        match tokio::fs::remove_file(&upload.temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove temp file {:?}: {}", upload.temp_path, e),
        }

        match &result {
            Ok(asset) => tracing::debug!(
                "Committed asset {} with {} variants in {:?}",
                asset.id,
                asset.variants.len(),
                start.elapsed()
            ),
            Err(e) => tracing::debug!(
                "Upload {:?} failed in {:?}: {}",
                upload.original_filename,
                start.elapsed(),
                e
            ),
        }
        result
    }

    /// The pending -> processing -> committed path. Every error return (or
    /// drop) before `defuse` leaves zero files behind.
    async fn run(&self, upload: &RawUpload, policy: &UploadPolicy) -> PipelineResult<MediaAsset> {
        // Pending -> Processing: validation short-circuits with no writes
        self.validator.validate(upload, policy)?;

        let decoded = self.decoder.decode(upload).await?;
        let source_format = decoded.format;
        let source = SourceMetadata {
            width: decoded.width,
            height: decoded.height,
            format: format_to_string(source_format),
            byte_len: decoded.byte_len,
            has_alpha: decoded.has_alpha,
        };
        let source_bytes = decoded.bytes;
        let image = Arc::new(decoded.image);

        let stamp = unique_stamp();
        let digest = ContentHasher::digest(&source_bytes);
        let id = format!("{:x}-{}", stamp, &digest[..12]);
        let base = AssetNamer::sanitize(&upload.original_filename);

        // Fingerprint and variant transforms read the same immutable
        // buffer and run on parallel blocking workers.
        let fp_image = Arc::clone(&image);
        let fp_task = tokio::task::spawn_blocking(move || ContentHasher::fingerprint_hex(&fp_image));

        let mut tasks = JoinSet::new();
        for kind in enabled_kinds(&self.config.derivatives) {
            let img = Arc::clone(&image);
            let derivatives = self.config.derivatives.clone();
            tasks.spawn_blocking(move || {
                (
                    kind,
                    DerivativeGenerator::generate(&img, kind, &derivatives, source_format),
                )
            });
        }

        let mut encoded: Vec<(VariantKind, EncodedVariant)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (kind, result) = joined.map_err(|e| PipelineError::Task(e.to_string()))?;
            encoded.push((kind, result?));
        }
        encoded.sort_by_key(|(kind, _)| *kind);

        let content_hash = fp_task
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?;

        // Write phase: the guard removes everything registered so far if
        // any later write fails or the invocation is canceled. Each path
        // is registered before its write is dispatched, so cleanup covers
        // whatever may already be on disk.
        let mut guard = CleanupGuard::new();

        let source_ext = extension_for(&source.format);
        let original_file = AssetNamer::original_file_name(&base, stamp, source_ext);
        guard.register(self.store.path_for("original", &original_file));
        self.store
            .write("original", original_file.clone(), source_bytes)
            .await?;

        let mut variants = BTreeMap::new();
        for (kind, variant) in encoded {
            let name = AssetNamer::file_name(&base, kind, stamp, extension_for(&variant.format));
            guard.register(self.store.path_for(kind.dir(), &name));
            self.store.write(kind.dir(), name.clone(), variant.bytes).await?;
            variants.insert(
                kind,
                VariantRecord {
                    file_name: name,
                    width: variant.width,
                    height: variant.height,
                    format: variant.format,
                },
            );
        }

        // Processing -> Committed
        guard.defuse();
        Ok(MediaAsset {
            id,
            content_hash,
            source,
            original_file,
            variants,
            status: AssetStatus::Committed,
            created_at_ms: stamp,
        })
    }
}

/// Expand the configuration into the concrete variant kinds to generate.
fn enabled_kinds(config: &DerivativeConfig) -> Vec<VariantKind> {
    let mut kinds = Vec::new();
    if config.variants.optimized {
        kinds.push(VariantKind::Optimized);
    }
    if config.variants.web_codec {
        kinds.push(VariantKind::WebCodec);
    }
    if config.variants.thumbnail {
        kinds.push(VariantKind::Thumbnail);
    }
    if config.variants.responsive {
        for &width in &config.breakpoints {
            kinds.push(VariantKind::Responsive(width));
        }
    }
    kinds
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Millisecond timestamp, bumped to stay strictly increasing within the
/// process so two invocations in the same millisecond never share a
/// filename disambiguator.
fn unique_stamp() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = unix_millis();
    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariantToggles;

    #[test]
    fn test_enabled_kinds_full_set() {
        let config = DerivativeConfig::default();
        let kinds = enabled_kinds(&config);
        assert_eq!(kinds.len(), 3 + config.breakpoints.len());
        assert!(kinds.contains(&VariantKind::Optimized));
        assert!(kinds.contains(&VariantKind::WebCodec));
        assert!(kinds.contains(&VariantKind::Thumbnail));
        assert!(kinds.contains(&VariantKind::Responsive(640)));
    }

    #[test]
    fn test_enabled_kinds_respects_toggles() {
        let config = DerivativeConfig {
            variants: VariantToggles {
                optimized: true,
                web_codec: false,
                thumbnail: false,
                responsive: false,
            },
            ..Default::default()
        };
        assert_eq!(enabled_kinds(&config), vec![VariantKind::Optimized]);
    }

    #[test]
    fn test_unix_millis_plausible() {
        assert!(unix_millis() > 1_600_000_000_000);
    }

    #[test]
    fn test_unique_stamp_strictly_increasing() {
        let stamps: Vec<u64> = (0..100).map(|_| unique_stamp()).collect();
        for pair in stamps.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }
}
