//! imagemill - media derivative pipeline.
//!
//! Takes one uploaded raster image and deterministically produces a
//! canonical family of derived assets: a size-capped optimized copy, an
//! AVIF copy, a square thumbnail, and responsive width variants, plus the
//! content-addressable metadata consumers need for caching and delivery.
//!
//! # Architecture
//!
//! ```text
//! RawUpload -> Validate -> Decode -> (Fingerprint ∥ Variants) -> Commit
//!                                                                  |
//!                                    DeliveryDescriptorBuilder <- MediaAsset
//! ```
//!
//! The commit is all-or-nothing: a [`MediaAsset`] either carries every
//! configured variant or nothing is left on disk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use imagemill::{AssetPipeline, Config, DeliveryDescriptorBuilder, RawUpload};
//!
//! #[tokio::main]
//! async fn main() -> imagemill::Result<()> {
//!     let config = Config::default();
//!     let pipeline = AssetPipeline::new(config);
//!     pipeline.ensure_layout()?;
//!
//!     let asset = pipeline.process(upload).await?;
//!     let descriptor = DeliveryDescriptorBuilder::describe(&asset, "https://cdn.example.com")?;
//!     println!("{}", descriptor.srcset());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod delivery;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::{Config, DerivativeConfig, UploadLimits, UploadPolicy, VariantToggles};
pub use delivery::{DeliveryDescriptor, DeliveryDescriptorBuilder, SrcsetCandidate};
pub use error::{
    ConfigError, DeliveryError, ImagemillError, PipelineError, PipelineResult, RejectionReason,
    Result,
};
pub use pipeline::{AssetPipeline, AssetStore, ContentHasher};
pub use types::{AssetStatus, MediaAsset, RawUpload, SourceMetadata, VariantKind, VariantRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
