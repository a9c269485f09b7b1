//! Media derivative pipeline components.
//!
//! Stages of the pipeline, leaves first:
//! - **validate**: reject unacceptable uploads before anything runs
//! - **decode**: load the source, enforce limits, fix orientation
//! - **metadata**: EXIF orientation handling
//! - **fingerprint**: content hashing for cache keys and dedup
//! - **variants**: per-kind resize and encode transforms
//! - **naming**: collision-free stored file identifiers
//! - **store**: filesystem layout, durable writes, cleanup
//! - **processor**: orchestration and the all-or-nothing commit

pub mod decode;
pub mod fingerprint;
pub mod metadata;
pub mod naming;
pub mod processor;
pub mod store;
pub mod validate;
pub mod variants;

// Re-exports for convenient access
pub use decode::{DecodedSource, SourceDecoder};
pub use fingerprint::ContentHasher;
pub use naming::AssetNamer;
pub use processor::AssetPipeline;
pub use store::{AssetStore, CleanupGuard};
pub use validate::Validator;
pub use variants::DerivativeGenerator;
