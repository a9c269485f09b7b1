//! Local-filesystem binding for stored assets.
//!
//! One directory per variant kind under the asset root. An object-storage
//! binding would replace directories with key prefixes; nothing outside
//! this module depends on the layout being a real filesystem.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Directory names created under the asset root.
const LAYOUT_DIRS: [&str; 5] = ["original", "optimized", "thumbnails", "webcodec", "responsive"];

/// Writes, removes, and lays out asset files under a configured root.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured asset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Idempotently create the directory layout.
    ///
    /// Run once at service start, never interleaved with per-request work.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in LAYOUT_DIRS {
            std::fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    /// Path a file written under `dir/name` will land at.
    pub fn path_for(&self, dir: &str, name: &str) -> PathBuf {
        self.root.join(dir).join(name)
    }

    /// Durably write one file under `dir/name` and return its path.
    ///
    /// Dispatches onto a blocking worker; the payload is moved in.
    pub async fn write(
        &self,
        dir: &'static str,
        name: String,
        bytes: Vec<u8>,
    ) -> Result<PathBuf, PipelineError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.write_sync(dir, &name, &bytes))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?
    }

    /// Synchronous durable write (runs in spawn_blocking).
    pub fn write_sync(&self, dir: &str, name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        let path = self.path_for(dir, name);
        let write = |path: &Path| -> std::io::Result<()> {
            let mut file = File::create(path)?;
            file.write_all(bytes)?;
            file.sync_all()
        };
        write(&path).map_err(|source| PipelineError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Best-effort removal of a set of files.
    ///
    /// Idempotent: already-missing files are not an error. Other failures
    /// are logged and counted, never raised; an orphaned file is an
    /// operational concern, not a correctness violation.
    pub fn remove_all(paths: &[PathBuf]) -> usize {
        let mut failed = 0;
        for path in paths {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Cleanup failed for {:?}: {}", path, e);
                }
            }
        }
        failed
    }
}

/// Removes every registered file on drop unless defused.
///
/// The coordinator registers each file as it lands; committing defuses
/// the guard. Cancellation mid-invocation therefore runs the same
/// cleanup path as a failure, with no orphaned variant files.
pub struct CleanupGuard {
    written: Vec<PathBuf>,
    defused: bool,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self {
            written: Vec::new(),
            defused: false,
        }
    }

    /// Register a file for removal on failure.
    pub fn register(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    /// Keep the written files: the invocation committed.
    pub fn defuse(&mut self) {
        self.defused = true;
    }

    /// Remove all registered files now.
    pub fn cleanup(&mut self) {
        let paths = std::mem::take(&mut self.written);
        AssetStore::remove_all(&paths);
    }
}

impl Default for CleanupGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.defused {
            self.cleanup();
        }
    }
}
