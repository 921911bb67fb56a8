//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binaries prepare storage through the
//! service crate without depending directly on `common`.

use configs::{BackendKind, StorageConfig};

/// Ensure the file backend's directory exists; the relational backend needs nothing on disk.
pub async fn ensure_env(cfg: &StorageConfig) -> anyhow::Result<()> {
    match cfg.backend {
        BackendKind::File => common::env::ensure_parent_dir(&cfg.file_path).await,
        BackendKind::Db => Ok(()),
    }
}
