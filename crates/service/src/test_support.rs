#![cfg(test)]
use std::path::PathBuf;

use configs::{BackendKind, DatabaseConfig, StorageConfig};

use crate::storage::StorageEngine;

/// Relational engine over a private, migrated in-memory SQLite database.
pub async fn sqlite_engine() -> Result<StorageEngine, anyhow::Error> {
    let cfg = StorageConfig {
        backend: BackendKind::Db,
        database: DatabaseConfig::sqlite_memory(),
        ..StorageConfig::default()
    };
    Ok(StorageEngine::from_config(&cfg).await?)
}

/// File engine over a fresh temp path. Pass the path to
/// [`remove_file_engine`] when done.
pub async fn file_engine() -> Result<(StorageEngine, PathBuf), anyhow::Error> {
    let path = std::env::temp_dir().join(format!("hbnb_test_{}.json", uuid::Uuid::new_v4()));
    let cfg = StorageConfig {
        backend: BackendKind::File,
        file_path: path.to_string_lossy().into_owned(),
        ..StorageConfig::default()
    };
    let engine = StorageEngine::from_config(&cfg).await?;
    Ok((engine, path))
}

pub async fn remove_file_engine(path: PathBuf) {
    let _ = tokio::fs::remove_file(path).await;
}
