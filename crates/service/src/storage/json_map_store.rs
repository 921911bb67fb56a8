use std::{collections::HashMap, hash::Hash, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` as a single JSON document. Writers are serialised
/// on the map's write lock, which is held until the document is on disk.
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`. A missing file is an empty map; an unreadable
    /// or malformed one is an error.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        let map = Self::load(&file_path).await?;
        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn load(file_path: &Path) -> Result<HashMap<K, V>, ServiceError> {
        match fs::read(file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Corrupt(format!("{}: {e}", file_path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ServiceError::Io(format!("{}: {e}", file_path.display()))),
        }
    }

    async fn persist(file_path: &Path, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec(map).map_err(|e| ServiceError::Io(e.to_string()))?;
        let tmp = file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(|e| ServiceError::Io(e.to_string()))?;
        fs::rename(&tmp, file_path).await.map_err(|e| ServiceError::Io(e.to_string()))?;
        Ok(())
    }

    /// Replace the in-memory map with the document on disk.
    pub async fn reload(&self) -> Result<usize, ServiceError> {
        let fresh = Self::load(&self.file_path).await?;
        let mut map = self.inner.write().await;
        *map = fresh;
        Ok(map.len())
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Entries whose value satisfies `pred`.
    pub async fn filter<F>(&self, pred: F) -> Vec<(K, V)>
    where
        F: Fn(&V) -> bool,
    {
        let map = self.inner.read().await;
        map.iter().filter(|(_, v)| pred(v)).map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Apply a mutation and persist it. The mutation runs on a copy, so a failed
    /// closure or a failed write leaves both memory and disk untouched.
    pub async fn update_map<F>(&self, f: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<(), ServiceError>,
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        f(&mut next)?;
        Self::persist(&self.file_path, &next).await?;
        *map = next;
        Ok(())
    }
}
