//! Storage engine: one session contract over two interchangeable backends.
//!
//! A [`StorageEngine`] is built once at start-up and hands out short-lived
//! sessions, one per unit of work. Each session stages changes in a
//! [`working_set::WorkingSet`] until `save`; `close` discards whatever is left.

pub mod db;
pub mod file;
pub mod json_map_store;
pub mod working_set;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use configs::{BackendKind, StorageConfig};
use models::{amenity, Object, ObjectKind, Record};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::errors::ServiceError;
use db::DbStorage;
use file::FileStorage;
use json_map_store::JsonMapStore;

/// Which representation a session persists to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    File,
    Db,
}

#[async_trait]
pub trait Storage: Send + Sync {
    fn backend(&self) -> Backend;

    /// Absent is not an error.
    async fn get(&self, kind: ObjectKind, id: &str) -> Result<Option<Object>, ServiceError>;

    /// Every object of `kind`, or of every kind, keyed by `"<Class>.<id>"`.
    async fn all(&self, kind: Option<ObjectKind>) -> Result<BTreeMap<String, Object>, ServiceError>;

    async fn count(&self, kind: Option<ObjectKind>) -> Result<usize, ServiceError> {
        Ok(self.all(kind).await?.len())
    }

    /// Register `obj` with the session. Registering an existing id replaces it.
    async fn new(&self, obj: Object) -> Result<(), ServiceError>;

    /// Commit everything staged in this session.
    async fn save(&self) -> Result<(), ServiceError>;

    async fn delete(&self, obj: &Object) -> Result<(), ServiceError>;

    async fn reload(&self) -> Result<(), ServiceError>;

    async fn close(&self) -> Result<(), ServiceError>;

    /// Place/amenity association. Link changes are staged like any other
    /// change and applied against committed state on `save`.
    fn amenity_links(&self) -> &dyn AmenityLinks;
}

/// Place/amenity association, whether a join table or an embedded id list.
#[async_trait]
pub trait AmenityLinks: Send + Sync {
    async fn linked_amenities(&self, place_id: &str) -> Result<Vec<amenity::Model>, ServiceError>;

    async fn is_linked(&self, place_id: &str, amenity_id: &str) -> Result<bool, ServiceError>;

    async fn link(&self, place_id: &str, amenity_id: &str) -> Result<(), ServiceError>;

    async fn unlink(&self, place_id: &str, amenity_id: &str) -> Result<(), ServiceError>;
}

impl<'s> dyn Storage + 's {
    pub async fn get_as<T: Record>(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.get(T::KIND, id).await?.and_then(|obj| obj.into_record::<T>()))
    }

    pub async fn all_of<T: Record>(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self
            .all(Some(T::KIND))
            .await?
            .into_values()
            .filter_map(|obj| obj.into_record::<T>())
            .collect())
    }

    /// Stage, commit and read back `record`, returning the stored version.
    pub async fn persist<T: Record>(&self, record: T) -> Result<T, ServiceError> {
        let id = record.id().to_string();
        self.new(record.into_object()).await?;
        self.save().await?;
        self.get_as::<T>(&id).await?.ok_or_else(|| ServiceError::not_found(T::KIND.class_name()))
    }
}

/// Process-wide handle. Cloning is cheap; every clone hands out sessions over
/// the same committed state.
#[derive(Clone)]
pub enum StorageEngine {
    File(Arc<JsonMapStore<String, Object>>),
    Db(DatabaseConnection),
}

impl StorageEngine {
    /// Build the configured backend and load it. Any failure here means the
    /// process must not serve traffic.
    pub async fn from_config(cfg: &StorageConfig) -> Result<Self, ServiceError> {
        let engine = match cfg.backend {
            BackendKind::File => Self::open_file(&cfg.file_path).await?,
            BackendKind::Db => Self::Db(models::db::connect_and_migrate(&cfg.database).await?),
        };
        let session = engine.session();
        session.reload().await?;
        let objects = session.count(None).await?;
        session.close().await?;
        info!(backend = ?engine.backend(), objects, "storage engine ready");
        Ok(engine)
    }

    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        Ok(Self::File(JsonMapStore::new(path.as_ref()).await?))
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::File(_) => Backend::File,
            Self::Db(_) => Backend::Db,
        }
    }

    /// A fresh session with an empty working set.
    pub fn session(&self) -> Arc<dyn Storage> {
        match self {
            Self::File(store) => Arc::new(FileStorage::new(store.clone())),
            Self::Db(conn) => Arc::new(DbStorage::new(conn.clone())),
        }
    }
}
