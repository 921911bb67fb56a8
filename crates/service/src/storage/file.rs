//! Flat-file backend: every object in one JSON document keyed `"<Class>.<id>"`.
//!
//! A place's `amenity_ids` only moves through staged link changes, which
//! `save` applies to the committed place under the store's write lock. An
//! upsert of an existing place keeps the committed list.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use models::{amenity, Object, ObjectKind};
use tokio::sync::Mutex;
use tracing::debug;

use super::json_map_store::JsonMapStore;
use super::working_set::WorkingSet;
use super::{AmenityLinks, Backend, Storage};
use crate::errors::ServiceError;

pub struct FileStorage {
    store: Arc<JsonMapStore<String, Object>>,
    staged: Mutex<WorkingSet>,
}

impl FileStorage {
    pub fn new(store: Arc<JsonMapStore<String, Object>>) -> Self {
        Self { store, staged: Mutex::new(WorkingSet::default()) }
    }
}

fn apply_link(ids: &mut Vec<String>, amenity_id: &str, linked: bool) {
    let present = ids.iter().any(|id| id == amenity_id);
    if linked && !present {
        ids.push(amenity_id.to_string());
    } else if !linked && present {
        ids.retain(|id| id != amenity_id);
    }
}

/// Lay the session's staged link changes over a place's embedded list.
fn apply_staged_links(staged: &WorkingSet, obj: &mut Object) {
    if let Object::Place(p) = obj {
        for (amenity_id, linked) in staged.links_of(&p.id) {
            apply_link(&mut p.amenity_ids, amenity_id, linked);
        }
    }
}

/// Every entry must sit under the key its own class and id produce.
fn check_keys(entries: &[(String, Object)]) -> Result<(), ServiceError> {
    for (key, obj) in entries {
        if *key != obj.key() {
            return Err(ServiceError::Corrupt(format!("entry {key} holds {}", obj.key())));
        }
    }
    Ok(())
}

#[async_trait]
impl Storage for FileStorage {
    fn backend(&self) -> Backend {
        Backend::File
    }

    async fn get(&self, kind: ObjectKind, id: &str) -> Result<Option<Object>, ServiceError> {
        let key = kind.key(id);
        let staged = self.staged.lock().await;
        let found = match staged.lookup(&key) {
            Some(obj) => obj.cloned(),
            None => self.store.get(&key).await,
        };
        Ok(found.map(|mut obj| {
            apply_staged_links(&staged, &mut obj);
            obj
        }))
    }

    async fn all(&self, kind: Option<ObjectKind>) -> Result<BTreeMap<String, Object>, ServiceError> {
        let mut out: BTreeMap<String, Object> = match kind {
            Some(k) => self.store.filter(|obj| obj.kind() == k).await,
            None => self.store.list().await,
        }
        .into_iter()
        .collect();
        let staged = self.staged.lock().await;
        staged.overlay(&mut out, kind);
        for obj in out.values_mut() {
            apply_staged_links(&staged, obj);
        }
        Ok(out)
    }

    async fn new(&self, obj: Object) -> Result<(), ServiceError> {
        self.staged.lock().await.stage_upsert(obj);
        Ok(())
    }

    async fn save(&self) -> Result<(), ServiceError> {
        let mut staged = self.staged.lock().await;
        if staged.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let batch = staged.batch(now);
        let (upserts, deletes, links) = (batch.upserts.len(), batch.deletes.len(), batch.links.len());
        self.store
            .update_map(|map| {
                for obj in batch.upserts {
                    let key = obj.key();
                    let obj = match (obj, map.get(&key)) {
                        (Object::Place(mut p), Some(Object::Place(committed))) => {
                            p.amenity_ids = committed.amenity_ids.clone();
                            Object::Place(p)
                        }
                        (obj, _) => obj,
                    };
                    map.insert(key, obj);
                }
                for (place_id, amenity_id, linked) in batch.links {
                    if let Some(Object::Place(p)) = map.get_mut(&ObjectKind::Place.key(&place_id)) {
                        apply_link(&mut p.amenity_ids, &amenity_id, linked);
                        p.updated_at = now;
                    }
                }
                for (kind, id) in batch.deletes {
                    map.remove(&kind.key(&id));
                }
                Ok(())
            })
            .await?;
        staged.clear();
        let objects = self.store.len().await;
        debug!(path = %self.store.path().display(), upserts, deletes, links, objects, "file storage saved");
        Ok(())
    }

    async fn delete(&self, obj: &Object) -> Result<(), ServiceError> {
        self.staged.lock().await.stage_delete(obj.kind(), obj.id());
        Ok(())
    }

    async fn reload(&self) -> Result<(), ServiceError> {
        let objects = self.store.reload().await?;
        check_keys(&self.store.list().await)?;
        self.staged.lock().await.clear();
        debug!(path = %self.store.path().display(), objects, "file storage reloaded");
        Ok(())
    }

    async fn close(&self) -> Result<(), ServiceError> {
        let mut staged = self.staged.lock().await;
        if !staged.is_empty() {
            debug!(discarded = staged.len(), "closing file session with unsaved changes");
        }
        staged.clear();
        Ok(())
    }

    fn amenity_links(&self) -> &dyn AmenityLinks {
        self
    }
}

#[async_trait]
impl AmenityLinks for FileStorage {
    /// Ids that no longer resolve are skipped.
    async fn linked_amenities(&self, place_id: &str) -> Result<Vec<amenity::Model>, ServiceError> {
        let Some(Object::Place(place)) = self.get(ObjectKind::Place, place_id).await? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(place.amenity_ids.len());
        for id in &place.amenity_ids {
            match self.get(ObjectKind::Amenity, id).await? {
                Some(Object::Amenity(a)) => out.push(a),
                _ => debug!(place_id, amenity_id = %id, "skipping orphaned amenity id"),
            }
        }
        Ok(out)
    }

    async fn is_linked(&self, place_id: &str, amenity_id: &str) -> Result<bool, ServiceError> {
        Ok(match self.get(ObjectKind::Place, place_id).await? {
            Some(Object::Place(p)) => p.amenity_ids.iter().any(|id| id == amenity_id),
            _ => false,
        })
    }

    async fn link(&self, place_id: &str, amenity_id: &str) -> Result<(), ServiceError> {
        self.staged.lock().await.stage_link(place_id, amenity_id, true);
        Ok(())
    }

    async fn unlink(&self, place_id: &str, amenity_id: &str) -> Result<(), ServiceError> {
        self.staged.lock().await.stage_link(place_id, amenity_id, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageEngine;
    use crate::resolver::Resolver;
    use crate::test_support::{file_engine, remove_file_engine};
    use models::{city, place, state};

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn links_from_two_sessions_both_survive() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let setup = engine.session();
        let wifi = setup.persist(amenity::Model::new("Wifi")).await?;
        let pool = setup.persist(amenity::Model::new("Pool")).await?;
        let loft = setup.persist(place::Model::new("city", "user", "Loft")).await?;

        let (first, second) = (engine.session(), engine.session());
        let seen_first = first.get_as::<place::Model>(&loft.id).await?.expect("place");
        let seen_second = second.get_as::<place::Model>(&loft.id).await?.expect("place");
        assert!(Resolver::new(first.as_ref()).link_amenity(&seen_first, &wifi.id).await?);
        assert!(Resolver::new(second.as_ref()).link_amenity(&seen_second, &pool.id).await?);
        first.save().await?;
        second.save().await?;

        let stored = engine.session().get_as::<place::Model>(&loft.id).await?.expect("place");
        assert_eq!(sorted(stored.amenity_ids), sorted(vec![wifi.id.clone(), pool.id.clone()]));
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn stale_place_update_keeps_committed_links() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let setup = engine.session();
        let wifi = setup.persist(amenity::Model::new("Wifi")).await?;
        let loft = setup.persist(place::Model::new("city", "user", "Loft")).await?;

        let editor = engine.session();
        let mut stale = editor.get_as::<place::Model>(&loft.id).await?.expect("place");

        let linker = engine.session();
        assert!(Resolver::new(linker.as_ref()).link_amenity(&loft, &wifi.id).await?);
        linker.save().await?;

        stale.name = "Renamed loft".into();
        editor.new(stale.into()).await?;
        editor.save().await?;

        let stored = engine.session().get_as::<place::Model>(&loft.id).await?.expect("place");
        assert_eq!(stored.name, "Renamed loft");
        assert_eq!(stored.amenity_ids, vec![wifi.id.clone()]);
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn staged_link_is_visible_before_save() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let session = engine.session();
        let wifi = session.persist(amenity::Model::new("Wifi")).await?;
        let loft = session.persist(place::Model::new("city", "user", "Loft")).await?;

        session.amenity_links().link(&loft.id, &wifi.id).await?;
        let seen = session.get_as::<place::Model>(&loft.id).await?.expect("place");
        assert_eq!(seen.amenity_ids, vec![wifi.id.clone()]);
        assert!(engine.session().get_as::<place::Model>(&loft.id).await?.expect("place").amenity_ids.is_empty());

        session.close().await?;
        assert!(!session.amenity_links().is_linked(&loft.id, &wifi.id).await?);
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn staged_objects_are_visible_before_save() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let session = engine.session();
        let s = state::Model::new("Oregon");
        session.new(s.clone().into()).await?;

        assert!(session.get(ObjectKind::State, &s.id).await?.is_some());
        assert_eq!(session.count(Some(ObjectKind::State)).await?, 1);
        // another session sees only committed state
        assert_eq!(engine.session().count(None).await?, 0);

        session.close().await?;
        assert!(session.get(ObjectKind::State, &s.id).await?.is_none());
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn save_persists_and_reopen_sees_it() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let session = engine.session();
        let s = state::Model::new("Oregon");
        let c = city::Model::new(&s.id, "Portland");
        let mut p = place::Model::new(&c.id, "user-1", "Loft");
        p.amenity_ids.push("amenity-1".into());
        session.new(s.clone().into()).await?;
        session.new(c.clone().into()).await?;
        session.new(p.clone().into()).await?;
        session.save().await?;
        session.close().await?;

        let reopened = StorageEngine::open_file(&path).await?;
        let fresh = reopened.session();
        fresh.reload().await?;
        assert_eq!(fresh.count(None).await?, 3);
        let stored = fresh.get_as::<place::Model>(&p.id).await?.expect("place persisted");
        assert_eq!(stored.amenity_ids, vec!["amenity-1".to_string()]);
        assert_eq!(stored.created_at, p.created_at);
        assert!(stored.updated_at >= p.updated_at);

        let raw: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        assert_eq!(raw[ObjectKind::City.key(&c.id)]["__class__"], "City");
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_then_save_removes() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let session = engine.session();
        let s = session.persist(state::Model::new("Utah")).await?;
        session.delete(&s.clone().into()).await?;
        assert!(session.get(ObjectKind::State, &s.id).await?.is_none());
        session.save().await?;
        assert!(engine.session().get(ObjectKind::State, &s.id).await?.is_none());
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_key_is_corrupt() -> Result<(), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("hbnb_mismatch_{}.json", uuid::Uuid::new_v4()));
        let s = state::Model::new("Idaho");
        let doc = serde_json::json!({ "State.someone-else": Object::from(s) });
        tokio::fs::write(&path, serde_json::to_vec(&doc)?).await?;

        let engine = StorageEngine::open_file(&path).await?;
        let res = engine.session().reload().await;
        assert!(matches!(res, Err(ServiceError::Corrupt(_))));
        remove_file_engine(path).await;
        Ok(())
    }
}
