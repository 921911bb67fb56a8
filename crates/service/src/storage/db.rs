//! Relational backend over sea-orm. Committed state lives in the database; a
//! session only holds its staged changes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use models::{amenity, city, place, place_amenity, review, state, user, Object, ObjectKind};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::debug;

use super::working_set::WorkingSet;
use super::{AmenityLinks, Backend, Storage};
use crate::errors::ServiceError;

/// Run `$body` with `$ent` bound to the entity module for `$kind`.
macro_rules! per_kind {
    ($kind:expr, $ent:ident => $body:expr) => {
        match $kind {
            ObjectKind::Amenity => {
                use models::amenity as $ent;
                $body
            }
            ObjectKind::City => {
                use models::city as $ent;
                $body
            }
            ObjectKind::Place => {
                use models::place as $ent;
                $body
            }
            ObjectKind::Review => {
                use models::review as $ent;
                $body
            }
            ObjectKind::State => {
                use models::state as $ent;
                $body
            }
            ObjectKind::User => {
                use models::user as $ent;
                $body
            }
        }
    };
}

pub struct DbStorage {
    db: DatabaseConnection,
    staged: Mutex<WorkingSet>,
}

impl DbStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, staged: Mutex::new(WorkingSet::default()) }
    }

    async fn fetch(&self, kind: ObjectKind, id: &str) -> Result<Option<Object>, ServiceError> {
        let id = id.to_string();
        let found = per_kind!(kind, ent => ent::Entity::find_by_id(id).one(&self.db).await?.map(Object::from));
        Ok(found)
    }

    async fn fetch_all(&self, kind: ObjectKind, out: &mut BTreeMap<String, Object>) -> Result<(), ServiceError> {
        let rows: Vec<Object> = per_kind!(kind, ent => ent::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(Object::from)
            .collect());
        out.extend(rows.into_iter().map(|obj| (obj.key(), obj)));
        Ok(())
    }

    async fn count_committed(&self, kind: ObjectKind) -> Result<usize, ServiceError> {
        let n = per_kind!(kind, ent => ent::Entity::find().count(&self.db).await?);
        Ok(n as usize)
    }
}

async fn upsert<C: ConnectionTrait>(conn: &C, obj: Object) -> Result<(), ServiceError> {
    macro_rules! upsert {
        ($ent:ident, $m:expr) => {{
            let exists = $ent::Entity::find_by_id($m.id.clone()).one(conn).await?.is_some();
            let active = $m.to_active_model();
            if exists {
                active.update(conn).await?;
            } else {
                active.insert(conn).await?;
            }
        }};
    }
    match obj {
        Object::Amenity(m) => upsert!(amenity, m),
        Object::City(m) => upsert!(city, m),
        Object::Place(m) => upsert!(place, m),
        Object::Review(m) => upsert!(review, m),
        Object::State(m) => upsert!(state, m),
        Object::User(m) => upsert!(user, m),
    }
    Ok(())
}

async fn remove<C: ConnectionTrait>(conn: &C, kind: ObjectKind, id: String) -> Result<(), ServiceError> {
    // join rows go first so the delete does not depend on FK cascade support
    match kind {
        ObjectKind::Place => {
            place_amenity::Entity::delete_many()
                .filter(place_amenity::Column::PlaceId.eq(id.clone()))
                .exec(conn)
                .await?;
        }
        ObjectKind::Amenity => {
            place_amenity::Entity::delete_many()
                .filter(place_amenity::Column::AmenityId.eq(id.clone()))
                .exec(conn)
                .await?;
        }
        _ => {}
    }
    per_kind!(kind, ent => ent::Entity::delete_by_id(id).exec(conn).await?);
    Ok(())
}

async fn apply_link<C: ConnectionTrait>(conn: &C, place_id: String, amenity_id: String, linked: bool) -> Result<(), ServiceError> {
    let key = (place_id.clone(), amenity_id.clone());
    let exists = place_amenity::Entity::find_by_id(key.clone()).one(conn).await?.is_some();
    if linked && !exists {
        place_amenity::ActiveModel { place_id: Set(place_id), amenity_id: Set(amenity_id) }
            .insert(conn)
            .await?;
    } else if !linked && exists {
        place_amenity::Entity::delete_by_id(key).exec(conn).await?;
    }
    Ok(())
}

#[async_trait]
impl Storage for DbStorage {
    fn backend(&self) -> Backend {
        Backend::Db
    }

    async fn get(&self, kind: ObjectKind, id: &str) -> Result<Option<Object>, ServiceError> {
        if let Some(staged) = self.staged.lock().await.lookup(&kind.key(id)) {
            return Ok(staged.cloned());
        }
        self.fetch(kind, id).await
    }

    async fn all(&self, kind: Option<ObjectKind>) -> Result<BTreeMap<String, Object>, ServiceError> {
        let mut out = BTreeMap::new();
        match kind {
            Some(k) => self.fetch_all(k, &mut out).await?,
            None => {
                for k in ObjectKind::ALL {
                    self.fetch_all(k, &mut out).await?;
                }
            }
        }
        self.staged.lock().await.overlay(&mut out, kind);
        Ok(out)
    }

    async fn count(&self, kind: Option<ObjectKind>) -> Result<usize, ServiceError> {
        if !self.staged.lock().await.is_empty() {
            return Ok(self.all(kind).await?.len());
        }
        match kind {
            Some(k) => self.count_committed(k).await,
            None => {
                let mut total = 0;
                for k in ObjectKind::ALL {
                    total += self.count_committed(k).await?;
                }
                Ok(total)
            }
        }
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
        let batch = staged.batch(Utc::now());
        let (upserts, deletes, links) = (batch.upserts.len(), batch.deletes.len(), batch.links.len());

        let txn = self.db.begin().await?;
        for obj in batch.upserts {
            upsert(&txn, obj).await?;
        }
        for (place_id, amenity_id, linked) in batch.links {
            apply_link(&txn, place_id, amenity_id, linked).await?;
        }
        for (kind, id) in batch.deletes {
            remove(&txn, kind, id).await?;
        }
        txn.commit().await?;

        staged.clear();
        debug!(upserts, deletes, links, "db storage saved");
        Ok(())
    }

    async fn delete(&self, obj: &Object) -> Result<(), ServiceError> {
        self.staged.lock().await.stage_delete(obj.kind(), obj.id());
        Ok(())
    }

    async fn reload(&self) -> Result<(), ServiceError> {
        self.db.ping().await?;
        self.staged.lock().await.clear();
        debug!(backend = ?self.db.get_database_backend(), "db storage reloaded");
        Ok(())
    }

    async fn close(&self) -> Result<(), ServiceError> {
        let mut staged = self.staged.lock().await;
        if !staged.is_empty() {
            debug!(discarded = staged.len(), "closing db session with unsaved changes");
        }
        staged.clear();
        Ok(())
    }

    fn amenity_links(&self) -> &dyn AmenityLinks {
        self
    }
}

#[async_trait]
impl AmenityLinks for DbStorage {
    async fn linked_amenities(&self, place_id: &str) -> Result<Vec<amenity::Model>, ServiceError> {
        let mut by_id: BTreeMap<String, amenity::Model> = BTreeMap::new();
        if let Some(p) = place::Entity::find_by_id(place_id.to_string()).one(&self.db).await? {
            for a in p.find_related(amenity::Entity).all(&self.db).await? {
                by_id.insert(a.id.clone(), a);
            }
        }

        let staged_links: Vec<(String, bool)> = {
            let staged = self.staged.lock().await;
            staged.links_of(place_id).map(|(a, linked)| (a.to_string(), linked)).collect()
        };
        for (amenity_id, linked) in staged_links {
            if !linked {
                by_id.remove(&amenity_id);
            } else if !by_id.contains_key(&amenity_id) {
                if let Some(Object::Amenity(a)) = self.fetch(ObjectKind::Amenity, &amenity_id).await? {
                    by_id.insert(amenity_id, a);
                }
            }
        }

        // staged renames and deletions of the amenities themselves
        let staged = self.staged.lock().await;
        let mut out = Vec::with_capacity(by_id.len());
        for (id, committed) in by_id {
            match staged.lookup(&ObjectKind::Amenity.key(&id)) {
                Some(Some(Object::Amenity(a))) => out.push(a.clone()),
                Some(_) => {}
                None => out.push(committed),
            }
        }
        Ok(out)
    }

    async fn is_linked(&self, place_id: &str, amenity_id: &str) -> Result<bool, ServiceError> {
        if let Some(linked) = self.staged.lock().await.link_state(place_id, amenity_id) {
            return Ok(linked);
        }
        let key = (place_id.to_string(), amenity_id.to_string());
        Ok(place_amenity::Entity::find_by_id(key).one(&self.db).await?.is_some())
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
