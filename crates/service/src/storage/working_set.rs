//! Per-session staging shared by both backends.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use models::{Object, ObjectKind};

/// A staged change to one object, keyed by `"<Class>.<id>"`.
#[derive(Clone, Debug)]
pub enum Change {
    Upsert(Object),
    Delete(ObjectKind, String),
}

/// Changes registered with a session but not yet saved.
#[derive(Debug, Default)]
pub struct WorkingSet {
    pending: HashMap<String, Change>,
    // (place_id, amenity_id) -> linked
    links: BTreeMap<(String, String), bool>,
}

impl WorkingSet {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.links.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.links.clear();
    }

    pub fn stage_upsert(&mut self, obj: Object) {
        self.pending.insert(obj.key(), Change::Upsert(obj));
    }

    pub fn stage_delete(&mut self, kind: ObjectKind, id: &str) {
        self.pending.insert(kind.key(id), Change::Delete(kind, id.to_string()));
    }

    pub fn stage_link(&mut self, place_id: &str, amenity_id: &str, linked: bool) {
        self.links.insert((place_id.to_string(), amenity_id.to_string()), linked);
    }

    /// `None` when nothing is staged for `key`, `Some(None)` for a staged delete.
    pub fn lookup(&self, key: &str) -> Option<Option<&Object>> {
        self.pending.get(key).map(|change| match change {
            Change::Upsert(obj) => Some(obj),
            Change::Delete(..) => None,
        })
    }

    pub fn link_state(&self, place_id: &str, amenity_id: &str) -> Option<bool> {
        self.links.get(&(place_id.to_string(), amenity_id.to_string())).copied()
    }

    /// Staged link changes touching `place_id`.
    pub fn links_of(&self, place_id: &str) -> impl Iterator<Item = (&str, bool)> + '_ {
        let place_id = place_id.to_string();
        self.links
            .iter()
            .filter(move |((p, _), _)| *p == place_id)
            .map(|((_, a), linked)| (a.as_str(), *linked))
    }

    /// Lay staged changes of `kind` (or every kind) over `committed`.
    pub fn overlay(&self, committed: &mut BTreeMap<String, Object>, kind: Option<ObjectKind>) {
        for (key, change) in &self.pending {
            match change {
                Change::Upsert(obj) if kind.map_or(true, |k| k == obj.kind()) => {
                    committed.insert(key.clone(), obj.clone());
                }
                Change::Delete(k, _) if kind.map_or(true, |want| want == *k) => {
                    committed.remove(key);
                }
                _ => {}
            }
        }
    }

    /// Snapshot of the staged changes with `updated_at` refreshed to `now` on
    /// every upsert. The working set itself is left intact until the caller
    /// confirms the commit.
    pub fn batch(&self, now: DateTime<Utc>) -> Batch {
        let mut upserts = Vec::new();
        let mut deletes = Vec::new();
        for change in self.pending.values() {
            match change {
                Change::Upsert(obj) => {
                    let mut obj = obj.clone();
                    obj.touch(now);
                    upserts.push(obj);
                }
                Change::Delete(kind, id) => deletes.push((*kind, id.clone())),
            }
        }
        let links = self.links.iter().map(|((p, a), l)| (p.clone(), a.clone(), *l)).collect();
        Batch { upserts, deletes, links }
    }
}

/// What one `save` commits.
#[derive(Debug, Default)]
pub struct Batch {
    pub upserts: Vec<Object>,
    pub deletes: Vec<(ObjectKind, String)>,
    pub links: Vec<(String, String, bool)>,
}
