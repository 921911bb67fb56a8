//! Derived associations computed from storage lookups.
//!
//! Owner links are plain id columns, so every "children of" query is a scan of
//! the child kind. The place/amenity association is the one place where the
//! backends differ: the file backend embeds `amenity_ids` in the place record,
//! the relational backend keeps a join table. Callers never branch on that.

use std::collections::{BTreeMap, BTreeSet};

use models::{amenity, city, place, review, Record};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::storage::Storage;

/// Body of a place search. Absent and empty lists both mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceSearch {
    pub states: Option<Vec<String>>,
    pub cities: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
}

fn non_empty(ids: &Option<Vec<String>>) -> Option<&[String]> {
    ids.as_deref().filter(|ids| !ids.is_empty())
}

pub struct Resolver<'a> {
    storage: &'a dyn Storage,
}

impl<'a> Resolver<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    async fn children<T, F>(&self, owned_by: F) -> Result<Vec<T>, ServiceError>
    where
        T: Record,
        F: Fn(&T) -> bool,
    {
        Ok(self.storage.all_of::<T>().await?.into_iter().filter(|r| owned_by(r)).collect())
    }

    pub async fn cities_of_state(&self, state_id: &str) -> Result<Vec<city::Model>, ServiceError> {
        self.children(|c: &city::Model| c.state_id == state_id).await
    }

    pub async fn places_of_city(&self, city_id: &str) -> Result<Vec<place::Model>, ServiceError> {
        self.children(|p: &place::Model| p.city_id == city_id).await
    }

    pub async fn reviews_of_place(&self, place_id: &str) -> Result<Vec<review::Model>, ServiceError> {
        self.children(|r: &review::Model| r.place_id == place_id).await
    }

    pub async fn places_of_user(&self, user_id: &str) -> Result<Vec<place::Model>, ServiceError> {
        self.children(|p: &place::Model| p.user_id == user_id).await
    }

    pub async fn reviews_of_user(&self, user_id: &str) -> Result<Vec<review::Model>, ServiceError> {
        self.children(|r: &review::Model| r.user_id == user_id).await
    }

    /// Amenities currently attached to `place`. Ids that no longer resolve are
    /// skipped.
    pub async fn amenities_of_place(&self, place: &place::Model) -> Result<Vec<amenity::Model>, ServiceError> {
        self.storage.amenity_links().linked_amenities(&place.id).await
    }

    /// Stage a link. Returns `false` when it already existed. The caller saves.
    pub async fn link_amenity(&self, place: &place::Model, amenity_id: &str) -> Result<bool, ServiceError> {
        let links = self.storage.amenity_links();
        if links.is_linked(&place.id, amenity_id).await? {
            return Ok(false);
        }
        links.link(&place.id, amenity_id).await?;
        Ok(true)
    }

    /// Stage an unlink. Returns `false`, staging nothing, when there was no
    /// link. The caller saves.
    pub async fn unlink_amenity(&self, place: &place::Model, amenity_id: &str) -> Result<bool, ServiceError> {
        let links = self.storage.amenity_links();
        if !links.is_linked(&place.id, amenity_id).await? {
            return Ok(false);
        }
        links.unlink(&place.id, amenity_id).await?;
        Ok(true)
    }

    /// Places in the union of the given states' cities and the given cities,
    /// keeping only those that carry every requested amenity. When that union
    /// names no city at all, every place is a candidate.
    pub async fn search_places(&self, query: &PlaceSearch) -> Result<Vec<place::Model>, ServiceError> {
        let mut city_ids: BTreeSet<String> = BTreeSet::new();
        if let Some(states) = non_empty(&query.states) {
            for state_id in states {
                city_ids.extend(self.cities_of_state(state_id).await?.into_iter().map(|c| c.id));
            }
        }
        if let Some(cities) = non_empty(&query.cities) {
            city_ids.extend(cities.iter().cloned());
        }

        let candidates: BTreeMap<String, place::Model> = self
            .storage
            .all_of::<place::Model>()
            .await?
            .into_iter()
            .filter(|p| city_ids.is_empty() || city_ids.contains(&p.city_id))
            .map(|p| (p.id.clone(), p))
            .collect();

        let Some(wanted) = non_empty(&query.amenities) else {
            return Ok(candidates.into_values().collect());
        };
        let mut out = Vec::new();
        for place in candidates.into_values() {
            let have: BTreeSet<String> =
                self.amenities_of_place(&place).await?.into_iter().map(|a| a.id).collect();
            if wanted.iter().all(|id| have.contains(id)) {
                out.push(place);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageEngine;
    use crate::test_support::{file_engine, remove_file_engine, sqlite_engine};
    use models::{state, user, ObjectKind};

    struct Fixture {
        s1: state::Model,
        bare: state::Model,
        c1: city::Model,
        c2: city::Model,
        c3: city::Model,
        p1: place::Model,
        p2: place::Model,
        p3: place::Model,
        a: amenity::Model,
        b: amenity::Model,
    }

    /// S1 owns C1 and C2, S2 owns C3, Wyoming owns nothing. P1{A,B} in C1, P2{A} in C2, P3{} in C3.
    async fn seed(engine: &StorageEngine) -> Result<Fixture, anyhow::Error> {
        let session = engine.session();
        let st = session.as_ref();
        let u = st.persist(user::Model::new("host@example.com", "hash")).await?;
        let s1 = st.persist(state::Model::new("California")).await?;
        let s2 = st.persist(state::Model::new("Nevada")).await?;
        let bare = st.persist(state::Model::new("Wyoming")).await?;
        let c1 = st.persist(city::Model::new(&s1.id, "San Francisco")).await?;
        let c2 = st.persist(city::Model::new(&s1.id, "Oakland")).await?;
        let c3 = st.persist(city::Model::new(&s2.id, "Reno")).await?;
        let a = st.persist(amenity::Model::new("Wifi")).await?;
        let b = st.persist(amenity::Model::new("Pool")).await?;
        let p1 = st.persist(place::Model::new(&c1.id, &u.id, "Loft")).await?;
        let p2 = st.persist(place::Model::new(&c2.id, &u.id, "Cottage")).await?;
        let p3 = st.persist(place::Model::new(&c3.id, &u.id, "Cabin")).await?;

        let resolver = Resolver::new(st);
        assert!(resolver.link_amenity(&p1, &a.id).await?);
        st.save().await?;
        let p1 = st.get_as::<place::Model>(&p1.id).await?.expect("p1");
        assert!(resolver.link_amenity(&p1, &b.id).await?);
        assert!(resolver.link_amenity(&p2, &a.id).await?);
        st.save().await?;
        session.close().await?;

        let fresh = engine.session();
        let p1 = fresh.get_as::<place::Model>(&p1.id).await?.expect("p1");
        let p2 = fresh.get_as::<place::Model>(&p2.id).await?.expect("p2");
        Ok(Fixture { s1, bare, c1, c2, c3, p1, p2, p3, a, b })
    }

    fn ids(places: &[place::Model]) -> BTreeSet<String> {
        places.iter().map(|p| p.id.clone()).collect()
    }

    async fn check_resolver(engine: &StorageEngine) -> Result<(), anyhow::Error> {
        let f = seed(engine).await?;
        let session = engine.session();
        let r = Resolver::new(session.as_ref());

        let cities: BTreeSet<_> = r.cities_of_state(&f.s1.id).await?.into_iter().map(|c| c.id).collect();
        assert_eq!(cities, BTreeSet::from([f.c1.id.clone(), f.c2.id.clone()]));
        assert_eq!(ids(&r.places_of_city(&f.c3.id).await?), BTreeSet::from([f.p3.id.clone()]));
        assert_eq!(r.places_of_user(&f.p1.user_id).await?.len(), 3);

        // AND semantics: both amenities required
        let both = PlaceSearch { amenities: Some(vec![f.a.id.clone(), f.b.id.clone()]), ..Default::default() };
        assert_eq!(ids(&r.search_places(&both).await?), BTreeSet::from([f.p1.id.clone()]));

        let only_a = PlaceSearch { amenities: Some(vec![f.a.id.clone()]), ..Default::default() };
        assert_eq!(ids(&r.search_places(&only_a).await?), BTreeSet::from([f.p1.id.clone(), f.p2.id.clone()]));

        let everything = r.search_places(&PlaceSearch::default()).await?;
        assert_eq!(everything.len(), 3);
        let empty_lists = PlaceSearch { states: Some(vec![]), cities: Some(vec![]), amenities: Some(vec![]) };
        assert_eq!(r.search_places(&empty_lists).await?.len(), 3);

        let by_state = PlaceSearch { states: Some(vec![f.s1.id.clone()]), ..Default::default() };
        assert_eq!(ids(&r.search_places(&by_state).await?), BTreeSet::from([f.p1.id.clone(), f.p2.id.clone()]));

        // state and city overlap collapses to one result per place
        let overlap = PlaceSearch {
            states: Some(vec![f.s1.id.clone()]),
            cities: Some(vec![f.c1.id.clone(), f.c3.id.clone()]),
            ..Default::default()
        };
        assert_eq!(r.search_places(&overlap).await?.len(), 3);

        let unknown_only = PlaceSearch { cities: Some(vec!["nope".into()]), ..Default::default() };
        assert!(r.search_places(&unknown_only).await?.is_empty());

        // states that expand to no city leave the place set unfiltered
        let cityless_state = PlaceSearch { states: Some(vec![f.bare.id.clone()]), ..Default::default() };
        assert_eq!(r.search_places(&cityless_state).await?.len(), 3);
        let unknown_state = PlaceSearch { states: Some(vec!["nope".into()]), ..Default::default() };
        assert_eq!(r.search_places(&unknown_state).await?.len(), 3);
        let unknown_state_and_city = PlaceSearch {
            states: Some(vec!["nope".into()]),
            cities: Some(vec![f.c3.id.clone()]),
            ..Default::default()
        };
        assert_eq!(ids(&r.search_places(&unknown_state_and_city).await?), BTreeSet::from([f.p3.id.clone()]));

        let unknown_amenity = PlaceSearch { amenities: Some(vec![f.a.id.clone(), "nope".into()]), ..Default::default() };
        assert!(r.search_places(&unknown_amenity).await?.is_empty());

        // linking twice never duplicates
        assert!(!r.link_amenity(&f.p1, &f.a.id).await?);
        assert_eq!(r.amenities_of_place(&f.p1).await?.len(), 2);

        // unlinking something not linked changes nothing
        assert!(!r.unlink_amenity(&f.p2, &f.b.id).await?);
        session.save().await?;
        assert_eq!(r.amenities_of_place(&f.p2).await?.len(), 1);

        for kind in ObjectKind::ALL {
            assert_eq!(session.count(Some(kind)).await?, session.all(Some(kind)).await?.len());
        }
        assert_eq!(session.count(None).await?, session.all(None).await?.len());
        Ok(())
    }

    #[tokio::test]
    async fn resolver_over_file_backend() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let res = check_resolver(&engine).await;
        remove_file_engine(path).await;
        res
    }

    #[tokio::test]
    async fn resolver_over_db_backend() -> Result<(), anyhow::Error> {
        let engine = sqlite_engine().await?;
        check_resolver(&engine).await
    }

    #[tokio::test]
    async fn file_backend_skips_orphaned_amenity_ids() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let session = engine.session();
        let a = session.persist(amenity::Model::new("Wifi")).await?;
        let mut p = place::Model::new("city", "user", "Loft");
        p.amenity_ids = vec![a.id.clone(), "gone".into()];
        let p = session.persist(p).await?;

        let r = Resolver::new(session.as_ref());
        let found = r.amenities_of_place(&p).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);

        session.delete(&a.clone().into()).await?;
        session.save().await?;
        assert!(r.amenities_of_place(&p).await?.is_empty());
        remove_file_engine(path).await;
        Ok(())
    }

    #[tokio::test]
    async fn unlink_removes_from_embedded_list() -> Result<(), anyhow::Error> {
        let (engine, path) = file_engine().await?;
        let session = engine.session();
        let a = session.persist(amenity::Model::new("Wifi")).await?;
        let p = session.persist(place::Model::new("city", "user", "Loft")).await?;
        let r = Resolver::new(session.as_ref());

        assert!(r.link_amenity(&p, &a.id).await?);
        session.save().await?;
        let p = session.get_as::<place::Model>(&p.id).await?.expect("place");
        assert_eq!(p.amenity_ids, vec![a.id.clone()]);

        assert!(r.unlink_amenity(&p, &a.id).await?);
        session.save().await?;
        let p = session.get_as::<place::Model>(&p.id).await?.expect("place");
        assert!(p.amenity_ids.is_empty());
        remove_file_engine(path).await;
        Ok(())
    }
}
