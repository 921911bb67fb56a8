//! Type-erased records and typed access to them.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::kind::ObjectKind;
use crate::{amenity, city, place, review, state, user};

/// New identifier plus the instant used for both timestamps.
pub(crate) fn fresh_identity() -> (String, DateTime<Utc>) {
    (Uuid::new_v4().to_string(), Utc::now())
}

/// Any persisted record. Serialises with a `__class__` tag, which is also the
/// on-disk shape used by the file backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Object {
    Amenity(amenity::Model),
    City(city::Model),
    Place(place::Model),
    Review(review::Model),
    State(state::Model),
    User(user::Model),
}

macro_rules! each_variant {
    ($obj:expr, $m:ident => $body:expr) => {
        match $obj {
            Object::Amenity($m) => $body,
            Object::City($m) => $body,
            Object::Place($m) => $body,
            Object::Review($m) => $body,
            Object::State($m) => $body,
            Object::User($m) => $body,
        }
    };
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Amenity(_) => ObjectKind::Amenity,
            Object::City(_) => ObjectKind::City,
            Object::Place(_) => ObjectKind::Place,
            Object::Review(_) => ObjectKind::Review,
            Object::State(_) => ObjectKind::State,
            Object::User(_) => ObjectKind::User,
        }
    }

    pub fn id(&self) -> &str {
        each_variant!(self, m => m.id.as_str())
    }

    /// `"<Class>.<id>"`
    pub fn key(&self) -> String {
        self.kind().key(self.id())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        each_variant!(self, m => m.created_at)
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        each_variant!(self, m => m.updated_at)
    }

    /// Refresh the modification time. Identity and creation time never move.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        each_variant!(self, m => m.updated_at = now)
    }

    /// Narrow to a concrete record type.
    pub fn into_record<T: Record>(self) -> Option<T> {
        T::from_object(self)
    }
}

/// A concrete record type that can round-trip through [`Object`].
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ObjectKind;

    /// Keys a client payload may never overwrite.
    const PROTECTED: &'static [&'static str];

    fn id(&self) -> &str;

    fn into_object(self) -> Object;

    fn from_object(obj: Object) -> Option<Self>;
}

macro_rules! impl_record {
    ($model:ty, $variant:ident, [$($extra:literal),*]) => {
        impl Record for $model {
            const KIND: ObjectKind = ObjectKind::$variant;
            const PROTECTED: &'static [&'static str] = &["id", "created_at", "updated_at" $(, $extra)*];

            fn id(&self) -> &str {
                &self.id
            }

            fn into_object(self) -> Object {
                Object::$variant(self)
            }

            fn from_object(obj: Object) -> Option<Self> {
                match obj {
                    Object::$variant(m) => Some(m),
                    _ => None,
                }
            }
        }

        impl From<$model> for Object {
            fn from(m: $model) -> Self {
                Object::$variant(m)
            }
        }
    };
}

impl_record!(amenity::Model, Amenity, []);
impl_record!(city::Model, City, ["state_id"]);
impl_record!(place::Model, Place, ["city_id", "user_id", "amenity_ids"]);
impl_record!(review::Model, Review, ["place_id", "user_id"]);
impl_record!(state::Model, State, []);
impl_record!(user::Model, User, ["email"]);

/// Overlay client-supplied fields onto `record`.
///
/// Protected keys and keys the record does not have are skipped; a value of the
/// wrong JSON type is a validation error.
pub fn merge_payload<T: Record>(record: &T, payload: &Map<String, Value>) -> Result<T, ModelError> {
    let mut value = serde_json::to_value(record).map_err(|e| ModelError::Validation(e.to_string()))?;
    let fields = value
        .as_object_mut()
        .ok_or_else(|| ModelError::Validation(format!("{} is not a JSON object", T::KIND)))?;
    for (key, v) in payload {
        if T::PROTECTED.contains(&key.as_str()) {
            continue;
        }
        if let Some(slot) = fields.get_mut(key) {
            *slot = v.clone();
        }
    }
    serde_json::from_value(value).map_err(|e| ModelError::Validation(format!("invalid {} field: {e}", T::KIND)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn new_records_have_identity_and_equal_timestamps() {
        let s = state::Model::new("California");
        assert_eq!(s.id.len(), 36);
        assert_eq!(s.created_at, s.updated_at);
        assert_ne!(state::Model::new("Nevada").id, s.id);
    }

    #[test]
    fn serialises_with_class_tag() {
        let obj = Object::from(state::Model::new("California"));
        let v = serde_json::to_value(&obj).unwrap();
        assert_eq!(v["__class__"], "State");
        assert_eq!(v["name"], "California");
        let back: Object = serde_json::from_value(v).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn touch_moves_only_updated_at() {
        let mut obj = Object::from(amenity::Model::new("Wifi"));
        let (id, created) = (obj.id().to_string(), obj.created_at());
        let later = created + chrono::Duration::seconds(5);
        obj.touch(later);
        assert_eq!(obj.id(), id);
        assert_eq!(obj.created_at(), created);
        assert_eq!(obj.updated_at(), later);
    }

    #[test]
    fn merge_ignores_protected_keys() {
        let city = city::Model::new("state-1", "San Francisco");
        let merged = merge_payload(
            &city,
            &payload(json!({
                "id": "forged",
                "created_at": "2000-01-01T00:00:00Z",
                "state_id": "state-2",
                "name": "Oakland",
                "unknown": 1
            })),
        )
        .unwrap();
        assert_eq!(merged.id, city.id);
        assert_eq!(merged.created_at, city.created_at);
        assert_eq!(merged.state_id, "state-1");
        assert_eq!(merged.name, "Oakland");
    }

    #[test]
    fn merge_rejects_wrong_types() {
        let place = place::Model::new("c", "u", "Loft");
        let err = merge_payload(&place, &payload(json!({"number_rooms": "three"}))).unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
    }

    #[test]
    fn merge_sets_optional_fields() {
        let user = user::Model::new("a@b.c", "hash");
        let merged = merge_payload(&user, &payload(json!({"first_name": "Betty", "email": "x@y.z"}))).unwrap();
        assert_eq!(merged.first_name.as_deref(), Some("Betty"));
        assert_eq!(merged.email, "a@b.c");
    }

    #[test]
    fn narrowing_to_the_wrong_type_is_none() {
        let obj = Object::from(state::Model::new("Texas"));
        assert!(obj.clone().into_record::<city::Model>().is_none());
        assert_eq!(obj.into_record::<state::Model>().unwrap().name, "Texas");
    }
}
