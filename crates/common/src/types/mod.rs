use serde::{Deserialize, Serialize};

/// Body of `GET /status`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub status: String,
}

impl Status {
    pub fn ok() -> Self {
        Self { status: "OK".into() }
    }
}

/// Body of `GET /stats`: number of stored objects per resource.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub amenities: usize,
    pub cities: usize,
    pub places: usize,
    pub reviews: usize,
    pub states: usize,
    pub users: usize,
}
