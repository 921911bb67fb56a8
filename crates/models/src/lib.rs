//! Entity model: the six domain records, their relational mapping and the
//! type-erased [`Object`] used by storage backends.

pub mod errors;
pub mod db;
pub mod kind;
pub mod object;
pub mod state;
pub mod city;
pub mod user;
pub mod amenity;
pub mod place;
pub mod review;
pub mod place_amenity;

pub use kind::ObjectKind;
pub use object::{merge_payload, Object, Record};

#[cfg(test)]
mod tests;
