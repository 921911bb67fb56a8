//! Storage engine and relationship resolver.
//! - `storage` hides the file and relational backends behind one session contract.
//! - `resolver` derives associations (state→cities, place↔amenities, search) on top of it.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod resolver;
#[cfg(test)]
pub mod test_support;

pub use resolver::{PlaceSearch, Resolver};
pub use storage::{Backend, Storage, StorageEngine};
