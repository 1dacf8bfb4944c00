//! Collection query engine and record store library
//!
//! This library provides a generic record store (create, update, delete,
//! archive) mirrored write-through to a durable JSON snapshot, plus the
//! filter, sort, facet, and ranked-search machinery for turning a record
//! collection into an ordered, filtered view.

mod config;
mod errors;
mod filter;
mod helper;
mod query;
mod record;
mod snapshot;
mod sort;
mod store;
mod types;

// Re-export key components
pub use config::*;
pub use errors::*;
pub use filter::*;
pub use helper::*;
pub use query::*;
pub use record::*;
pub use snapshot::*;
pub use sort::*;
pub use store::*;
pub use types::*;
