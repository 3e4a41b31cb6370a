//! Client-side server state: a keyed query cache shared by every view.

pub mod query_cache;
pub mod query_key;

pub use query_cache::QueryCache;
pub use query_key::QueryKey;
