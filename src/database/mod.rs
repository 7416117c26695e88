//! PostgreSQL persistence
//!
//! One repository per entity, all owned by [`pool::DatabasePool`]. Document
//! shaped fields live in JSONB; everything the read paths filter or the
//! vote path atomically updates is a scalar column.

pub mod contributors;
pub mod edits;
pub mod pool;
pub mod routes;
pub mod seed;

pub use pool::DatabasePool;
