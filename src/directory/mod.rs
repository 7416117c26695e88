//! Directory orchestrator
//!
//! [`RouteDirectory`] owns the store (in-memory, with optional Postgres
//! write-through) and drives the reputation engine on the three external
//! events: a vote cast, a tip added, an edit proposal created or resolved.

mod manager;

pub use manager::{DirectoryError, DirectoryStats, RouteDirectory};
