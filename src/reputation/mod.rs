//! Route verification state machine
//!
//! Maintains a route's `upvotes`, `downvotes`, `verifiedVotes` counters and
//! its `status`, and decides when a route leaves `pending`.
//!
//! ## State model
//!
//! ```text
//!              cast_vote(up) x threshold
//!   pending ─────────────────────────────► verified
//!      │                                      │
//!      └── (reserved: moderation) ► flagged ◄─┘
//! ```
//!
//! - Every up vote increments both `upvotes` and `verifiedVotes`,
//!   regardless of current status.
//! - Down votes only increment `downvotes`; they never gate or reverse
//!   verification. Verification is monotonic and one-directional.
//! - The pending → verified transition fires once `upvotes` reaches the
//!   policy threshold (default 10) and is idempotent thereafter.
//! - `flagged` has no transition into it here; it is reserved for a future
//!   moderation trigger and only exists as enum data.
//!
//! The engine is pure and synchronous. Atomicity of the read-modify-write
//! under concurrent votes is the storage layer's job; the Postgres
//! repository mirrors [`cast_vote`] as a single conditional UPDATE.

mod engine;
mod policy;

pub use engine::{cast_vote, new_metadata, VoteEffect, VoteType};
pub use policy::VerificationPolicy;
