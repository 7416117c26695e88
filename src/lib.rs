//! Sawaari - community transit-route directory
//!
//! A REST backend where riders search, submit, vote on and annotate local
//! transport routes (shared autos, buses, e-rickshaws) with fares, timings
//! and tips. Routes earn verification through community upvotes; edits go
//! through a moderation queue.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management (SAWAARI_* env vars)
//! ├── model/         - Domain documents
//! │   ├── route.rs        - Route, fare/timing details, tips, metadata
//! │   ├── edit.rs         - Edit proposals awaiting moderation
//! │   └── contributor.rs  - Contributor accounts and stats
//! ├── reputation/    - Verification state machine (the core)
//! │   ├── engine.rs  - Pure vote transitions
//! │   └── policy.rs  - Verification threshold
//! ├── directory/     - Orchestrator over store + engine
//! │   └── manager.rs - RouteDirectory (in-memory, optional Postgres)
//! ├── database/      - PostgreSQL persistence
//! │   ├── pool.rs    - Connection pool + schema init
//! │   ├── routes.rs  - Route repository (atomic vote UPDATE)
//! │   ├── edits.rs   - Edit-proposal repository
//! │   ├── contributors.rs - Contributor repository
//! │   └── seed.rs    - Sample data for empty deployments
//! └── api/           - HTTP endpoints
//!     ├── routes.rs  - Route API
//!     ├── edits.rs   - Moderation API
//!     ├── web.rs     - Stats/health
//!     └── middleware.rs - Auth, rate limiting, headers
//! ```

pub mod api;
pub mod config;
pub mod database;
pub mod directory;
pub mod model;
pub mod reputation;

// Re-export main types for convenience
pub use api::{
    create_edit_router, create_route_router, create_web_router, ApiError, AuthContext, AuthState,
    EditApiState, RouteApiState, SecurityState, WebApiState,
};
pub use config::AppConfig;
pub use database::DatabasePool;
pub use directory::{DirectoryError, DirectoryStats, RouteDirectory};
pub use model::{
    Contributor, ContributorRole, EditProposal, EditStatus, EditType, NewEdit, NewRoute, Route,
    RouteMetadata, RouteStatus, Tip, TransportType,
};
pub use reputation::{cast_vote, new_metadata, VerificationPolicy, VoteEffect, VoteType};
