//! HTTP API for the route directory
//!
//! Provides REST routers for:
//! - Route endpoints (search, create, vote, tips, edit proposals)
//! - Moderation endpoints (pending edits, resolution)
//! - Web endpoints (stats, health)
//! - Middleware (optional auth, rate limiting, headers, body size)

pub mod edits;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod web;

pub use edits::{create_router as create_edit_router, EditApiState};
pub use error::ApiError;
pub use middleware::{
    body_size_middleware, optional_auth_middleware, rate_limit_middleware,
    security_headers_middleware, token_digest, AuthContext, AuthState, RateLimiter, SecurityState,
};
pub use routes::{create_router as create_route_router, RouteApiState};
pub use web::{create_router as create_web_router, WebApiState};
