//! Web API for human-readable endpoints
//!
//! Endpoints:
//!   GET /stats  -> directory-wide counts
//!   GET /health -> health check (mounted at the root in main)

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::directory::{DirectoryStats, RouteDirectory};

#[derive(Clone)]
pub struct WebApiState {
    pub directory: Arc<RouteDirectory>,
}

#[derive(Serialize)]
pub struct SystemStats {
    pub total_routes: usize,
    pub pending: usize,
    pub verified: usize,
    pub flagged: usize,
    pub total_tips: usize,
    pub pending_edits: usize,
}

impl From<DirectoryStats> for SystemStats {
    fn from(stats: DirectoryStats) -> Self {
        Self {
            total_routes: stats.total_routes,
            pending: stats.pending,
            verified: stats.verified,
            flagged: stats.flagged,
            total_tips: stats.total_tips,
            pending_edits: stats.pending_edits,
        }
    }
}

pub async fn get_stats(
    State(state): State<WebApiState>,
) -> Result<Json<SystemStats>, ApiError> {
    let stats = state.directory.stats().await?;
    Ok(Json(stats.into()))
}

/// Create the web API router
pub fn create_router(state: WebApiState) -> Router {
    Router::new().route("/stats", get(get_stats)).with_state(state)
}
