//! Moderation API endpoints
//!
//! Endpoints:
//!   GET  /pending        -> pending edit proposals, oldest first
//!   POST /{id}/resolve   -> approve or reject a proposal, exactly once
//!
//! Resolution records the decision, reviewer and note. Approval does NOT
//! apply `changes` to the target route: the merge policy is an unresolved
//! product decision and is deliberately left unimplemented.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::middleware::AuthContext;
use crate::directory::RouteDirectory;
use crate::model::{Contributor, EditProposal, EditStatus};

/// API state for moderation endpoints
#[derive(Clone)]
pub struct EditApiState {
    pub directory: Arc<RouteDirectory>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    fn to_status(self) -> EditStatus {
        match self {
            Decision::Approved => EditStatus::Approved,
            Decision::Rejected => EditStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub decision: Decision,
    #[serde(default)]
    pub review_note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingEditsResponse {
    pub total: usize,
    pub edits: Vec<EditProposal>,
}

fn require_moderator(auth: &AuthContext) -> Result<&Contributor, ApiError> {
    let contributor = auth.contributor.as_ref().ok_or(ApiError::Unauthorized)?;
    if !contributor.role.can_moderate() {
        return Err(ApiError::Forbidden);
    }
    Ok(contributor)
}

/// GET /pending - list proposals awaiting review
pub async fn pending_edits(
    State(state): State<EditApiState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<PendingEditsResponse>, ApiError> {
    require_moderator(&auth)?;

    let edits = state.directory.pending_edits().await?;
    Ok(Json(PendingEditsResponse {
        total: edits.len(),
        edits,
    }))
}

/// POST /{id}/resolve - approve or reject, recording the reviewer
pub async fn resolve_edit(
    State(state): State<EditApiState>,
    Path(id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ResolveRequest>,
) -> Result<Json<EditProposal>, ApiError> {
    let moderator = require_moderator(&auth)?;
    let reviewer = moderator.id;

    let proposal = state
        .directory
        .resolve_edit(id, payload.decision.to_status(), reviewer, payload.review_note)
        .await?;

    info!(
        edit_id = %id,
        reviewer = %reviewer,
        status = proposal.status.as_str(),
        "Edit proposal resolved"
    );
    Ok(Json(proposal))
}

/// Create the moderation API router
pub fn create_router(state: EditApiState) -> Router {
    Router::new()
        .route("/pending", get(pending_edits))
        .route("/{id}/resolve", post(resolve_edit))
        .with_state(state)
}
