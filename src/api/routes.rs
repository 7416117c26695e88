//! Route API endpoints
//!
//! Endpoints:
//!   GET  /search            -> substring search with transport filter
//!   GET  /popular           -> most-upvoted verified routes
//!   GET  /nearby            -> proximity search on the origin coordinate
//!   GET  /{id}              -> single route
//!   POST /                  -> create route
//!   POST /{id}/vote         -> cast a vote (drives verification)
//!   POST /{id}/tips         -> append a community tip
//!   POST /{id}/edit         -> file an edit proposal

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::middleware::AuthContext;
use crate::directory::RouteDirectory;
use crate::model::{EditProposal, NewEdit, NewRoute, Route, TransportType};
use crate::reputation::VoteType;

/// API state for route endpoints
#[derive(Clone)]
pub struct RouteApiState {
    pub directory: Arc<RouteDirectory>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "transportType")]
    pub transport_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Radius in meters
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// `up` or `down`; anything else is accepted as a no-op
    #[serde(rename = "type")]
    pub vote_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TipRequest {
    pub text: String,
}

/// GET /search?from=&to=&transportType=
pub async fn search_routes(
    State(state): State<RouteApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Route>>, ApiError> {
    // `all` or an unknown value means no transport filter
    let transport = query
        .transport_type
        .as_deref()
        .and_then(TransportType::parse_filter);

    let results = state
        .directory
        .search(query.from.as_deref(), query.to.as_deref(), transport)
        .await?;
    Ok(Json(results))
}

/// GET /popular
pub async fn popular_routes(
    State(state): State<RouteApiState>,
) -> Result<Json<Vec<Route>>, ApiError> {
    Ok(Json(state.directory.popular().await?))
}

/// GET /nearby?lat=&lng=&radius=
pub async fn nearby_routes(
    State(state): State<RouteApiState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<Route>>, ApiError> {
    let radius = query.radius.unwrap_or(5000.0);
    if !query.lat.is_finite() || !query.lng.is_finite() || !radius.is_finite() || radius <= 0.0 {
        return Err(ApiError::Validation(
            "lat, lng and radius must be finite and radius positive".to_string(),
        ));
    }

    Ok(Json(state.directory.nearby(query.lat, query.lng, radius).await?))
}

/// GET /{id}
pub async fn get_route(
    State(state): State<RouteApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(state.directory.get_route(id).await?))
}

/// POST / - create a route; the contributor (if authenticated) is recorded
/// as creator and their routes-added stat increments
pub async fn create_route(
    State(state): State<RouteApiState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<NewRoute>,
) -> Result<(StatusCode, Json<Route>), ApiError> {
    let contributor = auth.contributor.as_ref().map(|c| c.id);
    let route = state.directory.create_route(payload, contributor).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

/// POST /{id}/vote - apply one vote to the verification state machine
pub async fn vote_route(
    State(state): State<RouteApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Route>, ApiError> {
    let vote = VoteType::parse(&payload.vote_type);
    if vote.is_none() {
        debug!(route_id = %id, vote_type = %payload.vote_type, "Unrecognized vote type, no-op");
    }

    let route = state.directory.cast_vote(id, vote).await?;
    Ok(Json(route))
}

/// POST /{id}/tips - append a tip; reputation state is untouched
pub async fn add_tip(
    State(state): State<RouteApiState>,
    Path(id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<TipRequest>,
) -> Result<Json<Route>, ApiError> {
    let author = auth.contributor.as_ref().map(|c| c.id);
    let route = state.directory.add_tip(id, payload.text, author).await?;
    Ok(Json(route))
}

/// POST /{id}/edit - file an edit proposal for moderation; the target route
/// is not modified
pub async fn submit_edit(
    State(state): State<RouteApiState>,
    Path(id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<NewEdit>,
) -> Result<(StatusCode, Json<EditProposal>), ApiError> {
    let submitter = auth.contributor.as_ref().map(|c| c.id);
    let proposal = state.directory.submit_edit(id, payload, submitter).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// Create the route API router
pub fn create_router(state: RouteApiState) -> Router {
    Router::new()
        .route("/", post(create_route))
        .route("/search", get(search_routes))
        .route("/popular", get(popular_routes))
        .route("/nearby", get(nearby_routes))
        .route("/{id}", get(get_route))
        .route("/{id}/vote", post(vote_route))
        .route("/{id}/tips", post(add_tip))
        .route("/{id}/edit", post(submit_edit))
        .with_state(state)
}
