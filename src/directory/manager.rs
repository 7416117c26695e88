//! Route directory - main orchestrator
//!
//! Coordinates validation, the verification state machine, and persistence.
//! Runs against Postgres when configured; falls back to an in-memory store
//! otherwise (used by tests and small deployments).

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::pool::DatabasePool;
use crate::model::{
    Contributor, EditProposal, EditStatus, NewEdit, NewRoute, Place, Route, RouteStatus, Tip,
    TransportType,
};
use crate::reputation::{cast_vote, new_metadata, VerificationPolicy, VoteType};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("route not found")]
    RouteNotFound,

    #[error("edit proposal not found")]
    EditNotFound,

    #[error("contributor not found")]
    ContributorNotFound,

    #[error("invalid payload: {0}")]
    Validation(String),

    #[error("edit proposal already resolved")]
    AlreadyResolved,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Aggregate counts for the stats endpoint
#[derive(Debug, Clone, serde::Serialize)]
pub struct DirectoryStats {
    pub total_routes: usize,
    pub pending: usize,
    pub verified: usize,
    pub flagged: usize,
    pub total_tips: usize,
    pub pending_edits: usize,
}

/// The directory. Operations are read-modify-write over a single route;
/// routes are fully independent of each other.
pub struct RouteDirectory {
    policy: VerificationPolicy,
    db: Option<Arc<DatabasePool>>,

    // In-memory store, authoritative only when db is None
    routes: RwLock<HashMap<Uuid, Route>>,
    edits: RwLock<HashMap<Uuid, EditProposal>>,
    contributors: RwLock<HashMap<Uuid, Contributor>>,
    // token digest -> contributor id
    tokens: RwLock<HashMap<String, Uuid>>,
}

impl RouteDirectory {
    pub fn new(policy: VerificationPolicy) -> Self {
        Self {
            policy,
            db: None,
            routes: RwLock::new(HashMap::new()),
            edits: RwLock::new(HashMap::new()),
            contributors: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_database(mut self, db: Arc<DatabasePool>) -> Self {
        self.db = Some(db);
        self
    }

    pub fn policy(&self) -> VerificationPolicy {
        self.policy
    }

    /// Create a route. Validation runs before any state is initialized; on
    /// success the reputation fields start zeroed and pending, and the
    /// contributor's `routes_added` counter increments by exactly 1.
    pub async fn create_route(
        &self,
        payload: NewRoute,
        contributor: Option<Uuid>,
    ) -> Result<Route, DirectoryError> {
        payload.validate().map_err(DirectoryError::Validation)?;

        let now = Utc::now();
        let route = Route {
            id: Uuid::new_v4(),
            from: payload.from,
            to: payload.to,
            transport_type: payload.transport_type,
            identifier: payload.identifier,
            stops: payload.stops,
            fare: payload.fare,
            timings: payload.timings,
            tips: Vec::new(),
            metadata: new_metadata(),
            created_by: contributor,
            created_at: now,
            updated_at: now,
        };

        if let Some(ref db) = self.db {
            db.routes()
                .insert(&route)
                .await
                .map_err(DirectoryError::Storage)?;
            if let Some(contributor_id) = contributor {
                db.contributors()
                    .increment_routes_added(contributor_id)
                    .await
                    .map_err(DirectoryError::Storage)?;
            }
        } else {
            self.routes.write().await.insert(route.id, route.clone());
            if let Some(contributor_id) = contributor {
                let mut contributors = self.contributors.write().await;
                if let Some(entry) = contributors.get_mut(&contributor_id) {
                    entry.stats.routes_added += 1;
                }
            }
        }

        info!(
            route_id = %route.id,
            from = %route.from.name,
            to = %route.to.name,
            transport = route.transport_type.as_str(),
            "Route created"
        );
        Ok(route)
    }

    pub async fn get_route(&self, id: Uuid) -> Result<Route, DirectoryError> {
        if let Some(ref db) = self.db {
            db.routes()
                .get(id)
                .await
                .map_err(DirectoryError::Storage)?
                .ok_or(DirectoryError::RouteNotFound)
        } else {
            self.routes
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or(DirectoryError::RouteNotFound)
        }
    }

    /// Apply one vote to a route. `vote` is `None` for an unrecognized wire
    /// value, which is accepted as a no-op: the route is returned unchanged
    /// (a missing route is still reported as not found).
    pub async fn cast_vote(
        &self,
        id: Uuid,
        vote: Option<VoteType>,
    ) -> Result<Route, DirectoryError> {
        let Some(vote) = vote else {
            return self.get_route(id).await;
        };

        if let Some(ref db) = self.db {
            // Single conditional UPDATE: increments and the threshold check
            // serialize at the database so concurrent votes are never lost.
            let route = db
                .routes()
                .cast_vote(id, vote, &self.policy)
                .await
                .map_err(DirectoryError::Storage)?
                .ok_or(DirectoryError::RouteNotFound)?;
            debug!(route_id = %id, vote = ?vote, status = route.metadata.status.as_str(), "Vote recorded");
            return Ok(route);
        }

        let mut routes = self.routes.write().await;
        let route = routes.get_mut(&id).ok_or(DirectoryError::RouteNotFound)?;

        let effect = cast_vote(&mut route.metadata, vote, &self.policy, Utc::now());
        route.updated_at = Utc::now();
        if effect.newly_verified {
            info!(route_id = %id, upvotes = route.metadata.upvotes, "Route auto-verified");
        }
        Ok(route.clone())
    }

    /// Append a tip. Tips never touch reputation state; collection order is
    /// insertion order, newest last.
    pub async fn add_tip(
        &self,
        id: Uuid,
        text: String,
        author: Option<Uuid>,
    ) -> Result<Route, DirectoryError> {
        if text.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "tip text must not be empty".to_string(),
            ));
        }

        let tip = Tip {
            user_id: author,
            text,
            votes: 0,
            created_at: Utc::now(),
        };

        if let Some(ref db) = self.db {
            return db
                .routes()
                .append_tip(id, &tip)
                .await
                .map_err(DirectoryError::Storage)?
                .ok_or(DirectoryError::RouteNotFound);
        }

        let mut routes = self.routes.write().await;
        let route = routes.get_mut(&id).ok_or(DirectoryError::RouteNotFound)?;
        route.tips.push(tip);
        route.updated_at = Utc::now();
        Ok(route.clone())
    }

    /// File an edit proposal against an existing route. The target route is
    /// not mutated; the proposal waits for moderation.
    pub async fn submit_edit(
        &self,
        route_id: Uuid,
        payload: NewEdit,
        submitter: Option<Uuid>,
    ) -> Result<EditProposal, DirectoryError> {
        // Existence check first so a bad route id mutates nothing
        self.get_route(route_id).await?;

        let now = Utc::now();
        let proposal = EditProposal {
            id: Uuid::new_v4(),
            route_id,
            edit_type: payload.edit_type,
            changes: payload.changes,
            submitted_by: submitter,
            status: EditStatus::Pending,
            reviewed_by: None,
            review_note: None,
            created_at: now,
            updated_at: now,
        };

        if let Some(ref db) = self.db {
            db.edits()
                .insert(&proposal)
                .await
                .map_err(DirectoryError::Storage)?;
        } else {
            self.edits.write().await.insert(proposal.id, proposal.clone());
        }

        info!(
            edit_id = %proposal.id,
            route_id = %route_id,
            edit_type = proposal.edit_type.as_str(),
            "Edit proposal submitted"
        );
        Ok(proposal)
    }

    pub async fn pending_edits(&self) -> Result<Vec<EditProposal>, DirectoryError> {
        if let Some(ref db) = self.db {
            return db
                .edits()
                .list_pending()
                .await
                .map_err(DirectoryError::Storage);
        }

        let edits = self.edits.read().await;
        let mut pending: Vec<EditProposal> = edits
            .values()
            .filter(|e| e.status == EditStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|e| e.created_at);
        Ok(pending)
    }

    /// Resolve a pending proposal to approved or rejected, exactly once.
    ///
    /// Approval records the decision (reviewer, note, submitter stat) and
    /// deliberately does NOT merge `changes` into the target route; applying
    /// the payload is an unresolved product decision.
    pub async fn resolve_edit(
        &self,
        edit_id: Uuid,
        decision: EditStatus,
        reviewer: Uuid,
        note: Option<String>,
    ) -> Result<EditProposal, DirectoryError> {
        if decision == EditStatus::Pending {
            return Err(DirectoryError::Validation(
                "decision must be approved or rejected".to_string(),
            ));
        }

        if let Some(ref db) = self.db {
            let resolved = db
                .edits()
                .resolve(edit_id, decision, reviewer, note.as_deref())
                .await
                .map_err(DirectoryError::Storage)?;
            let Some(proposal) = resolved else {
                // No pending row matched: either missing or already resolved
                let existing = db
                    .edits()
                    .get(edit_id)
                    .await
                    .map_err(DirectoryError::Storage)?;
                return Err(match existing {
                    Some(_) => DirectoryError::AlreadyResolved,
                    None => DirectoryError::EditNotFound,
                });
            };
            if decision == EditStatus::Approved {
                if let Some(submitter) = proposal.submitted_by {
                    db.contributors()
                        .increment_edits_approved(submitter)
                        .await
                        .map_err(DirectoryError::Storage)?;
                }
            }
            return Ok(proposal);
        }

        let mut edits = self.edits.write().await;
        let proposal = edits.get_mut(&edit_id).ok_or(DirectoryError::EditNotFound)?;

        if proposal.status != EditStatus::Pending {
            return Err(DirectoryError::AlreadyResolved);
        }

        proposal.status = decision;
        proposal.reviewed_by = Some(reviewer);
        proposal.review_note = note;
        proposal.updated_at = Utc::now();
        let resolved = proposal.clone();
        drop(edits);

        if decision == EditStatus::Approved {
            if let Some(submitter) = resolved.submitted_by {
                let mut contributors = self.contributors.write().await;
                if let Some(entry) = contributors.get_mut(&submitter) {
                    entry.stats.edits_approved += 1;
                }
            }
        }

        info!(edit_id = %edit_id, decision = decision.as_str(), "Edit proposal resolved");
        Ok(resolved)
    }

    /// Case-insensitive substring search on endpoint names with an optional
    /// transport filter. Flagged routes are excluded; results order by
    /// verification weight (verifiedVotes, then upvotes, descending).
    pub async fn search(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        transport_type: Option<TransportType>,
    ) -> Result<Vec<Route>, DirectoryError> {
        if let Some(ref db) = self.db {
            return db
                .routes()
                .search(from, to, transport_type, 50)
                .await
                .map_err(DirectoryError::Storage);
        }

        let matches_name = |place: &Place, needle: Option<&str>| match needle {
            Some(needle) => place.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        };

        let routes = self.routes.read().await;
        let mut results: Vec<Route> = routes
            .values()
            .filter(|r| r.metadata.status != RouteStatus::Flagged)
            .filter(|r| matches_name(&r.from, from) && matches_name(&r.to, to))
            .filter(|r| transport_type.is_none_or(|t| r.transport_type == t))
            .cloned()
            .collect();

        results.sort_by(|a, b| {
            (b.metadata.verified_votes, b.metadata.upvotes)
                .cmp(&(a.metadata.verified_votes, a.metadata.upvotes))
        });
        results.truncate(50);
        Ok(results)
    }

    /// Most-upvoted verified routes
    pub async fn popular(&self) -> Result<Vec<Route>, DirectoryError> {
        if let Some(ref db) = self.db {
            return db.routes().popular(10).await.map_err(DirectoryError::Storage);
        }

        let routes = self.routes.read().await;
        let mut results: Vec<Route> = routes
            .values()
            .filter(|r| r.metadata.status == RouteStatus::Verified)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.metadata.upvotes.cmp(&a.metadata.upvotes));
        results.truncate(10);
        Ok(results)
    }

    /// Routes whose origin lies within `radius_m` meters of the query
    /// point, nearest first. Pure read path.
    pub async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> Result<Vec<Route>, DirectoryError> {
        if let Some(ref db) = self.db {
            return db
                .routes()
                .nearby(lat, lng, radius_m, 20)
                .await
                .map_err(DirectoryError::Storage);
        }

        let origin = crate::model::Coordinates { lat, lng };
        let routes = self.routes.read().await;
        let mut scored: Vec<(f64, Route)> = routes
            .values()
            .filter_map(|r| {
                let coords = r.from.coords?;
                let distance = origin.distance_m(&coords);
                (distance <= radius_m).then(|| (distance, r.clone()))
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(scored.into_iter().take(20).map(|(_, r)| r).collect())
    }

    pub async fn stats(&self) -> Result<DirectoryStats, DirectoryError> {
        if let Some(ref db) = self.db {
            return db.stats().await.map_err(DirectoryError::Storage);
        }

        let routes = self.routes.read().await;
        let edits = self.edits.read().await;

        let count_status = |status: RouteStatus| {
            routes.values().filter(|r| r.metadata.status == status).count()
        };

        Ok(DirectoryStats {
            total_routes: routes.len(),
            pending: count_status(RouteStatus::Pending),
            verified: count_status(RouteStatus::Verified),
            flagged: count_status(RouteStatus::Flagged),
            total_tips: routes.values().map(|r| r.tips.len()).sum(),
            pending_edits: edits
                .values()
                .filter(|e| e.status == EditStatus::Pending)
                .count(),
        })
    }

    // Contributor paths. Token issuance lives outside this service; the
    // directory only stores digests and resolves them.

    pub async fn register_contributor(
        &self,
        contributor: Contributor,
        token_digest: Option<String>,
    ) -> Result<(), DirectoryError> {
        if let Some(ref db) = self.db {
            db.contributors()
                .insert(&contributor, token_digest.as_deref())
                .await
                .map_err(DirectoryError::Storage)?;
            return Ok(());
        }

        if let Some(digest) = token_digest {
            self.tokens.write().await.insert(digest, contributor.id);
        }
        self.contributors
            .write()
            .await
            .insert(contributor.id, contributor);
        Ok(())
    }

    pub async fn get_contributor(&self, id: Uuid) -> Result<Contributor, DirectoryError> {
        if let Some(ref db) = self.db {
            return db
                .contributors()
                .get(id)
                .await
                .map_err(DirectoryError::Storage)?
                .ok_or(DirectoryError::ContributorNotFound);
        }

        self.contributors
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::ContributorNotFound)
    }

    /// Resolve a token digest to a contributor; `None` means anonymous
    pub async fn contributor_by_token_digest(
        &self,
        digest: &str,
    ) -> Result<Option<Contributor>, DirectoryError> {
        if let Some(ref db) = self.db {
            return db
                .contributors()
                .get_by_token_digest(digest)
                .await
                .map_err(DirectoryError::Storage);
        }

        let tokens = self.tokens.read().await;
        let Some(id) = tokens.get(digest) else {
            return Ok(None);
        };
        Ok(self.contributors.read().await.get(id).cloned())
    }
}
