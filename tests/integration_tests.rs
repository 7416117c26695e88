//! Integration tests for the route directory
//!
//! These tests verify end-to-end behavior of the directory against the
//! in-memory store: route creation and validation, the vote-driven
//! verification state machine, tips, contributor stats, the moderation
//! queue, and the read paths (search, popular, nearby).

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use sawaari::model::{
    Contributor, ContributorRole, Coordinates, Fare, Identifier, NewRoute, Place, Timings,
    VehicleColor,
};
use sawaari::{
    DirectoryError, EditStatus, EditType, NewEdit, RouteDirectory, RouteStatus, TransportType,
    VerificationPolicy, VoteType,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn place(name: &str) -> Place {
    Place {
        name: name.to_string(),
        coords: None,
    }
}

fn located(name: &str, lat: f64, lng: f64) -> Place {
    Place {
        name: name.to_string(),
        coords: Some(Coordinates { lat, lng }),
    }
}

/// A valid route payload with configurable endpoints and transport
fn payload(from: Place, to: Place, transport: TransportType) -> NewRoute {
    NewRoute {
        from,
        to,
        transport_type: transport,
        identifier: Identifier {
            color: VehicleColor::Green,
            local_name: "Test Wala".to_string(),
            route_number: None,
        },
        stops: vec![place("Midway Market")],
        fare: Fare {
            min: 10.0,
            max: 20.0,
            peak_hour_surcharge: 0.0,
            student_discount: false,
        },
        timings: Timings {
            first_service: "06:00".to_string(),
            last_service: "21:00".to_string(),
            frequency: None,
        },
    }
}

fn simple_payload() -> NewRoute {
    payload(
        place("Railway Station"),
        place("Medical College"),
        TransportType::SharedAuto,
    )
}

fn directory() -> RouteDirectory {
    RouteDirectory::new(VerificationPolicy::default())
}

async fn vote_n(directory: &RouteDirectory, id: Uuid, vote: VoteType, n: usize) {
    for _ in 0..n {
        directory.cast_vote(id, Some(vote)).await.unwrap();
    }
}

// ============================================================================
// Verification State Machine
// ============================================================================

mod verification {
    use super::*;

    #[tokio::test]
    async fn new_route_starts_pending_and_zeroed() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        assert_eq!(route.metadata.upvotes, 0);
        assert_eq!(route.metadata.downvotes, 0);
        assert_eq!(route.metadata.verified_votes, 0);
        assert_eq!(route.metadata.status, RouteStatus::Pending);
        assert!(route.metadata.last_verified.is_none());
    }

    #[tokio::test]
    async fn ten_up_votes_auto_verify() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        vote_n(&dir, route.id, VoteType::Up, 10).await;

        let route = dir.get_route(route.id).await.unwrap();
        assert_eq!(route.metadata.upvotes, 10);
        assert_eq!(route.metadata.verified_votes, 10);
        assert_eq!(route.metadata.downvotes, 0);
        assert_eq!(route.metadata.status, RouteStatus::Verified);
        assert!(route.metadata.last_verified.is_some());
    }

    #[tokio::test]
    async fn nine_up_votes_stay_pending() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        vote_n(&dir, route.id, VoteType::Up, 9).await;

        let route = dir.get_route(route.id).await.unwrap();
        assert_eq!(route.metadata.status, RouteStatus::Pending);
        assert!(route.metadata.last_verified.is_none());
    }

    #[tokio::test]
    async fn votes_after_verification_keep_counting() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();
        vote_n(&dir, route.id, VoteType::Up, 10).await;

        let verified_at = dir
            .get_route(route.id)
            .await
            .unwrap()
            .metadata
            .last_verified;

        let updated = dir.cast_vote(route.id, Some(VoteType::Up)).await.unwrap();
        assert_eq!(updated.metadata.upvotes, 11);
        assert_eq!(updated.metadata.verified_votes, 11);
        assert_eq!(updated.metadata.status, RouteStatus::Verified);
        assert_eq!(updated.metadata.last_verified, verified_at);
    }

    #[tokio::test]
    async fn down_votes_never_change_status() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        vote_n(&dir, route.id, VoteType::Down, 25).await;

        let route = dir.get_route(route.id).await.unwrap();
        assert_eq!(route.metadata.downvotes, 25);
        assert_eq!(route.metadata.status, RouteStatus::Pending);
    }

    #[tokio::test]
    async fn mixed_votes_tally_independently() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        vote_n(&dir, route.id, VoteType::Up, 5).await;
        vote_n(&dir, route.id, VoteType::Down, 3).await;

        let route = dir.get_route(route.id).await.unwrap();
        assert_eq!(route.metadata.upvotes, 5);
        assert_eq!(route.metadata.downvotes, 3);
        assert_eq!(route.metadata.verified_votes, 5);
        assert_eq!(route.metadata.status, RouteStatus::Pending);
        assert!(route.metadata.verified_votes <= route.metadata.upvotes);
    }

    #[tokio::test]
    async fn unrecognized_vote_type_is_a_no_op() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();
        vote_n(&dir, route.id, VoteType::Up, 2).await;

        // None models a wire value outside {up, down}
        let unchanged = dir.cast_vote(route.id, None).await.unwrap();
        assert_eq!(unchanged.metadata.upvotes, 2);
        assert_eq!(unchanged.metadata.downvotes, 0);
        assert_eq!(unchanged.metadata.verified_votes, 2);
        assert_eq!(unchanged.metadata.status, RouteStatus::Pending);
    }

    #[tokio::test]
    async fn vote_on_missing_route_is_not_found() {
        let dir = directory();
        let result = dir.cast_vote(Uuid::new_v4(), Some(VoteType::Up)).await;
        assert!(matches!(result, Err(DirectoryError::RouteNotFound)));
    }

    #[tokio::test]
    async fn concurrent_votes_are_not_lost() {
        let dir = Arc::new(directory());
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let dir = dir.clone();
            let id = route.id;
            handles.push(tokio::spawn(async move {
                dir.cast_vote(id, Some(VoteType::Up)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let route = dir.get_route(route.id).await.unwrap();
        assert_eq!(route.metadata.upvotes, 20);
        assert_eq!(route.metadata.verified_votes, 20);
        assert_eq!(route.metadata.status, RouteStatus::Verified);
    }
}

// ============================================================================
// Route Creation & Validation
// ============================================================================

mod creation {
    use super::*;

    #[tokio::test]
    async fn invalid_payload_writes_nothing() {
        let dir = directory();
        let mut bad = simple_payload();
        bad.fare.min = 50.0; // exceeds max

        let result = dir.create_route(bad, None).await;
        assert!(matches!(result, Err(DirectoryError::Validation(_))));

        let stats = dir.stats().await.unwrap();
        assert_eq!(stats.total_routes, 0);
    }

    #[tokio::test]
    async fn contributor_stat_increments_per_created_route() {
        let dir = directory();
        let contributor = Contributor::new("Asha".to_string(), ContributorRole::Contributor);
        let id = contributor.id;
        dir.register_contributor(contributor, None).await.unwrap();

        dir.create_route(simple_payload(), Some(id)).await.unwrap();
        dir.create_route(simple_payload(), Some(id)).await.unwrap();

        let contributor = dir.get_contributor(id).await.unwrap();
        assert_eq!(contributor.stats.routes_added, 2);
    }

    #[tokio::test]
    async fn anonymous_creation_touches_no_contributor() {
        let dir = directory();
        let contributor = Contributor::new("Asha".to_string(), ContributorRole::Contributor);
        let id = contributor.id;
        dir.register_contributor(contributor, None).await.unwrap();

        let route = dir.create_route(simple_payload(), None).await.unwrap();
        assert!(route.created_by.is_none());

        let contributor = dir.get_contributor(id).await.unwrap();
        assert_eq!(contributor.stats.routes_added, 0);
    }
}

// ============================================================================
// Tips
// ============================================================================

mod tips {
    use super::*;

    #[tokio::test]
    async fn tips_append_in_order_and_leave_reputation_alone() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();
        vote_n(&dir, route.id, VoteType::Up, 3).await;

        dir.add_tip(route.id, "Ask for the college gate".to_string(), None)
            .await
            .unwrap();
        let route = dir
            .add_tip(route.id, "Crowded after 5pm".to_string(), None)
            .await
            .unwrap();

        assert_eq!(route.tips.len(), 2);
        assert_eq!(route.tips[0].text, "Ask for the college gate");
        assert_eq!(route.tips[1].text, "Crowded after 5pm");
        assert!(route.tips[0].created_at <= route.tips[1].created_at);
        assert!(route.tips.iter().all(|t| t.votes == 0));

        // Reputation untouched
        assert_eq!(route.metadata.upvotes, 3);
        assert_eq!(route.metadata.status, RouteStatus::Pending);
    }

    #[tokio::test]
    async fn empty_tip_rejected() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        let result = dir.add_tip(route.id, "   ".to_string(), None).await;
        assert!(matches!(result, Err(DirectoryError::Validation(_))));
    }

    #[tokio::test]
    async fn tip_on_missing_route_is_not_found() {
        let dir = directory();
        let result = dir
            .add_tip(Uuid::new_v4(), "ghost route".to_string(), None)
            .await;
        assert!(matches!(result, Err(DirectoryError::RouteNotFound)));
    }
}

// ============================================================================
// Edit Proposals & Moderation
// ============================================================================

mod moderation {
    use super::*;

    fn fare_update() -> NewEdit {
        NewEdit {
            edit_type: EditType::FareUpdate,
            changes: json!({ "fare": { "min": 25, "max": 35 } }),
        }
    }

    #[tokio::test]
    async fn submitting_an_edit_does_not_mutate_the_route() {
        let dir = directory();
        let route = dir.create_route(simple_payload(), None).await.unwrap();

        let proposal = dir.submit_edit(route.id, fare_update(), None).await.unwrap();
        assert_eq!(proposal.status, EditStatus::Pending);
        assert_eq!(proposal.route_id, route.id);

        let unchanged = dir.get_route(route.id).await.unwrap();
        assert_eq!(unchanged.fare.min, 10.0);
        assert_eq!(unchanged.fare.max, 20.0);
    }

    #[tokio::test]
    async fn edit_against_missing_route_is_not_found() {
        let dir = directory();
        let result = dir.submit_edit(Uuid::new_v4(), fare_update(), None).await;
        assert!(matches!(result, Err(DirectoryError::RouteNotFound)));
    }

    #[tokio::test]
    async fn resolution_happens_exactly_once() {
        let dir = directory();
        let moderator = Contributor::new("Mod".to_string(), ContributorRole::Moderator);
        let reviewer = moderator.id;
        dir.register_contributor(moderator, None).await.unwrap();

        let route = dir.create_route(simple_payload(), None).await.unwrap();
        let proposal = dir.submit_edit(route.id, fare_update(), None).await.unwrap();

        let resolved = dir
            .resolve_edit(
                proposal.id,
                EditStatus::Rejected,
                reviewer,
                Some("fares unchanged as of this week".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, EditStatus::Rejected);
        assert_eq!(resolved.reviewed_by, Some(reviewer));

        let again = dir
            .resolve_edit(proposal.id, EditStatus::Approved, reviewer, None)
            .await;
        assert!(matches!(again, Err(DirectoryError::AlreadyResolved)));
    }

    #[tokio::test]
    async fn approval_records_decision_without_touching_the_route() {
        let dir = directory();
        let moderator = Contributor::new("Mod".to_string(), ContributorRole::Moderator);
        let submitter = Contributor::new("Sub".to_string(), ContributorRole::Contributor);
        let (reviewer, submitter_id) = (moderator.id, submitter.id);
        dir.register_contributor(moderator, None).await.unwrap();
        dir.register_contributor(submitter, None).await.unwrap();

        let route = dir.create_route(simple_payload(), None).await.unwrap();
        let proposal = dir
            .submit_edit(route.id, fare_update(), Some(submitter_id))
            .await
            .unwrap();

        let resolved = dir
            .resolve_edit(proposal.id, EditStatus::Approved, reviewer, None)
            .await
            .unwrap();
        assert_eq!(resolved.status, EditStatus::Approved);

        // The approved changes are recorded, not applied
        let unchanged = dir.get_route(route.id).await.unwrap();
        assert_eq!(unchanged.fare.min, 10.0);

        let submitter = dir.get_contributor(submitter_id).await.unwrap();
        assert_eq!(submitter.stats.edits_approved, 1);
    }

    #[tokio::test]
    async fn pending_list_shrinks_as_proposals_resolve() {
        let dir = directory();
        let moderator = Contributor::new("Mod".to_string(), ContributorRole::Moderator);
        let reviewer = moderator.id;
        dir.register_contributor(moderator, None).await.unwrap();

        let route = dir.create_route(simple_payload(), None).await.unwrap();
        let first = dir.submit_edit(route.id, fare_update(), None).await.unwrap();
        dir.submit_edit(route.id, fare_update(), None).await.unwrap();

        assert_eq!(dir.pending_edits().await.unwrap().len(), 2);

        dir.resolve_edit(first.id, EditStatus::Approved, reviewer, None)
            .await
            .unwrap();
        assert_eq!(dir.pending_edits().await.unwrap().len(), 1);
    }
}

// ============================================================================
// Read Paths: Search, Popular, Nearby
// ============================================================================

mod reads {
    use super::*;

    async fn seeded_directory() -> RouteDirectory {
        let dir = directory();

        dir.create_route(
            payload(
                place("Railway Station"),
                place("Medical College"),
                TransportType::SharedAuto,
            ),
            None,
        )
        .await
        .unwrap();

        let bus = dir
            .create_route(
                payload(
                    place("Bus Stand"),
                    place("Engineering College"),
                    TransportType::CityBus,
                ),
                None,
            )
            .await
            .unwrap();
        vote_n(&dir, bus.id, VoteType::Up, 12).await;

        dir
    }

    #[tokio::test]
    async fn search_matches_substrings_case_insensitively() {
        let dir = seeded_directory().await;

        let results = dir.search(Some("railway"), None, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].from.name, "Railway Station");

        let results = dir.search(None, Some("college"), None).await.unwrap();
        assert_eq!(results.len(), 2);

        let none = dir.search(Some("airport"), None, None).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn search_orders_by_verification_weight() {
        let dir = seeded_directory().await;

        let results = dir.search(None, Some("college"), None).await.unwrap();
        // The verified bus route has 12 verified votes, the auto has 0
        assert_eq!(results[0].transport_type, TransportType::CityBus);
        assert_eq!(results[1].transport_type, TransportType::SharedAuto);
    }

    #[tokio::test]
    async fn search_filters_by_transport_type() {
        let dir = seeded_directory().await;

        let results = dir
            .search(None, None, Some(TransportType::SharedAuto))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transport_type, TransportType::SharedAuto);
    }

    #[tokio::test]
    async fn popular_returns_only_verified_routes() {
        let dir = seeded_directory().await;

        let popular = dir.popular().await.unwrap();
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].metadata.status, RouteStatus::Verified);
        assert_eq!(popular[0].transport_type, TransportType::CityBus);
    }

    #[tokio::test]
    async fn nearby_orders_by_distance_and_honors_radius() {
        let dir = directory();

        // Two routes near Asansol station, one far away in another city
        dir.create_route(
            payload(
                located("Station Gate", 23.6831, 86.9826),
                place("Market"),
                TransportType::SharedAuto,
            ),
            None,
        )
        .await
        .unwrap();
        dir.create_route(
            payload(
                located("Court More", 23.6840, 86.9600),
                place("Market"),
                TransportType::ERickshaw,
            ),
            None,
        )
        .await
        .unwrap();
        dir.create_route(
            payload(
                located("Howrah", 22.5958, 88.2636),
                place("Esplanade"),
                TransportType::CityBus,
            ),
            None,
        )
        .await
        .unwrap();

        let results = dir.nearby(23.6831, 86.9826, 5000.0).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].from.name, "Station Gate");
        assert_eq!(results[1].from.name, "Court More");
    }

    #[tokio::test]
    async fn routes_without_coordinates_are_skipped_by_nearby() {
        let dir = seeded_directory().await;
        let results = dir.nearby(23.6831, 86.9826, 5000.0).await.unwrap();
        assert!(results.is_empty());
    }
}

// ============================================================================
// Stats & Seeding
// ============================================================================

mod stats {
    use super::*;
    use sawaari::database::seed::seed_sample_routes;

    #[tokio::test]
    async fn stats_count_by_status() {
        let dir = directory();
        let pending = dir.create_route(simple_payload(), None).await.unwrap();
        let verified = dir.create_route(simple_payload(), None).await.unwrap();
        vote_n(&dir, verified.id, VoteType::Up, 10).await;
        dir.add_tip(pending.id, "tip".to_string(), None).await.unwrap();

        let stats = dir.stats().await.unwrap();
        assert_eq!(stats.total_routes, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.flagged, 0);
        assert_eq!(stats.total_tips, 1);
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let dir = directory();

        let created = seed_sample_routes(&dir).await.unwrap();
        assert!(created > 0);

        let again = seed_sample_routes(&dir).await.unwrap();
        assert_eq!(again, 0);

        let stats = dir.stats().await.unwrap();
        assert_eq!(stats.total_routes, created);
    }
}

// ============================================================================
// Token Resolution
// ============================================================================

mod auth {
    use super::*;
    use sawaari::api::token_digest;

    #[tokio::test]
    async fn token_digest_resolves_registered_contributor() {
        let dir = directory();
        let contributor = Contributor::new("Asha".to_string(), ContributorRole::Contributor);
        let id = contributor.id;
        dir.register_contributor(contributor, Some(token_digest("asha-token")))
            .await
            .unwrap();

        let found = dir
            .contributor_by_token_digest(&token_digest("asha-token"))
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(id));

        let missing = dir
            .contributor_by_token_digest(&token_digest("wrong-token"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
