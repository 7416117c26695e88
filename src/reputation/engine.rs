//! Pure vote-transition logic
//!
//! One function, [`cast_vote`], applied to a route's metadata. The caller
//! owns durability: the mutated metadata is only a proposed next state until
//! the store commits it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{RouteMetadata, RouteStatus};
use crate::reputation::VerificationPolicy;

/// Recognized vote types. Anything else arriving over the wire is treated
/// as a no-op by the caller, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    /// Parse the wire value; unrecognized strings yield `None` (no-op vote)
    pub fn parse(value: &str) -> Option<VoteType> {
        match value {
            "up" => Some(VoteType::Up),
            "down" => Some(VoteType::Down),
            _ => None,
        }
    }
}

/// What a single vote did to the route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteEffect {
    /// True exactly when this vote caused the pending → verified transition
    pub newly_verified: bool,
}

/// Fresh reputation state for a newly created route
pub fn new_metadata() -> RouteMetadata {
    RouteMetadata {
        upvotes: 0,
        downvotes: 0,
        verified_votes: 0,
        status: RouteStatus::Pending,
        last_verified: None,
    }
}

/// Apply one vote to a route's reputation state.
///
/// Up votes increment `upvotes` and `verified_votes` together, then run the
/// threshold check: a pending route with `upvotes >= threshold` becomes
/// verified and records `last_verified = now`. The check only ever moves a
/// route out of pending, so repeated qualifying votes leave `status` and
/// `last_verified` untouched. Down votes increment `downvotes` and nothing
/// else.
pub fn cast_vote(
    metadata: &mut RouteMetadata,
    vote: VoteType,
    policy: &VerificationPolicy,
    now: DateTime<Utc>,
) -> VoteEffect {
    match vote {
        VoteType::Up => {
            metadata.upvotes += 1;
            metadata.verified_votes += 1;

            if metadata.upvotes >= policy.verify_threshold
                && metadata.status == RouteStatus::Pending
            {
                metadata.status = RouteStatus::Verified;
                metadata.last_verified = Some(now);
                return VoteEffect { newly_verified: true };
            }
        }
        VoteType::Down => {
            metadata.downvotes += 1;
        }
    }

    VoteEffect { newly_verified: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> VerificationPolicy {
        VerificationPolicy::default()
    }

    #[test]
    fn ten_up_votes_verify_a_pending_route() {
        let mut metadata = new_metadata();
        let now = Utc::now();

        let mut verified_on = None;
        for n in 1..=10u64 {
            let effect = cast_vote(&mut metadata, VoteType::Up, &policy(), now);
            if effect.newly_verified {
                verified_on = Some(n);
            }
        }

        assert_eq!(verified_on, Some(10));
        assert_eq!(metadata.upvotes, 10);
        assert_eq!(metadata.verified_votes, 10);
        assert_eq!(metadata.downvotes, 0);
        assert_eq!(metadata.status, RouteStatus::Verified);
        assert_eq!(metadata.last_verified, Some(now));
    }

    #[test]
    fn nine_up_votes_stay_pending() {
        let mut metadata = new_metadata();
        for _ in 0..9 {
            cast_vote(&mut metadata, VoteType::Up, &policy(), Utc::now());
        }

        assert_eq!(metadata.upvotes, 9);
        assert_eq!(metadata.status, RouteStatus::Pending);
        assert!(metadata.last_verified.is_none());
    }

    #[test]
    fn votes_on_a_verified_route_count_but_do_not_re_verify() {
        let mut metadata = new_metadata();
        let first = Utc::now();
        for _ in 0..10 {
            cast_vote(&mut metadata, VoteType::Up, &policy(), first);
        }
        assert_eq!(metadata.status, RouteStatus::Verified);

        let later = first + chrono::Duration::hours(1);
        let effect = cast_vote(&mut metadata, VoteType::Up, &policy(), later);

        assert!(!effect.newly_verified);
        assert_eq!(metadata.upvotes, 11);
        assert_eq!(metadata.verified_votes, 11);
        assert_eq!(metadata.status, RouteStatus::Verified);
        // lastVerified keeps the original transition time
        assert_eq!(metadata.last_verified, Some(first));
    }

    #[test]
    fn down_votes_alone_never_change_status() {
        let mut metadata = new_metadata();
        for _ in 0..50 {
            cast_vote(&mut metadata, VoteType::Down, &policy(), Utc::now());
        }

        assert_eq!(metadata.downvotes, 50);
        assert_eq!(metadata.upvotes, 0);
        assert_eq!(metadata.verified_votes, 0);
        assert_eq!(metadata.status, RouteStatus::Pending);
    }

    #[test]
    fn down_votes_do_not_delay_verification() {
        // Deliberate product behavior: downvotes never gate the transition
        let mut metadata = new_metadata();
        for _ in 0..9 {
            cast_vote(&mut metadata, VoteType::Up, &policy(), Utc::now());
        }
        for _ in 0..100 {
            cast_vote(&mut metadata, VoteType::Down, &policy(), Utc::now());
        }
        assert_eq!(metadata.status, RouteStatus::Pending);

        cast_vote(&mut metadata, VoteType::Up, &policy(), Utc::now());
        assert_eq!(metadata.status, RouteStatus::Verified);
    }

    #[test]
    fn verified_votes_never_exceed_upvotes() {
        let mut metadata = new_metadata();
        let votes = [
            VoteType::Up,
            VoteType::Down,
            VoteType::Up,
            VoteType::Up,
            VoteType::Down,
            VoteType::Up,
        ];
        for vote in votes {
            cast_vote(&mut metadata, vote, &policy(), Utc::now());
            assert!(metadata.verified_votes <= metadata.upvotes);
        }
    }

    #[test]
    fn mixed_sequence_matches_expected_tallies() {
        let mut metadata = new_metadata();
        for _ in 0..5 {
            cast_vote(&mut metadata, VoteType::Up, &policy(), Utc::now());
        }
        for _ in 0..3 {
            cast_vote(&mut metadata, VoteType::Down, &policy(), Utc::now());
        }

        assert_eq!(metadata.upvotes, 5);
        assert_eq!(metadata.downvotes, 3);
        assert_eq!(metadata.verified_votes, 5);
        assert_eq!(metadata.status, RouteStatus::Pending);
    }

    #[test]
    fn custom_threshold_is_honored() {
        let policy = VerificationPolicy { verify_threshold: 3 };
        let mut metadata = new_metadata();

        cast_vote(&mut metadata, VoteType::Up, &policy, Utc::now());
        cast_vote(&mut metadata, VoteType::Up, &policy, Utc::now());
        assert_eq!(metadata.status, RouteStatus::Pending);

        let effect = cast_vote(&mut metadata, VoteType::Up, &policy, Utc::now());
        assert!(effect.newly_verified);
        assert_eq!(metadata.status, RouteStatus::Verified);
    }

    #[test]
    fn unrecognized_wire_values_do_not_parse() {
        assert_eq!(VoteType::parse("up"), Some(VoteType::Up));
        assert_eq!(VoteType::parse("down"), Some(VoteType::Down));
        assert_eq!(VoteType::parse("sideways"), None);
        assert_eq!(VoteType::parse("UP"), None);
        assert_eq!(VoteType::parse(""), None);
    }
}
