//! Contributor accounts and their aggregate stats
//!
//! Account creation and token issuance happen outside this service; the
//! directory only resolves tokens to contributors and maintains the stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Contributor,
    Moderator,
    Admin,
}

impl ContributorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::Contributor => "contributor",
            ContributorRole::Moderator => "moderator",
            ContributorRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<ContributorRole> {
        match value {
            "contributor" => Some(ContributorRole::Contributor),
            "moderator" => Some(ContributorRole::Moderator),
            "admin" => Some(ContributorRole::Admin),
            _ => None,
        }
    }

    /// Moderators and admins may resolve edit proposals
    pub fn can_moderate(&self) -> bool {
        matches!(self, ContributorRole::Moderator | ContributorRole::Admin)
    }
}

/// Lifetime aggregate counters. `routes_added` always equals the number of
/// routes the contributor has created; it never decreases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorStats {
    pub routes_added: u64,
    pub edits_approved: u64,
    pub helpful_votes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub id: Uuid,
    pub name: String,
    pub role: ContributorRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub stats: ContributorStats,
    pub created_at: DateTime<Utc>,
}

impl Contributor {
    pub fn new(name: String, role: ContributorRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            role,
            city: None,
            stats: ContributorStats::default(),
            created_at: Utc::now(),
        }
    }
}
