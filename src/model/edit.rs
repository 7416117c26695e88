//! Edit proposals: change requests against an existing route that wait
//! for moderation. Creating one never mutates the target route.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of change the proposal carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    NewRoute,
    FareUpdate,
    TimingUpdate,
    StopAdd,
    TipAdd,
}

impl EditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditType::NewRoute => "new_route",
            EditType::FareUpdate => "fare_update",
            EditType::TimingUpdate => "timing_update",
            EditType::StopAdd => "stop_add",
            EditType::TipAdd => "tip_add",
        }
    }

    pub fn parse(value: &str) -> Option<EditType> {
        match value {
            "new_route" => Some(EditType::NewRoute),
            "fare_update" => Some(EditType::FareUpdate),
            "timing_update" => Some(EditType::TimingUpdate),
            "stop_add" => Some(EditType::StopAdd),
            "tip_add" => Some(EditType::TipAdd),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStatus {
    Pending,
    Approved,
    Rejected,
}

impl EditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditStatus::Pending => "pending",
            EditStatus::Approved => "approved",
            EditStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<EditStatus> {
        match value {
            "pending" => Some(EditStatus::Pending),
            "approved" => Some(EditStatus::Approved),
            "rejected" => Some(EditStatus::Rejected),
            _ => None,
        }
    }
}

/// A pending (or resolved) change request. `changes` is an opaque payload;
/// the directory stores it verbatim and never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposal {
    pub id: Uuid,
    pub route_id: Uuid,
    pub edit_type: EditType,
    pub changes: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<Uuid>,
    pub status: EditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission payload for a new proposal
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdit {
    pub edit_type: EditType,
    pub changes: serde_json::Value,
}
