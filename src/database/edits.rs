//! Edit-proposal repository - PostgreSQL operations using sqlx

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::model::{EditProposal, EditStatus, EditType};

const EDIT_COLUMNS: &str = "id, route_id, edit_type, changes, submitted_by, status, \
     reviewed_by, review_note, created_at, updated_at";

pub struct EditRepository {
    pool: PgPool,
}

impl EditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transit.edits (
                id UUID PRIMARY KEY,
                route_id UUID NOT NULL REFERENCES transit.routes(id),
                edit_type VARCHAR(20) NOT NULL,
                changes JSONB NOT NULL,
                submitted_by UUID REFERENCES transit.contributors(id),
                status VARCHAR(10) NOT NULL DEFAULT 'pending',
                reviewed_by UUID REFERENCES transit.contributors(id),
                review_note TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create edits table: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_edits_status ON transit.edits(status)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create edits status index: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_edits_route ON transit.edits(route_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create edits route index: {}", e))?;

        Ok(())
    }

    pub async fn insert(&self, proposal: &EditProposal) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO transit.edits
            (id, route_id, edit_type, changes, submitted_by, status,
             reviewed_by, review_note, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(proposal.id)
        .bind(proposal.route_id)
        .bind(proposal.edit_type.as_str())
        .bind(&proposal.changes)
        .bind(proposal.submitted_by)
        .bind(proposal.status.as_str())
        .bind(proposal.reviewed_by)
        .bind(&proposal.review_note)
        .bind(proposal.created_at)
        .bind(proposal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert edit proposal: {}", e))?;

        debug!(edit_id = %proposal.id, route_id = %proposal.route_id, "Edit proposal inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<EditProposal>, String> {
        let row = sqlx::query(&format!(
            "SELECT {EDIT_COLUMNS} FROM transit.edits WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to get edit proposal: {}", e))?;

        row.map(|r| row_to_edit(&r)).transpose()
    }

    pub async fn list_pending(&self) -> Result<Vec<EditProposal>, String> {
        let rows = sqlx::query(&format!(
            "SELECT {EDIT_COLUMNS} FROM transit.edits WHERE status = 'pending' ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list pending edits: {}", e))?;

        rows.iter().map(row_to_edit).collect()
    }

    pub async fn count_pending(&self) -> Result<usize, String> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transit.edits WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| format!("Failed to count pending edits: {}", e))?;
        Ok(row.get::<i64, _>("n") as usize)
    }

    /// Resolve a pending proposal, exactly once. The `status = 'pending'`
    /// guard makes the transition atomic; `None` means there was no pending
    /// row (missing or already resolved - the caller disambiguates).
    pub async fn resolve(
        &self,
        id: Uuid,
        decision: EditStatus,
        reviewer: Uuid,
        note: Option<&str>,
    ) -> Result<Option<EditProposal>, String> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE transit.edits SET
                status = $2,
                reviewed_by = $3,
                review_note = $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {EDIT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.as_str())
        .bind(reviewer)
        .bind(note)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to resolve edit proposal: {}", e))?;

        row.map(|r| row_to_edit(&r)).transpose()
    }
}

fn row_to_edit(row: &PgRow) -> Result<EditProposal, String> {
    let edit_type: String = row.get("edit_type");
    let edit_type =
        EditType::parse(&edit_type).ok_or_else(|| format!("Unknown edit type: {}", edit_type))?;

    let status: String = row.get("status");
    let status =
        EditStatus::parse(&status).ok_or_else(|| format!("Unknown edit status: {}", status))?;

    Ok(EditProposal {
        id: row.get("id"),
        route_id: row.get("route_id"),
        edit_type,
        changes: row.get("changes"),
        submitted_by: row.get("submitted_by"),
        status,
        reviewed_by: row.get("reviewed_by"),
        review_note: row.get("review_note"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
