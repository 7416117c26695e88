//! Contributor repository - PostgreSQL operations using sqlx
//!
//! Stat counters are incremented with single UPDATE statements so
//! concurrent contributions never drop a count.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::model::{Contributor, ContributorRole, ContributorStats};

const CONTRIBUTOR_COLUMNS: &str =
    "id, name, role, city, routes_added, edits_approved, helpful_votes, created_at";

pub struct ContributorRepository {
    pool: PgPool,
}

impl ContributorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transit.contributors (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                role VARCHAR(15) NOT NULL DEFAULT 'contributor',
                city TEXT,
                routes_added BIGINT NOT NULL DEFAULT 0,
                edits_approved BIGINT NOT NULL DEFAULT 0,
                helpful_votes BIGINT NOT NULL DEFAULT 0,
                token_digest VARCHAR(64) UNIQUE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create contributors table: {}", e))?;

        Ok(())
    }

    pub async fn insert(
        &self,
        contributor: &Contributor,
        token_digest: Option<&str>,
    ) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO transit.contributors
            (id, name, role, city, routes_added, edits_approved, helpful_votes,
             token_digest, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(contributor.id)
        .bind(&contributor.name)
        .bind(contributor.role.as_str())
        .bind(&contributor.city)
        .bind(contributor.stats.routes_added as i64)
        .bind(contributor.stats.edits_approved as i64)
        .bind(contributor.stats.helpful_votes as i64)
        .bind(token_digest)
        .bind(contributor.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert contributor: {}", e))?;

        debug!(contributor_id = %contributor.id, "Contributor inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Contributor>, String> {
        let row = sqlx::query(&format!(
            "SELECT {CONTRIBUTOR_COLUMNS} FROM transit.contributors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to get contributor: {}", e))?;

        row.map(|r| row_to_contributor(&r)).transpose()
    }

    pub async fn get_by_token_digest(
        &self,
        digest: &str,
    ) -> Result<Option<Contributor>, String> {
        let row = sqlx::query(&format!(
            "SELECT {CONTRIBUTOR_COLUMNS} FROM transit.contributors WHERE token_digest = $1"
        ))
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to look up contributor token: {}", e))?;

        row.map(|r| row_to_contributor(&r)).transpose()
    }

    pub async fn increment_routes_added(&self, id: Uuid) -> Result<(), String> {
        sqlx::query(
            "UPDATE transit.contributors SET routes_added = routes_added + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update contributor stats: {}", e))?;
        Ok(())
    }

    pub async fn increment_edits_approved(&self, id: Uuid) -> Result<(), String> {
        sqlx::query(
            "UPDATE transit.contributors SET edits_approved = edits_approved + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update contributor stats: {}", e))?;
        Ok(())
    }
}

fn row_to_contributor(row: &PgRow) -> Result<Contributor, String> {
    let role: String = row.get("role");
    let role = ContributorRole::parse(&role)
        .ok_or_else(|| format!("Unknown contributor role: {}", role))?;

    Ok(Contributor {
        id: row.get("id"),
        name: row.get("name"),
        role,
        city: row.get("city"),
        stats: ContributorStats {
            routes_added: row.get::<i64, _>("routes_added") as u64,
            edits_approved: row.get::<i64, _>("edits_approved") as u64,
            helpful_votes: row.get::<i64, _>("helpful_votes") as u64,
        },
        created_at: row.get("created_at"),
    })
}
