//! Route repository - PostgreSQL operations for routes using sqlx
//!
//! Reputation counters and the fields the search paths filter on are scalar
//! columns; the rest of the route document (endpoints, identifier, stops,
//! fare, timings) is one JSONB value, tips another. The vote path is a
//! single conditional UPDATE so concurrent votes on one route serialize at
//! the database and no increment is ever lost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::directory::DirectoryStats;
use crate::model::{
    Fare, Identifier, Place, Route, RouteMetadata, RouteStatus, Timings, Tip, TransportType,
};
use crate::reputation::{VerificationPolicy, VoteType};

/// JSONB column payload: the document-shaped part of a route
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteDocument {
    from: Place,
    to: Place,
    identifier: Identifier,
    stops: Vec<Place>,
    fare: Fare,
    timings: Timings,
}

const ROUTE_COLUMNS: &str = "id, transport_type, status, upvotes, downvotes, verified_votes, \
     last_verified, document, tips, created_by, created_at, updated_at";

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transit.routes (
                id UUID PRIMARY KEY,
                transport_type VARCHAR(20) NOT NULL,
                status VARCHAR(10) NOT NULL DEFAULT 'pending',
                upvotes BIGINT NOT NULL DEFAULT 0,
                downvotes BIGINT NOT NULL DEFAULT 0,
                verified_votes BIGINT NOT NULL DEFAULT 0,
                last_verified TIMESTAMP WITH TIME ZONE,
                from_name TEXT NOT NULL,
                to_name TEXT NOT NULL,
                from_lat DOUBLE PRECISION,
                from_lng DOUBLE PRECISION,
                document JSONB NOT NULL,
                tips JSONB NOT NULL DEFAULT '[]',
                created_by UUID REFERENCES transit.contributors(id),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create routes table: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_routes_status ON transit.routes(status)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create routes status index: {}", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_routes_transport ON transit.routes(transport_type)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create routes transport index: {}", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_routes_names ON transit.routes(from_name, to_name)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create routes names index: {}", e))?;

        Ok(())
    }

    pub async fn insert(&self, route: &Route) -> Result<(), String> {
        let document = serde_json::to_value(RouteDocument {
            from: route.from.clone(),
            to: route.to.clone(),
            identifier: route.identifier.clone(),
            stops: route.stops.clone(),
            fare: route.fare.clone(),
            timings: route.timings.clone(),
        })
        .map_err(|e| format!("Failed to serialize route document: {}", e))?;

        let tips = serde_json::to_value(&route.tips)
            .map_err(|e| format!("Failed to serialize tips: {}", e))?;

        sqlx::query(
            r#"
            INSERT INTO transit.routes
            (id, transport_type, status, upvotes, downvotes, verified_votes,
             last_verified, from_name, to_name, from_lat, from_lng,
             document, tips, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(route.id)
        .bind(route.transport_type.as_str())
        .bind(route.metadata.status.as_str())
        .bind(route.metadata.upvotes as i64)
        .bind(route.metadata.downvotes as i64)
        .bind(route.metadata.verified_votes as i64)
        .bind(route.metadata.last_verified)
        .bind(&route.from.name)
        .bind(&route.to.name)
        .bind(route.from.coords.map(|c| c.lat))
        .bind(route.from.coords.map(|c| c.lng))
        .bind(document)
        .bind(tips)
        .bind(route.created_by)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert route: {}", e))?;

        debug!(route_id = %route.id, "Route inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Route>, String> {
        let row = sqlx::query(&format!(
            "SELECT {ROUTE_COLUMNS} FROM transit.routes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to get route: {}", e))?;

        row.map(|r| row_to_route(&r)).transpose()
    }

    /// Apply one vote as a single conditional UPDATE. Column expressions all
    /// read the pre-update row, so the threshold check sees the same
    /// incremented count the counter columns store.
    pub async fn cast_vote(
        &self,
        id: Uuid,
        vote: VoteType,
        policy: &VerificationPolicy,
    ) -> Result<Option<Route>, String> {
        let row = match vote {
            VoteType::Up => {
                sqlx::query(&format!(
                    r#"
                    UPDATE transit.routes SET
                        upvotes = upvotes + 1,
                        verified_votes = verified_votes + 1,
                        last_verified = CASE
                            WHEN upvotes + 1 >= $2 AND status = 'pending' THEN NOW()
                            ELSE last_verified END,
                        status = CASE
                            WHEN upvotes + 1 >= $2 AND status = 'pending' THEN 'verified'
                            ELSE status END,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {ROUTE_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(policy.verify_threshold as i64)
                .fetch_optional(&self.pool)
                .await
            }
            VoteType::Down => {
                sqlx::query(&format!(
                    r#"
                    UPDATE transit.routes SET
                        downvotes = downvotes + 1,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {ROUTE_COLUMNS}
                    "#
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| format!("Failed to record vote: {}", e))?;

        row.map(|r| row_to_route(&r)).transpose()
    }

    /// Append one tip to the JSONB array in place
    pub async fn append_tip(&self, id: Uuid, tip: &Tip) -> Result<Option<Route>, String> {
        let tip_value =
            serde_json::to_value(tip).map_err(|e| format!("Failed to serialize tip: {}", e))?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE transit.routes SET
                tips = tips || jsonb_build_array($2::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ROUTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tip_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to append tip: {}", e))?;

        row.map(|r| row_to_route(&r)).transpose()
    }

    pub async fn search(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        transport_type: Option<TransportType>,
        limit: i64,
    ) -> Result<Vec<Route>, String> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ROUTE_COLUMNS} FROM transit.routes
            WHERE status IN ('pending', 'verified')
              AND ($1::text IS NULL OR from_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR to_name ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR transport_type = $3)
            ORDER BY verified_votes DESC, upvotes DESC
            LIMIT $4
            "#
        ))
        .bind(from)
        .bind(to)
        .bind(transport_type.map(|t| t.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to search routes: {}", e))?;

        rows.iter().map(row_to_route).collect()
    }

    pub async fn popular(&self, limit: i64) -> Result<Vec<Route>, String> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ROUTE_COLUMNS} FROM transit.routes
            WHERE status = 'verified'
            ORDER BY upvotes DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get popular routes: {}", e))?;

        rows.iter().map(row_to_route).collect()
    }

    /// Haversine proximity on the origin coordinate, nearest first
    pub async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
        limit: i64,
    ) -> Result<Vec<Route>, String> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ROUTE_COLUMNS} FROM (
                SELECT *,
                    2.0 * 6371000.0 * asin(sqrt(
                        power(sin(radians(from_lat - $1) / 2), 2) +
                        cos(radians($1)) * cos(radians(from_lat)) *
                        power(sin(radians(from_lng - $2) / 2), 2)
                    )) AS distance_m
                FROM transit.routes
                WHERE from_lat IS NOT NULL AND from_lng IS NOT NULL
            ) candidates
            WHERE distance_m <= $3
            ORDER BY distance_m ASC
            LIMIT $4
            "#
        ))
        .bind(lat)
        .bind(lng)
        .bind(radius_m)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get nearby routes: {}", e))?;

        rows.iter().map(row_to_route).collect()
    }

    pub async fn stats(&self) -> Result<DirectoryStats, String> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_routes,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'verified') AS verified,
                COUNT(*) FILTER (WHERE status = 'flagged') AS flagged,
                COALESCE(SUM(jsonb_array_length(tips)), 0) AS total_tips
            FROM transit.routes
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| format!("Failed to get route stats: {}", e))?;

        Ok(DirectoryStats {
            total_routes: row.get::<i64, _>("total_routes") as usize,
            pending: row.get::<i64, _>("pending") as usize,
            verified: row.get::<i64, _>("verified") as usize,
            flagged: row.get::<i64, _>("flagged") as usize,
            total_tips: row.get::<i64, _>("total_tips") as usize,
            pending_edits: 0,
        })
    }

}

fn row_to_route(row: &PgRow) -> Result<Route, String> {
    let document: serde_json::Value = row.get("document");
    let document: RouteDocument = serde_json::from_value(document)
        .map_err(|e| format!("Corrupt route document: {}", e))?;

    let tips: serde_json::Value = row.get("tips");
    let tips: Vec<Tip> =
        serde_json::from_value(tips).map_err(|e| format!("Corrupt tips array: {}", e))?;

    let transport: String = row.get("transport_type");
    let transport_type = TransportType::parse_filter(&transport)
        .ok_or_else(|| format!("Unknown transport type: {}", transport))?;

    let status: String = row.get("status");
    let status =
        RouteStatus::parse(&status).ok_or_else(|| format!("Unknown route status: {}", status))?;

    Ok(Route {
        id: row.get("id"),
        from: document.from,
        to: document.to,
        transport_type,
        identifier: document.identifier,
        stops: document.stops,
        fare: document.fare,
        timings: document.timings,
        tips,
        metadata: RouteMetadata {
            upvotes: row.get::<i64, _>("upvotes") as u64,
            downvotes: row.get::<i64, _>("downvotes") as u64,
            verified_votes: row.get::<i64, _>("verified_votes") as u64,
            status,
            last_verified: row.get::<Option<DateTime<Utc>>, _>("last_verified"),
        },
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
