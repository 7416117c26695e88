//! Database connection pool using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::database::contributors::ContributorRepository;
use crate::database::edits::EditRepository;
use crate::database::routes::RouteRepository;
use crate::directory::DirectoryStats;

pub struct DatabasePool {
    pool: PgPool,
    routes: RouteRepository,
    edits: EditRepository,
    contributors: ContributorRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str) -> Result<Self, String> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await
            .map_err(|e| format!("Failed to connect to PostgreSQL: {}", e))?;

        info!("Connected to PostgreSQL");

        let routes = RouteRepository::new(pool.clone());
        let edits = EditRepository::new(pool.clone());
        let contributors = ContributorRepository::new(pool.clone());

        Ok(Self {
            pool,
            routes,
            edits,
            contributors,
        })
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing database schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS transit")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create transit schema: {}", e))?;

        self.contributors.init_schema().await?;
        self.routes.init_schema().await?;
        self.edits.init_schema().await?;

        info!("Database schema initialized");
        Ok(())
    }

    pub fn routes(&self) -> &RouteRepository {
        &self.routes
    }

    pub fn edits(&self) -> &EditRepository {
        &self.edits
    }

    pub fn contributors(&self) -> &ContributorRepository {
        &self.contributors
    }

    /// Aggregate counts across routes and pending edits
    pub async fn stats(&self) -> Result<DirectoryStats, String> {
        let mut stats = self.routes.stats().await?;
        stats.pending_edits = self.edits.count_pending().await?;
        Ok(stats)
    }
}
