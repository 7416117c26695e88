use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use sawaari::{
    api::{
        body_size_middleware, optional_auth_middleware, rate_limit_middleware,
        security_headers_middleware, AuthState, EditApiState, RouteApiState, SecurityState,
        WebApiState,
    },
    config::AppConfig,
    database::{seed::seed_sample_routes, DatabasePool},
    RouteDirectory,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    init_logging(&config)?;

    info!("Starting Sawaari route directory server");
    info!(
        "Verification threshold: {} upvotes, Postgres enabled: {}",
        config.verification.verify_threshold, config.database.postgres_enabled
    );

    let policy = config.verification.to_policy();

    let directory = if config.database.postgres_enabled {
        let db = DatabasePool::new(&config.database.postgres_url)
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to initialize database")?;
        db.init_schema()
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to initialize schema")?;
        Arc::new(RouteDirectory::new(policy).with_database(Arc::new(db)))
    } else {
        info!("Postgres disabled, using in-memory store");
        Arc::new(RouteDirectory::new(policy))
    };

    if config.database.seed_data {
        let created = seed_sample_routes(&directory)
            .await
            .map_err(|e| anyhow::anyhow!("Seeding failed: {}", e))?;
        if created > 0 {
            info!("Seeded {} sample routes", created);
        }
    }

    let security_state = SecurityState::new(
        config.security.rate_limit_per_minute,
        config.security.write_limit_per_hour,
        config.security.max_request_size,
    );
    let auth_state = AuthState {
        directory: directory.clone(),
    };

    // Periodic rate-limiter cleanup so idle IP windows don't accumulate
    {
        let limiters = security_state.clone();
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(300));
            loop {
                tick.tick().await;
                limiters.rate_limiter.cleanup();
                limiters.write_limiter.cleanup();
            }
        });
    }

    let app = Router::new()
        .nest(
            "/routes",
            sawaari::create_route_router(RouteApiState {
                directory: directory.clone(),
            }),
        )
        .nest(
            "/edits",
            sawaari::create_edit_router(EditApiState {
                directory: directory.clone(),
            }),
        )
        .nest(
            "/api",
            sawaari::create_web_router(WebApiState {
                directory: directory.clone(),
            }),
        )
        .route("/health", get(|| async { "OK" }))
        // Order matters: auth runs first so handlers always see AuthContext
        .layer(middleware::from_fn_with_state(
            auth_state,
            optional_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            security_state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            security_state,
            body_size_middleware,
        ))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Sawaari server listening on {}", bind_addr);
    info!(
        "Rate limits: {}/min general, {}/hour writes, max body {}KB",
        config.security.rate_limit_per_minute,
        config.security.write_limit_per_hour,
        config.security.max_request_size / 1024
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(())
}
