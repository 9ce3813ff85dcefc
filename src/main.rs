use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hos_trip_planner::clients::{DirectionsGateway, MapboxDirectionsClient};
use hos_trip_planner::config::{DatabaseConfig, EnvironmentConfig, HosPolicy};
use hos_trip_planner::repositories::{InMemoryTripRepository, PgTripRepository, TripRepository};
use hos_trip_planner::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚚 HOS Trip Planner");

    let config = EnvironmentConfig::from_env()?;
    let policy = HosPolicy::from_env()?;
    info!(
        "⏱️ HOS policy: {}h driving, {}h rest, {}h cycle, rest check {}",
        policy.max_driving_hours,
        policy.required_rest_hours,
        policy.max_cycle_hours,
        policy.rest_check.as_str()
    );

    let repository: Arc<dyn TripRepository> = match &config.database_url {
        Some(url) => {
            let pool = DatabaseConfig::new(url.clone()).create_pool().await.map_err(|e| {
                error!("❌ Could not connect to the database: {}", e);
                e
            })?;
            let repository = PgTripRepository::new(pool);
            repository.migrate().await?;
            info!("✅ PostgreSQL storage ready");
            Arc::new(repository)
        }
        None => {
            warn!("⚠️ DATABASE_URL not set, trips are kept in memory");
            Arc::new(InMemoryTripRepository::new())
        }
    };

    if !config.directions.has_token() {
        warn!("⚠️ MAPBOX_TOKEN not set, routing requests will be rejected upstream");
    }
    let gateway: Arc<dyn DirectionsGateway> =
        Arc::new(MapboxDirectionsClient::new(config.directions.clone())?);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config, policy, repository, gateway);
    let app = create_app(state);

    info!("🌐 Listening on http://{}", addr);
    info!("   GET  /health");
    info!("   GET|POST /api/trips");
    info!("   GET|DELETE /api/trips/:id");
    info!("   POST /api/trips/:id/plan_route | start_trip | complete | cancel");
    info!("   POST /api/trips/:id/update_stop_status | create_stop | update_location");
    info!("   DELETE /api/trips/:id/route | delete_stop");
    info!("   GET|POST /api/trips/:id/log-sheets");
    info!("   GET|PATCH|DELETE /api/trips/:id/log-sheets/:log_id");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Server error: {}", e);
            e
        })?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Could not listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ Could not install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Ctrl+C received, shutting down");
        },
        _ = terminate => {
            info!("🛑 Termination signal received, shutting down");
        },
    }
}
