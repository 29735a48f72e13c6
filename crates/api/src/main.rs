use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crashalert_api::background::detection_simulator::DetectionSimulator;
use crashalert_api::background::session_sweeper::{run_session_sweeper, SWEEP_INTERVAL};
use crashalert_api::config::ServerConfig;
use crashalert_api::{router, state, ws};

use state::AppState;

/// Bound on each individual background task during shutdown.
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crashalert_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        display_offset = %config.display_clock.offset(),
        internal_routes = config.internal_secret.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = crashalert_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    crashalert_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    crashalert_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), ws::HEARTBEAT_INTERVAL);

    // --- Event bus ---
    let event_bus = Arc::new(crashalert_events::EventBus::default());

    // Spawn realtime fan-out (pushes accident events to every connection).
    let fanout = ws::FanOut::new(Arc::clone(&ws_manager));
    let fanout_handle = tokio::spawn(fanout.run(event_bus.subscribe()));
    tracing::info!("Event bus and realtime fan-out started");

    // --- Detection simulator ---
    let simulator_cancel = CancellationToken::new();
    let simulator_handle = config.simulate_detections.then(|| {
        let simulator = DetectionSimulator::new(
            pool.clone(),
            Arc::clone(&event_bus),
            config.display_clock,
            Duration::from_secs(config.simulation_interval_secs),
        );
        let cancel = simulator_cancel.clone();
        tokio::spawn(async move {
            simulator.run(cancel).await;
        })
    });

    // --- Session sweeper ---
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(run_session_sweeper(
        pool.clone(),
        SWEEP_INTERVAL,
        sweeper_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
    };

    // --- Router ---
    let app = router::build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let cleanup = async {
        simulator_cancel.cancel();
        if let Some(handle) = simulator_handle {
            let _ = tokio::time::timeout(TASK_STOP_TIMEOUT, handle).await;
            tracing::info!("Detection simulator stopped");
        }

        sweeper_cancel.cancel();
        let _ = tokio::time::timeout(TASK_STOP_TIMEOUT, sweeper_handle).await;
        tracing::info!("Session sweeper stopped");

        // Dropping the last bus handle closes the channel and ends the fan-out.
        drop(event_bus);
        let _ = tokio::time::timeout(TASK_STOP_TIMEOUT, fanout_handle).await;
        tracing::info!("Realtime fan-out shut down");

        let ws_count = ws_manager.connection_count().await;
        tracing::info!(ws_count, "Closing remaining WebSocket connections");
        ws_manager.shutdown_all().await;
    };

    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), cleanup)
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Cleanup timed out"
        );
    }

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
