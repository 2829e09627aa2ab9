//! App Timer - launch an application and close it when its time runs out
//!
//! This is the main entry point for the app-timer daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use app_timer::{
    api::create_router,
    config::Config,
    error::TimerError,
    services::{check_notifier_available, DesktopNotifier, OsSupervisor},
    state::AppState,
    timer::CountdownController,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("app_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting app-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, warning_threshold={}s",
        config.host, config.port, config.warning_threshold
    );

    check_notifier_available(&config.notify_command).await;

    let controller = CountdownController::with_config(OsSupervisor::new(), config.timer_config());
    let state = Arc::new(AppState::new(
        controller,
        DesktopNotifier::new(config.notify_command.clone()),
        config.port,
        config.host.clone(),
    ));

    if let Some((app_name, duration_seconds)) = config.initial_run()? {
        state.start_run(&app_name, duration_seconds, config.notify).await?;
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start  - Launch an app and start its countdown");
    info!("  POST /timer/pause  - Pause the countdown");
    info!("  POST /timer/resume - Resume the countdown");
    info!("  POST /timer/stop   - Stop the countdown and close the app");
    info!("  GET  /status       - Check timer status and recent notices");
    info!("  GET  /health       - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            if let Err(e) = result {
                error!("Signal handling failed: {}", e);
            }
            info!("Shutdown signal received");
        }
    }

    // Do not leave the application running past the daemon's lifetime
    match state.stop_run().await {
        Ok(_) => info!("Active run stopped"),
        Err(TimerError::InvalidState { .. }) => {}
        Err(e) => warn!("Failed to stop active run: {}", e),
    }

    info!("Server shutdown complete");
    Ok(())
}
