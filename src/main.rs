// src/main.rs

use std::time::Duration;

use dotenvy::dotenv;
use pdf_quiz::config::Config;
use pdf_quiz::routes;
use pdf_quiz::services::session::SWEEP_PERIOD;
use pdf_quiz::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Generating questions with model {} at {}",
        config.openai_model,
        config.openai_base_url
    );

    let addr = config.bind_addr;
    let max_idle = Duration::from_secs(config.session_idle_secs);
    let state = AppState::from_config(config).expect("Failed to build application state");

    // Abandoned sessions (closed tabs, reloads) are dropped after inactivity
    state
        .sessions
        .spawn_sweeper(max_idle, SWEEP_PERIOD.min(max_idle).max(Duration::from_secs(1)));

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down; all quiz sessions are discarded");
}
