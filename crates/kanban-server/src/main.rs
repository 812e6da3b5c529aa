mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use kanban_api::assistant::OpenRouterAssistant;
use kanban_api::sessions::{SessionStore, run_sweep_loop};
use kanban_api::{AppState, AppStateInner};
use kanban_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kanban_server=debug,kanban_api=debug,kanban_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;
    if config.seed && db.seed_demo_data()? {
        info!("Empty database seeded with demo board");
    }

    if config.openrouter_api_key.is_empty() {
        warn!("OPENROUTER_API_KEY is not set; AI chat will not function");
    }
    let assistant = OpenRouterAssistant::new(
        config.openrouter_api_key.clone(),
        config.ai_base_url.clone(),
        config.ai_model.clone(),
    );

    let sessions = SessionStore::new(config.session_ttl);
    if !config.session_sweep.is_zero() {
        tokio::spawn(run_sweep_loop(sessions.clone(), config.session_sweep));
    }

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions,
        assistant: Arc::new(assistant),
    });

    let app = kanban_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Kanban server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
