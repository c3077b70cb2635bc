// src/main.rs

use axum::{Router, routing::get};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use runbox::api::http::http_router;
use runbox::api::ws::ws_session_handler;
use runbox::config::CONFIG;
use runbox::session::LauncherConfig;
use runbox::state::create_app_state;

#[derive(Parser, Debug)]
#[command(name = "runbox", about = "Interactive script execution sessions over HTTP and WebSocket")]
struct Args {
    /// Address to bind
    #[arg(long, env = "RUNBOX_HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(long, env = "RUNBOX_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(CONFIG.log_level.clone())),
        )
        .init();

    let args = Args::parse();
    let host = args.host.unwrap_or_else(|| CONFIG.host.clone());
    let port = args.port.unwrap_or(CONFIG.port);

    info!("Starting runbox");
    info!(
        "Interpreter: {} {}",
        CONFIG.interpreter,
        CONFIG.interpreter_args.join(" ")
    );

    let app_state = create_app_state(LauncherConfig::from_env());

    let app = Router::new()
        .route("/ws", get(ws_session_handler))
        .merge(http_router(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let bind_address = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Listening on http://{bind_address} (ws://{bind_address}/ws)");

    axum::serve(listener, app).await?;

    Ok(())
}
