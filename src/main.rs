//! ollama-relay HTTP server
//!
//! Resolves configuration and session toggles, then serves the emulated
//! ollama API until interrupted.

use clap::Parser;
use ollama_relay::{
    cli::{Cli, Command, DEFAULT_CONFIG_PATH, generate_config_template},
    config::Config,
    handlers::AppState,
    session::SessionToggles,
    telemetry,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = &cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    telemetry::init(&config.observability.log_level);

    // Command line first, then the config file, then the console prompt
    let toggles = SessionToggles::resolve(
        cli.stream.or(config.session.stream),
        cli.trim_flag().or(config.session.trim),
    )
    .await;

    tracing::info!(
        stream = ?toggles.stream,
        trim = ?toggles.trim,
        upstream = %config.upstream.base_url(),
        "Session configured"
    );

    let config = Arc::new(config);
    let state = AppState::new(Arc::clone(&config), toggles)?;

    if config.upstream.prewarm() {
        let upstream = state.upstream().clone();
        tokio::spawn(async move { upstream.prewarm().await });
    }

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| format!("invalid server.host '{}': {}", config.server.host, e))?;
    let addr = SocketAddr::from((ip, config.server.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, ollama_relay::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Explicit `--config` must load; the implicit default is optional
fn load_config(explicit: Option<&str>) -> Result<Config, ollama_relay::error::AppError> {
    match explicit {
        Some(path) => Config::from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(Config::default()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
