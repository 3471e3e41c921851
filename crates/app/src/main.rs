//! Foxden - den-based chat client
//!
//! Headless host for the client core: loads configuration, opens local
//! storage and serves a developer console on stdin.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod console;
mod state;

use config::AppConfig;

fn main() {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Using default configuration");
    }
    tracing::info!("Starting Foxden");

    let mut app_state = match state::AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(data_dir = %app_state.data_dir().display(), "Storage ready");

    let stdin = std::io::stdin();
    if let Err(e) = console::run(&mut app_state, stdin.lock(), std::io::stdout()) {
        tracing::error!("Console failed: {}", e);
    }

    app_state.shutdown();
}
