use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reservation_core::backend::BackendClient;
use reservation_core::cli::{self, Cli, Commands};
use reservation_core::config::{Config, LogFormat};
use reservation_core::health::BackendChecker;
use reservation_core::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Quote {
            unit,
            check_in,
            check_out,
            guests,
        } => cli::handle_quote(&config, &unit, check_in, check_out, guests).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let backend = BackendClient::from_config(&config)?;
    tracing::info!(
        backend_url = %backend.base_url(),
        timeout_secs = config.backend_timeout_secs,
        "Backend client initialized"
    );

    let app_state = AppState::new(Arc::new(backend.clone()), &config)
        .with_health_checker(Arc::new(BackendChecker::new(backend)));
    let app = create_app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
