//! emboss server binary.

use anyhow::{Context, Result};
use clap::Parser;
use emboss_core::AppConfig;
use emboss_server::{AppState, create_router};
use emboss_signer::ZsignTool;
use emboss_storage::{ArtifactStore, FilesystemArtifacts, SessionStore};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// emboss - an IPA resigning service
#[derive(Parser, Debug)]
#[command(name = "embossd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "EMBOSS_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("emboss v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("EMBOSS_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize the upload and output directories
    let sessions = Arc::new(
        SessionStore::new(&config.storage.upload_dir)
            .await
            .context("failed to initialize upload directory")?,
    );
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(
        FilesystemArtifacts::new(&config.storage.output_dir)
            .await
            .context("failed to initialize output directory")?,
    );
    tracing::info!(
        upload_dir = %config.storage.upload_dir.display(),
        output_dir = %config.storage.output_dir.display(),
        "Storage directories initialized"
    );

    // Probe the signing tool; an unavailable tool is reported but not fatal,
    // matching the health endpoint's semantics.
    let signer = Arc::new(ZsignTool::new(&config.signer.zsign_path));
    match signer.version().await {
        Ok(version) => tracing::info!(%version, "Signing tool available"),
        Err(e) => tracing::warn!(
            error = %e,
            "Signing tool not available; signing requests will fail until it is installed"
        ),
    }

    // Create application state
    let state = AppState::new(config.clone(), sessions, artifacts, signer);

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
