//! Site Audit Server
//!
//! HTTP front end for the compliance engine. Provides REST API endpoints for:
//!
//! - Site audits (zoning, heritage, subsurface, climate, structural)
//! - Remediation advice
//! - Inspecting the active regulatory regime
//!
//! The engine does the work; this binary only loads configuration, holds the
//! building dataset in memory and maps results onto the wire.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use compliance_engine::{ComplianceEngine, ExecutionMode, Regulations};
use site_types::Feature;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_audit, handle_health, handle_regulations, handle_remediations};

/// Command-line arguments for the site audit server
#[derive(Parser, Debug)]
#[command(name = "site-audit-server")]
#[command(about = "Building compliance audit server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TOML file overriding the built-in regulations
    #[arg(long)]
    regulations: Option<PathBuf>,

    /// JSON array of building features used when a request carries none
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Run the evaluators of each audit on parallel threads
    #[arg(long)]
    parallel: bool,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ComplianceEngine>,
    /// Default building dataset
    pub dataset: Arc<Vec<Feature>>,
}

/// Routes without rate limiting; the limiter needs peer addresses
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/regulations", get(handle_regulations))
        .route("/api/audit", post(handle_audit))
        .route("/api/remediations", post(handle_remediations))
        .with_state(state)
}

fn load_dataset(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting site audit server on {}:{}", args.host, args.port);

    let regulations = match &args.regulations {
        Some(path) => {
            info!("Loading regulations from {}", path.display());
            Regulations::from_file(path)?
        }
        None => Regulations::default(),
    };
    let dataset = match &args.dataset {
        Some(path) => load_dataset(path)?,
        None => Vec::new(),
    };
    let mode = if args.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };

    let state = AppState {
        engine: Arc::new(ComplianceEngine::with_regulations(regulations).with_mode(mode)),
        dataset: Arc::new(dataset),
    };

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state.clone()).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(GovernorLayer {
                config: governor_conf,
            })
            .layer(cors),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!(
        "Mode: {:?}, dataset: {} features",
        mode,
        state.dataset.len()
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
