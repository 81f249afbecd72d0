//! Document Registry
//!
//! REST backend over a JSON-file store, plus a command-line client with
//! CSV import and export.

mod api;
mod cli;
mod client;
mod codec;
mod config;
mod errors;
mod models;
mod query;
mod store;

use std::process::ExitCode;
use std::sync::Arc;

use axum::{routing::get, Router};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use errors::AppError;
use store::{JsonFileStore, RemoteStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e.message());
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    match cli::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Run the HTTP server until it fails.
pub async fn serve(config: Config) -> Result<(), AppError> {
    let addr = config.socket_addr()?;

    tracing::info!("Starting Document Registry");
    tracing::info!("Data path: {:?}", config.data_path);
    tracing::info!("Bind address: {}", addr);

    let store = JsonFileStore::new(config.data_path.clone());
    let state = AppState {
        store: Arc::new(store),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server on {} failed: {}", addr, e)))?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/documents",
            get(api::list_documents).post(api::create_document),
        )
        .route(
            "/documents/{id}",
            get(api::get_document)
                .put(api::update_document)
                .delete(api::delete_document),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
