mod config;
mod error;
mod routes;

use crate::config::ServerConfig;
use crate::routes::{
    allowed_types_extensions, health_check, history, history_size, process_image,
    set_history_size,
};
use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Extension, Router};
use image_scrub_core::{ImageProcessor, ProcessingOptions};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct State {
    pub processor: Arc<ImageProcessor>,
    pub max_upload_bytes: usize,
}

pub fn router(state: State) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/v1/image/process", post(process_image))
        .route("/v1/image/history", get(history))
        .route(
            "/v1/image/history/size",
            get(history_size).post(set_history_size),
        )
        .route("/v1/allowed-types-extensions", get(allowed_types_extensions))
        .fallback(fallback)
        // Uploads are size-checked while the multipart field is streamed
        .layer(DefaultBodyLimit::disable())
        .layer(Extension(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        history_size = config.history_size.get(),
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    let options = ProcessingOptions {
        max_file_size: Some(config.max_upload_bytes),
        ..Default::default()
    };
    let state = State {
        processor: Arc::new(ImageProcessor::new(options, config.history_size)),
        max_upload_bytes: config.max_upload_bytes,
    };

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = axum::Server::bind(&addr).serve(router(state).into_make_service());

    info!("Webserver running on http://{addr}");

    let graceful = server.with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    });

    if let Err(e) = graceful.await {
        error!("Shutdown error: {e}");
    }

    Ok(())
}

async fn fallback(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("No route for {uri}"))
}
