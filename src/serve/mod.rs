mod handlers;
mod models;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::upload::UploadService;

pub use models::{PaginatedPhotos, PhotoResponse};

pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub uploads: UploadService,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.database.path).with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database.path.display()
            )
        })?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            uploads: UploadService::from_config(config),
        })
    }
}

pub fn run_serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    let port = config.server.port;
    let max_upload = config.max_upload_bytes();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let app = build_router(state, max_upload);

        let addr = format!("0.0.0.0:{}", port);
        info!(port, "Starting server");
        println!("Serving photos on http://localhost:{}", port);
        println!("Press Ctrl+C to stop.");

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        axum::serve(listener, app).await?;

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/photos",
            get(handlers::list_photos).post(handlers::upload_photo),
        )
        .route(
            "/api/photos/{id}",
            get(handlers::get_photo).delete(handlers::delete_photo),
        )
        .route("/media/{bucket}/{key}", get(handlers::serve_media))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
