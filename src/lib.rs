pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::TransferConfig;
use crate::services::download::DownloadService;
use crate::services::storage::StorageService;
use crate::services::upload::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::upload::upload_file,
        api::handlers::files::download::download_file,
        api::handlers::files::list::list_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::UploadForm,
            api::handlers::files::FileListResponse,
            api::handlers::files::ErrorResponse,
            api::handlers::health::HealthResponse,
            services::storage::StoredEntry,
            models::StoredFile,
        )
    ),
    tags(
        (name = "files", description = "File transfer endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub uploads: Arc<UploadService>,
    pub downloads: Arc<DownloadService>,
    pub config: TransferConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageService>, config: TransferConfig) -> Self {
        Self {
            uploads: Arc::new(UploadService::new(storage.clone(), config.clone())),
            downloads: Arc::new(DownloadService::new(storage.clone())),
            storage,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::index::index))
        .route("/files", get(api::handlers::files::list_files))
        .route(
            "/upload",
            // Size is enforced per file while streaming, not per request
            post(api::handlers::files::upload_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/download", get(api::handlers::files::download_file))
        .route("/health", get(api::handlers::health::health_check))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
