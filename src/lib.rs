use axum::{
    routing::{get, post},
    Router,
    response::IntoResponse,
    http::StatusCode,
};
// Conditionally import SwaggerUi only when needed (not test)
#[cfg(not(test))]
use utoipa_swagger_ui::SwaggerUi;
#[cfg(not(test))]
use tower_http::cors::{CorsLayer, Any};
use utoipa::OpenApi;
#[cfg(not(test))]
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
    GovernorLayer
};
use std::sync::Arc;

pub mod browser;
pub mod config;
pub mod entities;
pub mod error;
pub mod jobs;
pub mod output;
pub mod routes;
pub mod store;

use browser::{BrowserLauncher, HttpLauncher};
use config::Settings;
use output::OutputLayout;
use store::{JobStore, MemoryJobStore, SeaOrmJobStore};

/// Shared handler state: settings, the record store, the browser launcher and
/// the output folders.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn JobStore>,
    pub launcher: Arc<dyn BrowserLauncher>,
    pub layout: OutputLayout,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn JobStore>,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        let layout = OutputLayout::new(settings.output_root.clone());
        AppState {
            settings: Arc::new(settings),
            store,
            launcher,
            layout,
        }
    }
}

/// Connects to `DATABASE_URL` and applies pending migrations, or falls back to
/// an in-memory store when no database is configured.
pub async fn connect_store(settings: &Settings) -> Result<Arc<dyn JobStore>, sea_orm::DbErr> {
    use migration::{Migrator, MigratorTrait};

    match &settings.database_url {
        Some(url) => {
            let conn = sea_orm::Database::connect(url).await?;
            Migrator::up(&conn, None).await?;
            tracing::info!("Connected to database and applied migrations");
            Ok(Arc::new(SeaOrmJobStore::new(conn)))
        }
        None => {
            tracing::info!("DATABASE_URL not set; job ids are kept in memory for this process");
            Ok(Arc::new(MemoryJobStore::new()))
        }
    }
}

/// Builds the default state: configured store, HTTP browser, output folders created.
pub async fn build_state(settings: Settings) -> Result<AppState, sea_orm::DbErr> {
    let store = connect_store(&settings).await?;
    let state = AppState::new(settings, store, Arc::new(HttpLauncher));
    state.layout.ensure_dirs();
    Ok(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "JOBINTEL API",
        version = "0.1.0"
    ),
    paths(
        health_check,
        routes::job_ids::scrape_job_ids,
        routes::job_data::scrape_job_data
    ),
    components(schemas(
        routes::JobIdScrapeRequest,
        routes::JobDataScrapeRequest,
        routes::JobDataScrapeResponse,
        jobs::CrawlSummary
    ))
)]
pub struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // Build our API documentation (needed regardless for ApiDoc::openapi())
    let api_doc = ApiDoc::openapi();

    let api_routes: Router<AppState> = Router::new()
        .route("/health", get(health_check))
        .route("/scrape-job-ids/", post(routes::scrape_job_ids))
        .route("/scrape-job-data/", post(routes::scrape_job_data));

    // --- Rate limiting and Swagger UI only when NOT running unit tests ---
    #[cfg(not(test))]
    let (docs_router, api_routes) = {
        let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc);

        let governor_conf = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .period(std::time::Duration::from_secs(60))
            .burst_size(10)
            .finish();
        let api_routes = match governor_conf {
            Some(conf) => api_routes.layer(GovernorLayer { config: Arc::new(conf) }),
            None => {
                tracing::error!("Invalid rate limiter configuration; serving without rate limiting");
                api_routes
            }
        };

        (docs_router, api_routes)
    };

    #[cfg(test)]
    let docs_router: Router<AppState> = {
        let _ = api_doc;
        Router::new()
    };

    let app = Router::new()
        .merge(api_routes)
        .merge(docs_router)
        .with_state(state);

    #[cfg(not(test))]
    let app = app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    app
}
