use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::predict::Satellite;
use crate::service::PassService;

use super::api::error::ErrorResponse;
use super::api::location as location_handlers;
use super::api::notifications as notification_handlers;
use super::api::passes as pass_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PassService>,
    pub default_satellite: Arc<Satellite>,
}

impl AppState {
    pub fn new(service: Arc<PassService>, default_satellite: Satellite) -> Self {
        Self {
            service,
            default_satellite: Arc::new(default_satellite),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/current", post(location_handlers::current_location))
        .route("/api/passes", post(pass_handlers::list_passes))
        .route("/api/pass-finder", post(pass_handlers::pass_finder))
        .route(
            "/api/notifications/{id}",
            get(notification_handlers::get_notification),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("not_found")))
}

/// Serve the API on `bind_addr` until `shutdown` resolves.
pub async fn run_server(
    bind_addr: &str,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
