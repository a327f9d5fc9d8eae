use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::Method,
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Json as AxumJson, Router,
};
use hyper::Server;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::pipeline::ImportCoordinator;
use crate::types::ImportRequest;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "event-importer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Import endpoint: accepts `{ url, forceUpdate? }` and runs the progressive
/// workflow, so the basic record comes back immediately and AI analysis
/// continues in the background.
async fn import_handler(
    Extension(coordinator): Extension<Arc<ImportCoordinator>>,
    AxumJson(request): AxumJson<ImportRequest>,
) -> impl IntoResponse {
    match coordinator.import_progressive(request).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "event": outcome.event,
            "message": outcome.message,
            "aiProcessing": outcome.ai_processing,
        }))
        .into_response(),
        Err(e) => {
            error!("import failed: {e}");
            Json(json!({
                "success": false,
                "error": e.user_message(),
            }))
            .into_response()
        }
    }
}

/// Create the HTTP server with all routes
pub fn create_server(coordinator: Arc<ImportCoordinator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/import", post(import_handler))
        .layer(Extension(coordinator))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    coordinator: Arc<ImportCoordinator>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(coordinator);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📥 Import:       POST http://localhost:{port}/import");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
