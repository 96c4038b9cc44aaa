// API module - HTTP endpoints

pub mod auth;
pub mod bookings;
pub mod contact;
pub mod health;
pub mod middleware;
pub mod pages;
pub mod payments;
pub mod validation;

use axum::{
    routing::{get, get_service},
    Router,
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use middleware::session::AppState;

/// Builds the full application router
pub fn app(state: AppState) -> Router {
    // Serve static assets from web/static
    let static_routes = Router::new().nest_service(
        "/static",
        get_service(ServeDir::new(Path::new("web").join("static"))),
    );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(pages::router())
        .merge(auth::router())
        .merge(bookings::router())
        .merge(payments::router())
        .merge(contact::router())
        .merge(static_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
