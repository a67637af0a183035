use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod consolidations;
pub mod error;
pub mod gex;
pub mod packages;
pub mod payments;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route(
            "/packages",
            post(packages::intake_package).get(packages::list_packages),
        )
        .route("/packages/{id}", get(packages::get_package))
        .route(
            "/consolidations",
            post(consolidations::create_consolidation).get(consolidations::list_consolidations),
        )
        .route(
            "/consolidations/{id}",
            get(consolidations::get_consolidation),
        )
        .route(
            "/consolidations/{id}/status",
            post(consolidations::update_consolidation_status),
        )
        .route("/gex/quote", post(gex::quote))
        .route("/gex/warranties/self", post(gex::attach_warranty))
        .route("/gex/warranties/{package_id}", get(gex::get_warranty))
        .route("/payments/capture", post(payments::capture_payment))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
