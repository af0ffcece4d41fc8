pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthConfig>,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub cors_allowed_origins: Vec<String>,
}

/// Assembles the full route table. Reads require a valid token; writes are
/// additionally gated on the HR role. Pages, register, login, and health are
/// public.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index_page))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        );

    let reads = Router::new()
        .route("/employees", get(handlers::list_employees))
        .route("/employees/{id}", get(handlers::get_employee))
        .route("/departments", get(handlers::list_departments))
        .route("/departments/{id}", get(handlers::get_department))
        .route("/roles", get(handlers::list_roles))
        .route("/roles/{id}", get(handlers::get_role))
        .route("/performance_reviews", get(handlers::list_reviews))
        .route("/performance_reviews/{id}", get(handlers::get_review));

    let writes = Router::new()
        .route("/employees", post(handlers::create_employee))
        .route(
            "/employees/{id}",
            put(handlers::update_employee).delete(handlers::delete_employee),
        )
        .route("/departments", post(handlers::create_department))
        .route(
            "/departments/{id}",
            put(handlers::update_department).delete(handlers::delete_department),
        )
        .route("/roles", post(handlers::create_role))
        .route(
            "/roles/{id}",
            put(handlers::update_role).delete(handlers::delete_role),
        )
        .route("/performance_reviews", post(handlers::create_review))
        .route(
            "/performance_reviews/{id}",
            put(handlers::update_review).delete(handlers::delete_review),
        )
        .route_layer(middleware::from_fn(extract::require_hr));

    let protected = reads.merge(writes).route_layer(middleware::from_fn_with_state(
        state.clone(),
        extract::require_auth,
    ));

    let request_id = HeaderName::from_static("x-request-id");
    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.cors_allowed_origins)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}
