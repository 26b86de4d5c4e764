use crate::handlers::{
    admin::{delete_user, get_user, list_users},
    auth::{login, logout, protected},
    health::health_check,
    pages::{home_page, login_page, register_page},
    users::register,
};
use crate::middleware::{admin_auth::admin_auth, csrf::csrf_protect};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/jwt/login", post(login))
        .route("/auth/jwt/logout", post(logout))
        .route("/auth/register", post(register))
        .route("/auth/protected", get(protected))
        // Admin panel routes
        .route("/admin/users", get(list_users))
        .route("/admin/users/:user_id", get(get_user))
        .route("/admin/users/:user_id", delete(delete_user))
        // HTML pages
        .route("/", get(home_page))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        // Static assets
        .nest_service("/static", ServeDir::new("static"))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(csrf_protect))
                .layer(middleware::from_fn_with_state(state.clone(), admin_auth)),
        )
        .with_state(state)
}
