use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::auth::tokens::TokenBackend;
use crate::config::AppConfig;
use crate::handlers::admin::AdminUserRow;
use crate::handlers::auth::LoginForm;
use crate::handlers::users::{RegisterRequest, UserResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Access token storage
    pub tokens: Arc<dyn TokenBackend>,
    /// Client used by the admin auth relay
    pub http: reqwest::Client,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
    /// Token store connection status
    pub redis: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::protected,
        crate::handlers::users::register,
        crate::handlers::admin::list_users,
        crate::handlers::admin::get_user,
        crate::handlers::admin::delete_user,
    ),
    components(
        schemas(
            ApiResponse<UserResponse>,
            ApiResponse<Vec<AdminUserRow>>,
            ApiResponse<String>,
            ErrorResponse,
            HealthResponse,
            LoginForm,
            RegisterRequest,
            UserResponse,
            AdminUserRow,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and cookie-token authentication"),
        (name = "admin", description = "Administrative user management"),
    ),
    info(
        title = "Authgate API",
        description = "User registration, cookie-token authentication and admin panel backend",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
