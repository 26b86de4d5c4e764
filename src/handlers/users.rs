use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum_valid::Valid;
use chrono::Utc;
use model::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for registering a new account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Email address (must be unique)
    #[validate(email)]
    pub email: String,
    /// Login handle (must be unique, 1-20 characters)
    #[validate(length(min = 1, max = 20))]
    pub username: String,
    /// Raw password, stored only as an Argon2 hash
    #[validate(length(min = 1))]
    pub password: String,
}

/// User response model; never carries the password hash
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
            is_verified: model.is_verified,
        }
    }
}

fn already_exists() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "A user with this email or username already exists".to_string(),
            code: "REGISTER_USER_ALREADY_EXISTS".to_string(),
            success: false,
        }),
    )
}

fn registration_failed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error while registering user".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation failure or duplicate user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Registering user {}", request.username);

    // Uniqueness probe and insert run in one transaction.
    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open transaction: {}", db_error);
        registration_failed()
    })?;

    trace!("Checking email and username uniqueness");
    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(request.email.as_str()))
                .add(user::Column::Username.eq(request.username.as_str())),
        )
        .one(&txn)
        .await
        .map_err(|db_error| {
            error!("Uniqueness check failed: {}", db_error);
            registration_failed()
        })?;

    if existing.is_some() {
        warn!(
            "Registration rejected, duplicate email or username: {}",
            request.username
        );
        return Err(already_exists());
    }

    let hashed = hash_password(&request.password).map_err(|hash_error| {
        error!("Password hashing failed: {}", hash_error);
        registration_failed()
    })?;

    let now = Utc::now().fixed_offset();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(request.email.clone()),
        username: Set(request.username.clone()),
        hashed_password: Set(hashed),
        is_active: Set(true),
        is_superuser: Set(false),
        is_verified: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };

    trace!("Inserting new user into database");
    let created = match new_user.insert(&txn).await {
        Ok(created) => created,
        Err(DbErr::Exec(exec_error)) => {
            // A concurrent registration can still trip the unique index.
            let message = exec_error.to_string().to_lowercase();
            if message.contains("unique") || message.contains("constraint") {
                warn!("Registration lost uniqueness race: {}", request.username);
                return Err(already_exists());
            }
            error!("Failed to insert user: {}", exec_error);
            return Err(registration_failed());
        }
        Err(db_error) => {
            error!("Failed to insert user: {}", db_error);
            return Err(registration_failed());
        }
    };

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit registration: {}", db_error);
        registration_failed()
    })?;

    info!(
        "User registered with ID: {}, username: {}",
        created.id, created.username
    );
    let response = ApiResponse {
        data: UserResponse::from(created),
        message: "User registered successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}
