use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::Form;
use axum_extra::extract::CookieJar;
use model::entities::user;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::cookies::{access_token_cookie, removal_cookie};
use crate::auth::extract::{AdminUser, CurrentUser};
use crate::auth::password::verify_password;
use crate::schemas::{AppState, ErrorResponse};

/// Credential form posted to the login endpoint. The `username` field
/// accepts either the account's email or its login handle.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn bad_credentials() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid credentials or inactive user".to_string(),
            code: "LOGIN_BAD_CREDENTIALS".to_string(),
            success: false,
        }),
    )
}

fn server_error(code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Log in with credentials and receive the access token cookie
#[utoipa::path(
    post,
    path = "/auth/jwt/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 204, description = "Login successful, access token cookie set"),
        (status = 400, description = "Bad credentials or inactive user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, StatusCode), (StatusCode, Json<ErrorResponse>)> {
    debug!("Login attempt for {}", form.username);

    let lookup = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(form.username.as_str()))
                .add(user::Column::Username.eq(form.username.as_str())),
        )
        .one(&state.db)
        .await;

    let account = match lookup {
        Ok(Some(account)) => account,
        Ok(None) => {
            warn!("Login rejected: no account for {}", form.username);
            return Err(bad_credentials());
        }
        Err(db_error) => {
            error!("Failed to look up account {}: {}", form.username, db_error);
            return Err(server_error("DATABASE_ERROR"));
        }
    };

    if !account.is_active || !verify_password(&form.password, &account.hashed_password) {
        warn!("Login rejected for {}", form.username);
        return Err(bad_credentials());
    }

    let token = state.tokens.issue(account.id).await.map_err(|token_error| {
        error!("Failed to store access token: {}", token_error);
        server_error("TOKEN_STORE_ERROR")
    })?;

    info!("User {} logged in", account.username);
    let jar = jar.add(access_token_cookie(&state.config.auth, token));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Log out and expire the access token cookie
#[utoipa::path(
    post,
    path = "/auth/jwt/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logout successful, cookie expired"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    current: CurrentUser,
) -> Result<(CookieJar, StatusCode), StatusCode> {
    if let Err(token_error) = state.tokens.revoke(&current.token).await {
        error!("Failed to revoke access token: {}", token_error);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    info!("User {} logged out", current.user.username);
    let jar = jar.remove(removal_cookie(&state.config.auth));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Admin probe used by the admin auth relay
///
/// Every request to an `/admin*` route triggers a round-trip to this
/// endpoint carrying the inbound cookies.
#[utoipa::path(
    get,
    path = "/auth/protected",
    tag = "auth",
    responses(
        (status = 200, description = "Caller is an active superuser"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Caller is not a superuser")
    )
)]
#[instrument(skip_all)]
pub async fn protected(admin: AdminUser) -> StatusCode {
    debug!("Admin probe passed for {}", admin.0.username);
    StatusCode::OK
}
