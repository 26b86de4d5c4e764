use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use model::entities::user;
use sea_orm::EntityTrait;
use tracing::{error, trace, warn};

use crate::schemas::AppState;

/// The authenticated account together with the raw token that resolved
/// it; logout needs the token to revoke the Redis mapping.
pub struct CurrentUser {
    pub user: user::Model,
    pub token: String,
}

/// An authenticated account that is active and a superuser.
pub struct AdminUser(pub user::Model);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let token = jar
            .get(&state.config.auth.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let user_id = state
            .tokens
            .resolve(&token)
            .await
            .map_err(|token_error| {
                error!("Token store lookup failed: {}", token_error);
                StatusCode::UNAUTHORIZED
            })?
            .ok_or_else(|| {
                trace!("Access token not found in store");
                StatusCode::UNAUTHORIZED
            })?;

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(|db_error| {
                error!("Failed to load user {}: {}", user_id, db_error);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or_else(|| {
                warn!("Access token resolved to missing user {}", user_id);
                StatusCode::UNAUTHORIZED
            })?;

        if !user.is_active {
            warn!("Rejected token for inactive user {}", user.username);
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(CurrentUser { user, token })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;

        if !current.user.is_superuser {
            warn!(
                "User {} is not a superuser, denying admin access",
                current.user.username
            );
            return Err(StatusCode::FORBIDDEN);
        }

        Ok(AdminUser(current.user))
    }
}
