use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::schemas::ErrorResponse;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Paths that always require a matching CSRF token on state-changing
/// requests.
const PROTECTED_PATHS: [&str; 4] = [
    "/auth/jwt/login",
    "/auth/jwt/logout",
    "/auth/register",
    "/auth/protected",
];

/// Double-submit CSRF protection.
///
/// State-changing requests to the protected paths must carry an
/// `x-csrftoken` header equal to the `csrftoken` cookie. Responses to
/// requests that arrived without the cookie get a fresh one appended, so
/// every client ends up holding a token.
pub async fn csrf_protect(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let cookie_token = jar.get(CSRF_COOKIE).map(|cookie| cookie.value().to_string());

    let state_changing = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
    if state_changing && PROTECTED_PATHS.contains(&path.as_str()) {
        let header_token = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok());

        let token_matches = matches!(
            (cookie_token.as_deref(), header_token),
            (Some(cookie), Some(header)) if cookie == header
        );

        if !token_matches {
            warn!("Rejected {} {} without a valid CSRF token", method, path);
            return (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "CSRF token missing or invalid".to_string(),
                    code: "CSRF_FAILED".to_string(),
                    success: false,
                }),
            )
                .into_response();
        }
        trace!("CSRF token accepted for {} {}", method, path);
    }

    let mut response = next.run(request).await;

    // Always make sure the client ends up holding a csrftoken cookie.
    if cookie_token.is_none() {
        let cookie = Cookie::build((CSRF_COOKIE, Uuid::new_v4().simple().to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .build();
        if let Ok(header_value) = cookie.to_string().parse() {
            response.headers_mut().append(header::SET_COOKIE, header_value);
        }
    }

    response
}
