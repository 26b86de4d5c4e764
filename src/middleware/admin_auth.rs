use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use tracing::{debug, error, warn};

use crate::schemas::{AppState, ErrorResponse};

/// Gate every `/admin*` request behind a round-trip to this service's
/// own `/auth/protected` endpoint.
///
/// The inbound Cookie header is forwarded verbatim; a non-200 reply is
/// mapped to the same status, a transport failure to 503. Requests to
/// any other path pass through untouched.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with("/admin") {
        return next.run(request).await;
    }

    let probe_url = format!(
        "{}/auth/protected",
        state.config.server.base_url.trim_end_matches('/')
    );
    debug!("Re-validating admin request via {}", probe_url);

    let mut probe = state.http.get(&probe_url);
    if let Some(cookie_value) = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
    {
        probe = probe.header(reqwest::header::COOKIE, cookie_value);
    }

    match probe.send().await {
        Ok(reply) if reply.status() == reqwest::StatusCode::OK => {
            debug!("Admin auth relay accepted {}", request.uri().path());
            next.run(request).await
        }
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status().as_u16())
                .unwrap_or(StatusCode::FORBIDDEN);
            warn!(
                "Admin auth relay rejected {} with {}",
                request.uri().path(),
                status
            );
            (
                status,
                Json(ErrorResponse {
                    error: "Access denied".to_string(),
                    code: "ADMIN_AUTH_REJECTED".to_string(),
                    success: false,
                }),
            )
                .into_response()
        }
        Err(request_error) => {
            error!("Admin auth relay unreachable: {}", request_error);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Authentication service unavailable".to_string(),
                    code: "ADMIN_AUTH_UNAVAILABLE".to_string(),
                    success: false,
                }),
            )
                .into_response()
        }
    }
}
