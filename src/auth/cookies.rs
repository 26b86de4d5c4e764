use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::AuthConfig;

/// Build the access token cookie: HttpOnly, SameSite=Lax, Path=/, with
/// Max-Age equal to the token lifetime. `Secure` follows the config so
/// plain-HTTP development setups still work.
pub fn access_token_cookie(auth: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(auth.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(auth.token_lifetime_secs as i64))
        .build()
}

/// Cookie matching the access token cookie's name and path, used to
/// expire it on logout.
pub fn removal_cookie(auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), ""))
        .path("/")
        .build()
}
