use axum::response::Html;
use tracing::instrument;

use crate::auth::extract::CurrentUser;

const LOGIN_PAGE: &str = include_str!("../../templates/login.html");
const REGISTER_PAGE: &str = include_str!("../../templates/register.html");
const HOME_PAGE: &str = include_str!("../../templates/home.html");

/// Login page
#[instrument]
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Registration page
#[instrument]
pub async fn register_page() -> Html<&'static str> {
    Html(REGISTER_PAGE)
}

/// Home page for the signed-in user
#[instrument(skip_all)]
pub async fn home_page(current: CurrentUser) -> Html<String> {
    Html(HOME_PAGE.replace("{{ username }}", &escape(&current.user.username)))
}

/// Minimal HTML escaping for values interpolated into templates.
fn escape(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::escape;

    #[test]
    fn test_escape_neutralizes_markup() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("a&b"), "a&amp;b");
        assert_eq!(escape("plain_name"), "plain_name");
    }
}
