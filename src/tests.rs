#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use uuid::Uuid;

    use crate::auth::tokens::TokenBackend;
    use crate::handlers::auth::LoginForm;
    use crate::handlers::users::RegisterRequest;
    use crate::middleware::csrf::CSRF_HEADER;
    use crate::repository::Repository;
    use crate::router::create_router;
    use crate::schemas::{ApiResponse, AppState};
    use crate::test_utils::test_utils::{
        seed_user, setup_test_app, setup_test_db, test_config, MemoryTokenStore,
    };
    use model::entities::user;

    /// Fetch the CSRF token the server hands out on the first response.
    async fn fetch_csrf_token(server: &TestServer) -> String {
        let response = server.get("/login").await;
        response.assert_status(StatusCode::OK);
        response.cookie("csrftoken").value().to_string()
    }

    fn csrf_header(token: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(CSRF_HEADER),
            HeaderValue::from_str(token).expect("csrf token is not a valid header value"),
        )
    }

    /// Log in through the real endpoint; the server keeps the cookies.
    async fn login_as(server: &TestServer, csrf: &str, username: &str, password: &str) {
        let (name, value) = csrf_header(csrf);
        let response = server
            .post("/auth/jwt/login")
            .add_header(name, value)
            .form(&LoginForm {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
    }

    async fn new_server() -> TestServer {
        let app = setup_test_app().await;
        let mut server = TestServer::new(app).unwrap();
        server.do_save_cookies();
        server
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = new_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["database"], "connected");
        assert_eq!(body["redis"], "connected");
    }

    #[tokio::test]
    async fn test_register_user() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;

        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/register")
            .add_header(name, value)
            .json(&RegisterRequest {
                email: "bob@example.com".to_string(),
                username: "bob".to_string(),
                password: "builder".to_string(),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "User registered successfully");
        assert_eq!(body.data["username"], "bob");
        assert_eq!(body.data["email"], "bob@example.com");
        assert_eq!(body.data["is_active"], true);
        assert_eq!(body.data["is_superuser"], false);
        // The password hash never leaves the server.
        assert!(body.data.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;

        // "alice" is seeded by the test fixture.
        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/register")
            .add_header(name, value)
            .json(&RegisterRequest {
                email: "other@example.com".to_string(),
                username: "alice".to_string(),
                password: "password".to_string(),
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "REGISTER_USER_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_payloads() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;

        // Malformed email
        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/register")
            .add_header(name, value)
            .json(&RegisterRequest {
                email: "not-an-email".to_string(),
                username: "carol".to_string(),
                password: "password".to_string(),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Username over 20 characters
        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/register")
            .add_header(name, value)
            .json(&RegisterRequest {
                email: "carol@example.com".to_string(),
                username: "carol_has_a_very_long_name".to_string(),
                password: "password".to_string(),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_requires_csrf_token() {
        let server = new_server().await;

        let response = server
            .post("/auth/register")
            .json(&RegisterRequest {
                email: "dave@example.com".to_string(),
                username: "dave".to_string(),
                password: "password".to_string(),
            })
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "CSRF_FAILED");
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_serves_home_page() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;

        login_as(&server, &csrf, "alice", "wonderland").await;

        // The access token cookie is now in the jar; the home page
        // greets the signed-in user.
        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("alice"));
    }

    #[tokio::test]
    async fn test_login_accepts_email_as_identifier() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;

        login_as(&server, &csrf, "alice@example.com", "wonderland").await;

        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;

        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/jwt/login")
            .add_header(name, value)
            .form(&LoginForm {
                username: "alice".to_string(),
                password: "not-wonderland".to_string(),
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "LOGIN_BAD_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_user() {
        let app = {
            let state = crate::test_utils::test_utils::setup_test_app_state().await;
            seed_user(
                &state.db,
                "mallory",
                "mallory@example.com",
                "password",
                false,
                false,
            )
            .await;
            create_router(state)
        };
        let mut server = TestServer::new(app).unwrap();
        server.do_save_cookies();
        let csrf = fetch_csrf_token(&server).await;

        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/jwt/login")
            .add_header(name, value)
            .form(&LoginForm {
                username: "mallory".to_string(),
                password: "password".to_string(),
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;
        login_as(&server, &csrf, "alice", "wonderland").await;

        let (name, value) = csrf_header(&csrf);
        let response = server
            .post("/auth/jwt/logout")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        // The token is gone from the store, so the home page rejects us.
        let response = server.get("/").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_home_page_requires_authentication() {
        let server = new_server().await;

        let response = server.get("/").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_probe_matrix() {
        // Anonymous: 401
        let server = new_server().await;
        let response = server.get("/auth/protected").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Regular user: 403
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;
        login_as(&server, &csrf, "alice", "wonderland").await;
        let response = server.get("/auth/protected").await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Superuser: 200
        let server = new_server().await;
        let csrf = fetch_csrf_token(&server).await;
        login_as(&server, &csrf, "admin", "adminpass").await;
        let response = server.get("/auth/protected").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_and_register_pages_are_public() {
        let server = new_server().await;

        let response = server.get("/login").await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("Sign in"));

        let response = server.get("/register").await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("Create an account"));
    }

    #[tokio::test]
    async fn test_repository_crud_roundtrip() {
        let db = setup_test_db().await;

        let created = seed_user(&db, "erin", "erin@example.com", "password", false, true).await;

        let found = Repository::<user::Entity>::find_by_id(&db, created.id)
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found.username, "erin");

        assert_eq!(Repository::<user::Entity>::count(&db).await.unwrap(), 1);
        assert_eq!(
            Repository::<user::Entity>::find_all(&db).await.unwrap().len(),
            1
        );

        let deleted = Repository::<user::Entity>::delete_by_id(&db, created.id)
            .await
            .unwrap();
        assert_eq!(deleted.rows_affected, 1);
        assert_eq!(Repository::<user::Entity>::count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_token_store_expiry() {
        let store = MemoryTokenStore::new(Duration::from_secs(0));
        let user_id = Uuid::new_v4();

        let token = store.issue(user_id).await.unwrap();
        assert_eq!(store.resolve(&token).await.unwrap(), None);

        let store = MemoryTokenStore::new(Duration::from_secs(3600));
        let token = store.issue(user_id).await.unwrap();
        assert_eq!(store.resolve(&token).await.unwrap(), Some(user_id));

        store.revoke(&token).await.unwrap();
        assert_eq!(store.resolve(&token).await.unwrap(), None);
    }

    // The admin surface is gated by a middleware that re-validates the
    // cookie through a loopback HTTP call, so these tests run against a
    // real listener instead of the in-process test transport.
    mod admin_relay {
        use super::*;

        async fn spawn_server() -> (String, reqwest::Client) {
            let db = setup_test_db().await;
            seed_user(&db, "alice", "alice@example.com", "wonderland", false, true).await;
            seed_user(&db, "admin", "admin@example.com", "adminpass", true, true).await;

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            let mut config = test_config();
            config.server.base_url = format!("http://{}", addr);

            let state = AppState {
                db,
                tokens: Arc::new(MemoryTokenStore::new(Duration::from_secs(3600))),
                http: reqwest::Client::new(),
                config: Arc::new(config),
            };
            let app = create_router(state);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let client = reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .unwrap();
            (format!("http://{}", addr), client)
        }

        async fn fetch_csrf(client: &reqwest::Client, base: &str) -> String {
            let response = client.get(format!("{base}/login")).send().await.unwrap();
            response
                .headers()
                .get_all(reqwest::header::SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find(|value| value.starts_with("csrftoken="))
                .and_then(|value| value.split(';').next())
                .and_then(|pair| pair.split('=').nth(1))
                .expect("csrftoken cookie should be set")
                .to_string()
        }

        async fn login(client: &reqwest::Client, base: &str, username: &str, password: &str) {
            let csrf = fetch_csrf(client, base).await;
            let response = client
                .post(format!("{base}/auth/jwt/login"))
                .header("x-csrftoken", csrf)
                .form(&[("username", username), ("password", password)])
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
        }

        #[tokio::test]
        async fn test_admin_list_and_delete_as_superuser() {
            let (base, client) = spawn_server().await;
            login(&client, &base, "admin", "adminpass").await;

            // List users
            let response = client
                .get(format!("{base}/admin/users"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            let body: serde_json::Value = response.json().await.unwrap();
            let rows = body["data"].as_array().unwrap();
            assert_eq!(rows.len(), 2);

            let alice_id = rows
                .iter()
                .find(|row| row["username"] == "alice")
                .and_then(|row| row["id"].as_str())
                .unwrap()
                .to_string();

            // Fetch one record
            let response = client
                .get(format!("{base}/admin/users/{alice_id}"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);

            // Delete it
            let response = client
                .delete(format!("{base}/admin/users/{alice_id}"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);

            // It is gone now
            let response = client
                .get(format!("{base}/admin/users/{alice_id}"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_admin_rejects_regular_user() {
            let (base, client) = spawn_server().await;
            login(&client, &base, "alice", "wonderland").await;

            let response = client
                .get(format!("{base}/admin/users"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["code"], "ADMIN_AUTH_REJECTED");
        }

        #[tokio::test]
        async fn test_admin_rejects_anonymous() {
            let (base, client) = spawn_server().await;

            let response = client
                .get(format!("{base}/admin/users"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        }
    }
}
