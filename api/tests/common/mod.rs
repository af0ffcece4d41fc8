use std::sync::Arc;

use api::auth::AuthConfig;
use api::{AppState, build_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub auth: Arc<AuthConfig>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let conn = Database::connect("sqlite::memory:")
            .await
            .expect("sqlite connect");
        Migrator::up(&conn, None).await.expect("migrations");
        let auth = Arc::new(AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_minutes: 15,
        });
        let state = AppState {
            db: Arc::new(conn),
            auth: auth.clone(),
            templates_dir: std::env::temp_dir(),
            static_dir: std::env::temp_dir(),
            cors_allowed_origins: Vec::new(),
        };
        Self {
            router: build_router(state),
            auth,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("response body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn register(&self, username: &str, password: &str, role: &str) -> StatusCode {
        let (status, _) = self
            .request(
                Method::POST,
                "/register",
                None,
                Some(json!({"username": username, "password": password, "role": role})),
            )
            .await;
        status
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/login",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_string()
    }

    /// Registers an HR account and returns a token for it.
    pub async fn hr_token(&self) -> String {
        assert_eq!(
            self.register("hr.admin", "s3cret", "HR").await,
            StatusCode::CREATED
        );
        self.login("hr.admin", "s3cret").await
    }

    /// Registers a non-HR account and returns a token for it.
    pub async fn staff_token(&self) -> String {
        assert_eq!(
            self.register("staff.member", "s3cret", "employee").await,
            StatusCode::CREATED
        );
        self.login("staff.member", "s3cret").await
    }
}
