//! Integration tests for Ratebook.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ratebook-integration-tests
//! ```
//!
//! Each test drives the real router over a fresh in-memory `SQLite`
//! database, so no running server or external services are required.
//!
//! # Test Categories
//!
//! - `auth_flow` - Session lifecycle end to end
//! - `rating_flow` - Rating submission and aggregate recomputation
//! - `owner_flow` - Store provisioning and the owner dashboard
//! - `admin_flow` - Platform administration journeys

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;

use ratebook_server::config::{AuthConfig, ServerConfig};
use ratebook_server::models::Store;
use ratebook_server::services::admin::{AdminService, CreateStore, CreateUser};
use ratebook_server::{AppState, create_app, db};

/// A fully wired application over a private in-memory database.
///
/// Every test builds its own context, so tests never share state and can
/// run in parallel.
pub struct TestContext {
    /// The complete router, as served in production.
    pub app: Router,
    /// Handle to the backing database, for seeding and direct assertions.
    pub pool: SqlitePool,
}

impl TestContext {
    /// Build the full application over a fresh in-memory database.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created or migrated.
    pub async fn new() -> Self {
        let pool = db::connect_in_memory()
            .await
            .expect("Failed to create in-memory database");
        let config = ServerConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".parse().expect("Failed to parse host"),
            port: 0,
            auth: AuthConfig {
                token_ttl: Duration::from_secs(3600),
            },
        };
        let state = AppState::new(config, pool.clone());
        Self {
            app: create_app(state),
            pool,
        }
    }

    /// Drive one request through the router and decode the JSON body.
    ///
    /// Non-JSON bodies come back as a plain string value.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the response body cannot
    /// be read.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("Failed to build request"),
            None => builder
                .body(Body::empty())
                .expect("Failed to build request"),
        };

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to drive request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Register an account through the API and return its bearer token.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": password,
                    "address": "12 Fixture Street, Test City",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"]
            .as_str()
            .expect("register response missing token")
            .to_owned()
    }

    /// Log in through the API and return the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the login does not succeed.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"]
            .as_str()
            .expect("login response missing token")
            .to_owned()
    }

    /// Bootstrap the platform admin account and return its bearer token.
    ///
    /// Registration only ever produces the user role, so the first admin is
    /// created through the service layer, the same way the seed command
    /// does. Everything after that bootstrap goes through the API.
    ///
    /// # Panics
    ///
    /// Panics if the account cannot be created or logged in.
    pub async fn admin_token(&self) -> String {
        AdminService::new(&self.pool)
            .create_user(&CreateUser {
                name: "Platform Administrator Account",
                email: "admin@fixture.test",
                password: "Admin#1x",
                address: "12 Fixture Street, Test City",
                role: "admin",
                store_id: None,
            })
            .await
            .expect("Failed to create admin account");
        self.login("admin@fixture.test", "Admin#1x").await
    }

    /// Insert a store directly through the service layer.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be created.
    pub async fn seed_store(&self, name: &str, email: &str) -> Store {
        AdminService::new(&self.pool)
            .create_store(&CreateStore {
                name,
                email,
                address: "34 Fixture Avenue, Test City",
            })
            .await
            .expect("Failed to create store")
    }
}
