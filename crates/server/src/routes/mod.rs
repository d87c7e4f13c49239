//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (probes the database)
//!
//! # Auth
//! POST /api/auth/register          - Register an account (always role user)
//! POST /api/auth/login             - Exchange credentials for a bearer token
//! POST /api/auth/logout            - Revoke the presented token
//! GET  /api/auth/me                - Current account projection
//! PUT  /api/auth/password          - Rotate the password, revoke all sessions
//!
//! # Store directory (any authenticated role)
//! GET  /api/stores                 - List stores with filters and sorting
//! GET  /api/stores/{id}            - Store detail with aggregates
//! POST /api/stores/{id}/ratings    - Submit a rating (role user)
//! PUT  /api/ratings/{id}           - Revise an own rating (role user)
//!
//! # Owner
//! GET  /api/owner/ratings          - Own store with all ratings and raters
//!
//! # Admin
//! GET  /api/admin/dashboard        - Platform totals
//! POST /api/admin/users            - Create an account with any role
//! GET  /api/admin/users            - List accounts with filters and sorting
//! GET  /api/admin/users/{id}       - Account detail with owned store
//! PUT  /api/admin/users/{id}       - Update an account
//! POST /api/admin/stores           - Create a store
//! GET  /api/admin/stores           - List stores with filters and sorting
//! PUT  /api/admin/stores/{id}      - Update a store
//! ```

use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;

use ratebook_core::AverageRating;

use crate::models::{Rating, RatingWithRater, Store, User};
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod health;
pub mod owner;
pub mod ratings;
pub mod stores;

/// Build the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/auth", auth::router())
        .nest("/api/stores", stores::router())
        .nest("/api/ratings", ratings::router())
        .nest("/api/owner", owner::router())
        .nest("/api/admin", admin::router())
}

// =============================================================================
// Shared Response Projections
// =============================================================================

/// Safe account projection. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: String,
    pub store_id: Option<i64>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            name: user.name.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            address: user.address.as_str().to_owned(),
            role: user.role.to_string(),
            store_id: user.store_id.map(|id| id.as_i64()),
        }
    }
}

/// A store with its cached aggregates. `average_rating` is a two-decimal
/// string, `"0.00"` for a store nobody has rated.
#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub average_rating: AverageRating,
    pub total_ratings: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Store> for StoreResponse {
    fn from(store: &Store) -> Self {
        Self {
            id: store.id.as_i64(),
            name: store.name.as_str().to_owned(),
            email: store.email.as_str().to_owned(),
            address: store.address.as_str().to_owned(),
            average_rating: store.average_rating,
            total_ratings: store.total_ratings,
            created_at: store.created_at,
        }
    }
}

/// One rating on the ledger, as returned to the account that submitted it.
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Rating> for RatingResponse {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id.as_i64(),
            user_id: rating.user_id.as_i64(),
            store_id: rating.store_id.as_i64(),
            rating: rating.rating.as_i64(),
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

/// One rating with the identity of the rater. Only reachable through
/// endpoints that checked the caller may see rater identities.
#[derive(Debug, Serialize)]
pub struct RatingWithRaterResponse {
    pub id: i64,
    pub rating: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&RatingWithRater> for RatingWithRaterResponse {
    fn from(rating: &RatingWithRater) -> Self {
        Self {
            id: rating.id.as_i64(),
            rating: rating.rating.as_i64(),
            user_id: rating.user_id.as_i64(),
            user_name: rating.user_name.as_str().to_owned(),
            user_email: rating.user_email.as_str().to_owned(),
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_helpers {
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    use ratebook_core::{Address, Email, Password, PersonName, Role, StoreId, StoreName};

    use crate::config::{AuthConfig, ServerConfig};
    use crate::db::stores::NewStore;
    use crate::db::users::NewUser;
    use crate::db::{StoreRepository, UserRepository, connect_in_memory};
    use crate::models::{Store, User};
    use crate::services::auth::hash_password;
    use crate::state::AppState;

    /// Build the full router over a fresh in-memory database.
    pub(crate) async fn setup() -> (Router, SqlitePool) {
        let pool = connect_in_memory().await.unwrap();
        let config = ServerConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            auth: AuthConfig {
                token_ttl: Duration::from_secs(3600),
            },
        };
        let state = AppState::new(config, pool.clone());
        (crate::create_app(state), pool)
    }

    /// Drive one request through the router and decode the JSON body.
    pub(crate) async fn send(
        app: &Router,
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
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            // Non-JSON bodies (the health text) come back as a plain string.
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Register an account through the API and return its bearer token.
    pub(crate) async fn register(app: &Router, name: &str, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
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
        body["token"].as_str().unwrap().to_owned()
    }

    /// Log in through the API and return the bearer token.
    pub(crate) async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_owned()
    }

    /// Insert an account with an arbitrary role straight into the database.
    ///
    /// Registration only ever produces role user; tests that need an admin
    /// or owner seed one here and log in through the API afterwards.
    pub(crate) async fn seed_account(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        store_id: Option<StoreId>,
    ) -> User {
        let name = PersonName::parse(name).unwrap();
        let email = Email::parse(email).unwrap();
        let address = Address::parse("12 Fixture Street, Test City").unwrap();
        let password = Password::parse(password).unwrap();
        let password_hash = hash_password(&password).await.unwrap();

        UserRepository::new(pool)
            .create(&NewUser {
                name: &name,
                email: &email,
                password_hash: &password_hash,
                address: &address,
                role,
                store_id,
            })
            .await
            .unwrap()
    }

    /// Insert a store straight into the database.
    pub(crate) async fn seed_store(pool: &SqlitePool, name: &str, email: &str) -> Store {
        let name = StoreName::parse(name).unwrap();
        let email = Email::parse(email).unwrap();
        let address = Address::parse("34 Fixture Avenue, Test City").unwrap();

        StoreRepository::new(pool)
            .create(&NewStore {
                name: &name,
                email: &email,
                address: &address,
            })
            .await
            .unwrap()
    }
}
