//! Administration handlers: platform totals, account and store management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use ratebook_core::{AverageRating, StoreId, UserId};

use crate::error::AppError;
use crate::middleware::AdminCaller;
use crate::models::UserWithStore;
use crate::services::AdminService;
use crate::services::admin::{
    AdminStoreQuery, CreateStore, CreateUser, UpdateStore, UpdateUser, UserQuery,
};
use crate::state::AppState;

use super::stores::{StoreListResponse, StoreListingResponse};
use super::{StoreResponse, UserResponse};

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", post(create_user).get(list_users))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/stores", post(create_store).get(list_stores))
        .route("/stores/{id}", put(update_store))
}

// =============================================================================
// Requests
// =============================================================================

/// Request to create an account with any role.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: String,
    pub store_id: Option<i64>,
}

/// Request to update an account. Absent fields stay untouched;
/// `"store_id": null` clears the store link.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_field")]
    pub store_id: Option<Option<i64>>,
}

/// Request to create a store. Aggregates start at zero.
#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Request to update a store's descriptive fields.
#[derive(Debug, Deserialize)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Filters and ordering accepted by the account listing.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Filters and ordering accepted by the admin store listing.
#[derive(Debug, Deserialize)]
pub struct AdminStoreListParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Platform totals.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// The slice of a store shown next to its owner.
#[derive(Debug, Serialize)]
pub struct OwnedStoreResponse {
    pub id: i64,
    pub name: String,
    pub average_rating: AverageRating,
}

/// An account with its owned store, as the admin listing returns it.
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_store: Option<OwnedStoreResponse>,
}

impl From<&UserWithStore> for AdminUserResponse {
    fn from(entry: &UserWithStore) -> Self {
        Self {
            user: UserResponse::from(&entry.user),
            owned_store: entry.owned_store.as_ref().map(|store| OwnedStoreResponse {
                id: store.id.as_i64(),
                name: store.name.as_str().to_owned(),
                average_rating: store.average_rating,
            }),
        }
    }
}

/// The account listing with its total.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub count: usize,
    pub users: Vec<AdminUserResponse>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Platform totals: non-admin accounts, stores, ratings.
///
/// # Errors
///
/// Returns 403 unless the caller is an admin.
pub async fn dashboard(
    State(state): State<AppState>,
    _caller: AdminCaller,
) -> Result<Json<DashboardResponse>, AppError> {
    let admin = AdminService::new(state.pool());
    let stats = admin.dashboard().await?;

    Ok(Json(DashboardResponse {
        total_users: stats.total_users,
        total_stores: stats.total_stores,
        total_ratings: stats.total_ratings,
    }))
}

/// Create an account with any role, optionally linked to a store.
///
/// # Errors
///
/// Returns 400 for invalid fields, an unknown role, or a store link
/// without the owner role; 409 for a duplicate email.
pub async fn create_user(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let admin = AdminService::new(state.pool());
    let user = admin
        .create_user(&CreateUser {
            name: &body.name,
            email: &body.email,
            password: &body.password,
            address: &body.address,
            role: &body.role,
            store_id: body.store_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// List accounts with filters and sorting, each with its owned store.
///
/// # Errors
///
/// Returns 400 for an unknown role filter.
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Query(params): Query<UserListParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let admin = AdminService::new(state.pool());
    let users = admin
        .list_users(&UserQuery {
            name: params.name.as_deref(),
            email: params.email.as_deref(),
            address: params.address.as_deref(),
            role: params.role.as_deref(),
            sort_by: params.sort_by.as_deref(),
            sort_order: params.sort_order.as_deref(),
        })
        .await?;

    Ok(Json(UserListResponse {
        count: users.len(),
        users: users.iter().map(AdminUserResponse::from).collect(),
    }))
}

/// Fetch one account with its owned store.
///
/// # Errors
///
/// Returns 404 if the account doesn't exist.
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Path(id): Path<i64>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let admin = AdminService::new(state.pool());
    let user = admin.get_user(UserId::new(id)).await?;

    Ok(Json(AdminUserResponse::from(&user)))
}

/// Update an account. The owner-only store rule is checked against the
/// account as it would look after the update.
///
/// # Errors
///
/// Returns 404 for a missing account, 400 for invalid fields or a
/// role/store combination that breaks the owner-only rule, 409 for a
/// duplicate email.
pub async fn update_user(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let admin = AdminService::new(state.pool());
    let user = admin
        .update_user(
            UserId::new(id),
            &UpdateUser {
                name: body.name.as_deref(),
                email: body.email.as_deref(),
                address: body.address.as_deref(),
                role: body.role.as_deref(),
                store_id: body.store_id,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Create a store.
///
/// # Errors
///
/// Returns 400 for invalid fields, 409 for a duplicate email.
pub async fn create_store(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreResponse>), AppError> {
    let admin = AdminService::new(state.pool());
    let store = admin
        .create_store(&CreateStore {
            name: &body.name,
            email: &body.email,
            address: &body.address,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(StoreResponse::from(&store))))
}

/// List stores with filters and sorting.
///
/// # Errors
///
/// Returns 403 unless the caller is an admin.
pub async fn list_stores(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Query(params): Query<AdminStoreListParams>,
) -> Result<Json<StoreListResponse>, AppError> {
    let admin = AdminService::new(state.pool());
    let listings = admin
        .list_stores(&AdminStoreQuery {
            name: params.name.as_deref(),
            email: params.email.as_deref(),
            address: params.address.as_deref(),
            sort_by: params.sort_by.as_deref(),
            sort_order: params.sort_order.as_deref(),
        })
        .await?;

    Ok(Json(StoreListResponse {
        count: listings.len(),
        stores: listings.iter().map(StoreListingResponse::from).collect(),
    }))
}

/// Update a store's descriptive fields. Aggregates are not writable.
///
/// # Errors
///
/// Returns 404 for a missing store, 400 for invalid fields, 409 for a
/// duplicate email.
pub async fn update_store(
    State(state): State<AppState>,
    _caller: AdminCaller,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<StoreResponse>, AppError> {
    let admin = AdminService::new(state.pool());
    let store = admin
        .update_store(
            StoreId::new(id),
            &UpdateStore {
                name: body.name.as_deref(),
                email: body.email.as_deref(),
                address: body.address.as_deref(),
            },
        )
        .await?;

    Ok(Json(StoreResponse::from(&store)))
}

/// Keep `"field": null` distinguishable from an absent field: any present
/// value (null included) becomes `Some(...)`; absence stays `None` through
/// `#[serde(default)]`.
fn deserialize_optional_field<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use ratebook_core::Role;

    use super::super::test_helpers::{login, register, seed_account, seed_store, send, setup};

    async fn admin_token(app: &axum::Router, pool: &sqlx::SqlitePool) -> String {
        seed_account(
            pool,
            "Platform Administrator Account",
            "admin@fixture.test",
            "Admin#1x",
            Role::Admin,
            None,
        )
        .await;
        login(app, "admin@fixture.test", "Admin#1x").await
    }

    #[tokio::test]
    async fn test_dashboard_counts_exclude_admins() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let alice =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        send(&app, "POST", &uri, Some(&alice), Some(json!({ "rating": 5 }))).await;

        let (status, body) = send(&app, "GET", "/api/admin/dashboard", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_users"], 1);
        assert_eq!(body["total_stores"], 1);
        assert_eq!(body["total_ratings"], 1);
    }

    #[tokio::test]
    async fn test_admin_routes_reject_other_roles() {
        let (app, _pool) = setup().await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let (status, body) = send(&app, "GET", "/api/admin/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "admin access required");

        let (status, _body) = send(&app, "GET", "/api/admin/dashboard", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_owner_with_store_link() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Owned Fixture Store", "owned@store.test").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({
                "name": "Oliver Fixture Owner Account",
                "email": "owner@fixture.test",
                "password": "Owner#1x",
                "address": "12 Fixture Street, Test City",
                "role": "owner",
                "store_id": store.id.as_i64(),
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "owner");
        assert_eq!(body["store_id"], store.id.as_i64());

        // The created owner can log in and reach the owner view.
        let owner_token = login(&app, "owner@fixture.test", "Owner#1x").await;
        let (status, _body) = send(&app, "GET", "/api/owner/ratings", Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_user_rejects_unknown_role() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({
                "name": "Alice Fixture Rater Account",
                "email": "alice@fixture.test",
                "password": "Abcdef1!",
                "address": "12 Fixture Street, Test City",
                "role": "superuser",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid role: superuser");
    }

    #[tokio::test]
    async fn test_store_link_requires_owner_role() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Owned Fixture Store", "owned@store.test").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({
                "name": "Alice Fixture Rater Account",
                "email": "alice@fixture.test",
                "password": "Abcdef1!",
                "address": "12 Fixture Street, Test City",
                "role": "user",
                "store_id": store.id.as_i64(),
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "store_id requires the owner role");
    }

    #[tokio::test]
    async fn test_list_users_filters_and_embeds_store() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Owned Fixture Store", "owned@store.test").await;
        seed_account(
            &pool,
            "Oliver Fixture Owner Account",
            "owner@fixture.test",
            "Owner#1x",
            Role::Owner,
            Some(store.id),
        )
        .await;
        register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let (status, body) =
            send(&app, "GET", "/api/admin/users?role=owner", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["users"][0]["email"], "owner@fixture.test");
        assert_eq!(body["users"][0]["owned_store"]["name"], "Owned Fixture Store");
        assert_eq!(body["users"][0]["owned_store"]["average_rating"], "0.00");
    }

    #[tokio::test]
    async fn test_list_users_rejects_unknown_role_filter() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;

        let (status, _body) =
            send(&app, "GET", "/api/admin/users?role=wizard", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_user_detail() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Owned Fixture Store", "owned@store.test").await;
        let owner = seed_account(
            &pool,
            "Oliver Fixture Owner Account",
            "owner@fixture.test",
            "Owner#1x",
            Role::Owner,
            Some(store.id),
        )
        .await;

        let uri = format!("/api/admin/users/{}", owner.id.as_i64());
        let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "owner@fixture.test");
        assert_eq!(body["owned_store"]["id"], store.id.as_i64());

        let (status, body) = send(&app, "GET", "/api/admin/users/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "user not found");
    }

    #[tokio::test]
    async fn test_update_user_store_link_is_three_state() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Owned Fixture Store", "owned@store.test").await;
        let owner = seed_account(
            &pool,
            "Oliver Fixture Owner Account",
            "owner@fixture.test",
            "Owner#1x",
            Role::Owner,
            Some(store.id),
        )
        .await;
        let uri = format!("/api/admin/users/{}", owner.id.as_i64());

        // Absent store_id leaves the link alone.
        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "name": "Oliver Renamed Owner Account" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Oliver Renamed Owner Account");
        assert_eq!(body["store_id"], store.id.as_i64());

        // An explicit null clears it.
        let (status, body) =
            send(&app, "PUT", &uri, Some(&token), Some(json!({ "store_id": null }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["store_id"].is_null());
    }

    #[tokio::test]
    async fn test_demoting_linked_owner_rejected() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Owned Fixture Store", "owned@store.test").await;
        let owner = seed_account(
            &pool,
            "Oliver Fixture Owner Account",
            "owner@fixture.test",
            "Owner#1x",
            Role::Owner,
            Some(store.id),
        )
        .await;

        // A role change that would leave a non-owner holding a store link
        // has to clear the link in the same request.
        let uri = format!("/api/admin/users/{}", owner.id.as_i64());
        let (status, _body) =
            send(&app, "PUT", &uri, Some(&token), Some(json!({ "role": "user" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "role": "user", "store_id": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "user");
        assert!(body["store_id"].is_null());
    }

    #[tokio::test]
    async fn test_update_user_duplicate_email_conflicts() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        register(&app, "Robert Fixture Rater Account", "bob@fixture.test", "Abcdef1!").await;

        let (_status, listing) =
            send(&app, "GET", "/api/admin/users?email=bob", Some(&token), None).await;
        let bob_id = listing["users"][0]["id"].as_i64().unwrap();

        let uri = format!("/api/admin/users/{bob_id}");
        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "email": "alice@fixture.test" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "email already exists");
    }

    #[tokio::test]
    async fn test_create_store_and_duplicate_email() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/stores",
            Some(&token),
            Some(json!({
                "name": "Corner Coffee House",
                "email": "coffee@store.test",
                "address": "34 Fixture Avenue, Test City",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["average_rating"], "0.00");
        assert_eq!(body["total_ratings"], 0);

        let (status, _body) = send(
            &app,
            "POST",
            "/api/admin/stores",
            Some(&token),
            Some(json!({
                "name": "Another Coffee House",
                "email": "coffee@store.test",
                "address": "34 Fixture Avenue, Test City",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_store_fields() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        let store = seed_store(&pool, "Corner Coffee House", "coffee@store.test").await;

        let uri = format!("/api/admin/stores/{}", store.id.as_i64());
        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "name": "Renamed Coffee House" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Renamed Coffee House");
        assert_eq!(body["email"], "coffee@store.test");

        let (status, body) = send(
            &app,
            "PUT",
            "/api/admin/stores/999",
            Some(&token),
            Some(json!({ "name": "Ghost Store Nobody Owns" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "store not found");
    }

    #[tokio::test]
    async fn test_admin_store_listing_filters_by_email() {
        let (app, pool) = setup().await;
        let token = admin_token(&app, &pool).await;
        seed_store(&pool, "Corner Coffee House", "coffee@store.test").await;
        seed_store(&pool, "Downtown Bookshop", "books@store.test").await;

        let (status, body) =
            send(&app, "GET", "/api/admin/stores?email=books", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["stores"][0]["name"], "Downtown Bookshop");
    }
}
