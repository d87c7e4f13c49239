//! Store directory handlers: listing, detail, rating submission.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use ratebook_core::StoreId;

use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::StoreListing;
use crate::services::directory::StoreQuery;
use crate::services::{DirectoryService, RatingService};
use crate::state::AppState;

use super::{RatingResponse, RatingWithRaterResponse, StoreResponse};

/// Build the store directory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stores))
        .route("/{id}", get(store_detail))
        .route("/{id}/ratings", post(submit_rating))
}

/// Filters and ordering accepted by the store listing.
#[derive(Debug, Deserialize)]
pub struct StoreListParams {
    pub name: Option<String>,
    pub address: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Request to rate the store in the path. The rater is always the caller.
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub rating: i64,
}

/// One store in the listing. `user_rating`/`user_rating_id` appear only on
/// listings annotated with the caller's own ratings.
#[derive(Debug, Serialize)]
pub struct StoreListingResponse {
    #[serde(flatten)]
    pub store: StoreResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating_id: Option<i64>,
}

impl From<&StoreListing> for StoreListingResponse {
    fn from(listing: &StoreListing) -> Self {
        Self {
            store: StoreResponse::from(&listing.store),
            user_rating: listing.own_rating.map(|r| r.rating.as_i64()),
            user_rating_id: listing.own_rating.map(|r| r.id.as_i64()),
        }
    }
}

/// The store listing with its total.
#[derive(Debug, Serialize)]
pub struct StoreListResponse {
    pub count: usize,
    pub stores: Vec<StoreListingResponse>,
}

/// One store with the rating list the caller is allowed to see.
#[derive(Debug, Serialize)]
pub struct StoreDetailResponse {
    #[serde(flatten)]
    pub store: StoreResponse,
    /// Present only when the caller may see who rated this store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<RatingWithRaterResponse>>,
}

/// List stores with optional substring filters and allow-listed sorting.
///
/// For role `user` each store carries the caller's own rating; other roles
/// get the bare listing.
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn list_stores(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<StoreListParams>,
) -> Result<Json<StoreListResponse>, AppError> {
    let directory = DirectoryService::new(state.pool());
    let listings = directory
        .list_stores(
            &caller.user,
            &StoreQuery {
                name: params.name.as_deref(),
                address: params.address.as_deref(),
                sort_by: params.sort_by.as_deref(),
                sort_order: params.sort_order.as_deref(),
            },
        )
        .await?;

    Ok(Json(StoreListResponse {
        count: listings.len(),
        stores: listings.iter().map(StoreListingResponse::from).collect(),
    }))
}

/// Fetch one store with its aggregates. The per-rating list with rater
/// identity is included for admins anywhere and owners for their own store.
///
/// # Errors
///
/// Returns 404 if the store doesn't exist.
pub async fn store_detail(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<StoreDetailResponse>, AppError> {
    let directory = DirectoryService::new(state.pool());
    let detail = directory
        .store_detail(&caller.user, StoreId::new(id))
        .await?;

    Ok(Json(StoreDetailResponse {
        store: StoreResponse::from(&detail.store),
        ratings: detail
            .ratings
            .as_ref()
            .map(|ratings| ratings.iter().map(RatingWithRaterResponse::from).collect()),
    }))
}

/// Submit a rating for the store in the path.
///
/// # Errors
///
/// Returns 403 unless the caller's role submits ratings, 400 for an
/// out-of-range value, 404 for a missing store, 409 if already rated.
pub async fn submit_rating(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<RatingResponse>), AppError> {
    let ratings = RatingService::new(state.pool());
    let rating = ratings
        .submit(&caller.user, StoreId::new(id), body.rating)
        .await?;

    Ok((StatusCode::CREATED, Json(RatingResponse::from(&rating))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use ratebook_core::Role;

    use super::super::test_helpers::{login, register, seed_account, seed_store, send, setup};

    #[tokio::test]
    async fn test_unrated_store_lists_zero_aggregates() {
        let (app, pool) = setup().await;
        seed_store(&pool, "Quiet Corner Store", "quiet@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let (status, body) = send(&app, "GET", "/api/stores", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["stores"][0]["average_rating"], "0.00");
        assert_eq!(body["stores"][0]["total_ratings"], 0);
    }

    #[tokio::test]
    async fn test_user_listing_carries_own_rating() {
        let (app, pool) = setup().await;
        let rated = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        seed_store(&pool, "Other Fixture Store", "other@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let uri = format!("/api/stores/{}/ratings", rated.id.as_i64());
        let (status, _body) =
            send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 4 }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_status, body) =
            send(&app, "GET", "/api/stores?sort_by=name&sort_order=asc", Some(&token), None).await;
        let stores = body["stores"].as_array().unwrap();

        // "Other" sorts before "Rated"
        assert!(stores[0].get("user_rating").is_none());
        assert_eq!(stores[1]["user_rating"], 4);
        assert!(stores[1]["user_rating_id"].is_number());
    }

    #[tokio::test]
    async fn test_admin_listing_has_no_annotation() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let user_token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        send(&app, "POST", &uri, Some(&user_token), Some(json!({ "rating": 5 }))).await;

        seed_account(
            &pool,
            "Platform Administrator Account",
            "admin@fixture.test",
            "Admin#1x",
            Role::Admin,
            None,
        )
        .await;
        let admin_token = login(&app, "admin@fixture.test", "Admin#1x").await;

        let (_status, body) = send(&app, "GET", "/api/stores", Some(&admin_token), None).await;
        // The aggregate is visible, the admin's (nonexistent) own rating is not.
        assert_eq!(body["stores"][0]["average_rating"], "5.00");
        assert!(body["stores"][0].get("user_rating").is_none());
    }

    #[tokio::test]
    async fn test_detail_hides_rater_identity_from_users() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 5 }))).await;

        let detail_uri = format!("/api/stores/{}", store.id.as_i64());
        let (status, body) = send(&app, "GET", &detail_uri, Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["average_rating"], "5.00");
        assert_eq!(body["total_ratings"], 1);
        assert!(body.get("ratings").is_none());
    }

    #[tokio::test]
    async fn test_detail_shows_raters_to_admin() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 3 }))).await;

        seed_account(
            &pool,
            "Platform Administrator Account",
            "admin@fixture.test",
            "Admin#1x",
            Role::Admin,
            None,
        )
        .await;
        let admin_token = login(&app, "admin@fixture.test", "Admin#1x").await;

        let detail_uri = format!("/api/stores/{}", store.id.as_i64());
        let (_status, body) = send(&app, "GET", &detail_uri, Some(&admin_token), None).await;

        let ratings = body["ratings"].as_array().unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0]["rating"], 3);
        assert_eq!(ratings[0]["user_email"], "alice@fixture.test");
    }

    #[tokio::test]
    async fn test_first_rating_sets_aggregates() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        let (status, body) =
            send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 5 }))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rating"], 5);
        assert_eq!(body["store_id"], store.id.as_i64());

        let detail_uri = format!("/api/stores/{}", store.id.as_i64());
        let (_status, detail) = send(&app, "GET", &detail_uri, Some(&token), None).await;
        assert_eq!(detail["average_rating"], "5.00");
        assert_eq!(detail["total_ratings"], 1);
    }

    #[tokio::test]
    async fn test_duplicate_rating_conflicts() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 5 }))).await;

        let (status, body) =
            send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 1 }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "store already rated");

        // The rejected submission left the ledger alone.
        let detail_uri = format!("/api/stores/{}", store.id.as_i64());
        let (_status, detail) = send(&app, "GET", &detail_uri, Some(&token), None).await;
        assert_eq!(detail["average_rating"], "5.00");
        assert_eq!(detail["total_ratings"], 1);
    }

    #[tokio::test]
    async fn test_submit_requires_user_role() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        seed_account(
            &pool,
            "Platform Administrator Account",
            "admin@fixture.test",
            "Admin#1x",
            Role::Admin,
            None,
        )
        .await;
        let admin_token = login(&app, "admin@fixture.test", "Admin#1x").await;

        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        let (status, body) =
            send(&app, "POST", &uri, Some(&admin_token), Some(json!({ "rating": 5 }))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "only users can submit ratings");
    }

    #[tokio::test]
    async fn test_out_of_range_value_rejected() {
        let (app, pool) = setup().await;
        let store = seed_store(&pool, "Rated Fixture Store", "rated@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        let (status, _body) =
            send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 6 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _body) =
            send(&app, "POST", &uri, Some(&token), Some(json!({ "rating": 0 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rating_missing_store_not_found() {
        let (app, _pool) = setup().await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let (status, body) =
            send(&app, "POST", "/api/stores/999/ratings", Some(&token), Some(json!({ "rating": 5 })))
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "store not found");
    }

    #[tokio::test]
    async fn test_listing_filters_by_name() {
        let (app, pool) = setup().await;
        seed_store(&pool, "Corner Coffee House", "coffee@store.test").await;
        seed_store(&pool, "Downtown Bookshop", "books@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let (_status, body) = send(&app, "GET", "/api/stores?name=coffee", Some(&token), None).await;

        assert_eq!(body["count"], 1);
        assert_eq!(body["stores"][0]["name"], "Corner Coffee House");
    }

    #[tokio::test]
    async fn test_listing_wildcards_are_literal() {
        let (app, pool) = setup().await;
        seed_store(&pool, "Corner Coffee House", "coffee@store.test").await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        // "%" must not match everything once escaped.
        let (_status, body) = send(&app, "GET", "/api/stores?name=%25", Some(&token), None).await;
        assert_eq!(body["count"], 0);
    }
}
