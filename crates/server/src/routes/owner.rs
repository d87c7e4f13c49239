//! Store owner handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::OwnerCaller;
use crate::services::DirectoryService;
use crate::state::AppState;

use super::{RatingWithRaterResponse, StoreResponse};

/// Build the owner router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ratings", get(owner_ratings))
}

/// The owner's store with every rating against it.
#[derive(Debug, Serialize)]
pub struct OwnerDashboardResponse {
    pub store: StoreResponse,
    pub ratings: Vec<RatingWithRaterResponse>,
}

/// Return the caller's own store with all its ratings, rater identities
/// included, newest first.
///
/// # Errors
///
/// Returns 403 unless the caller is an owner, 400 if the account has no
/// associated store, 404 if the associated store row is missing.
pub async fn owner_ratings(
    State(state): State<AppState>,
    OwnerCaller(caller): OwnerCaller,
) -> Result<Json<OwnerDashboardResponse>, AppError> {
    let directory = DirectoryService::new(state.pool());
    let dashboard = directory.owner_dashboard(&caller.user).await?;

    Ok(Json(OwnerDashboardResponse {
        store: StoreResponse::from(&dashboard.store),
        ratings: dashboard
            .ratings
            .iter()
            .map(RatingWithRaterResponse::from)
            .collect(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use ratebook_core::Role;

    use super::super::test_helpers::{login, register, seed_account, seed_store, send, setup};

    #[tokio::test]
    async fn test_owner_sees_store_and_raters() {
        let (app, pool) = setup().await;
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
        let alice =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;
        let uri = format!("/api/stores/{}/ratings", store.id.as_i64());
        send(&app, "POST", &uri, Some(&alice), Some(json!({ "rating": 4 }))).await;

        let owner_token = login(&app, "owner@fixture.test", "Owner#1x").await;
        let (status, body) = send(&app, "GET", "/api/owner/ratings", Some(&owner_token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"]["average_rating"], "4.00");
        assert_eq!(body["store"]["total_ratings"], 1);
        let ratings = body["ratings"].as_array().unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0]["user_email"], "alice@fixture.test");
        assert_eq!(ratings[0]["rating"], 4);
    }

    #[tokio::test]
    async fn test_owner_without_store_is_invalid_state() {
        let (app, pool) = setup().await;
        seed_account(
            &pool,
            "Oliver Fixture Owner Account",
            "owner@fixture.test",
            "Owner#1x",
            Role::Owner,
            None,
        )
        .await;
        let owner_token = login(&app, "owner@fixture.test", "Owner#1x").await;

        let (status, body) = send(&app, "GET", "/api/owner/ratings", Some(&owner_token), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "no store associated with this account");
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let (app, _pool) = setup().await;
        let token =
            register(&app, "Alice Fixture Rater Account", "alice@fixture.test", "Abcdef1!").await;

        let (status, body) = send(&app, "GET", "/api/owner/ratings", Some(&token), None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "owner access required");
    }
}
