//! Rating revision handler.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::put,
};
use serde::Deserialize;

use ratebook_core::RatingId;

use crate::error::AppError;
use crate::middleware::Caller;
use crate::services::RatingService;
use crate::state::AppState;

use super::RatingResponse;

/// Build the ratings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", put(update_rating))
}

/// Request to revise an existing rating's value.
#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub rating: i64,
}

/// Revise the value of a rating the caller submitted earlier.
///
/// # Errors
///
/// Returns 403 unless the caller's role submits ratings or the rating
/// belongs to another account, 400 for an out-of-range value, 404 for a
/// missing rating.
pub async fn update_rating(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRatingRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    let ratings = RatingService::new(state.pool());
    let rating = ratings
        .update(&caller.user, RatingId::new(id), body.rating)
        .await?;

    Ok(Json(RatingResponse::from(&rating)))
}
