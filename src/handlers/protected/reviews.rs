// handlers/protected/reviews.rs - Writing and curating reviews

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::api::format::ReviewImageView;
use crate::api::{parse_id, AppJson, AppState};
use crate::config;
use crate::database::models::{Imageable, NewImage, NewReview, Review, ReviewFilter};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::payload::{ImagePayload, ReviewPayload};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services;

fn already_reviewed() -> ApiError {
    ApiError::forbidden("User already has a review for this spot")
}

/// GET /reviews/current - the caller's reviews with spot summaries
pub async fn reviews_current(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Value> {
    let reviews = state.store.list_reviews(ReviewFilter::Author(user.id)).await?;
    let views = services::review_views(&*state.store, reviews, true).await?;
    Ok(ApiResponse::success(json!({ "Reviews": views })))
}

/// POST /spots/:id/reviews - review a spot, once per user
pub async fn spot_review_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ReviewPayload>,
) -> ApiResult<Review> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    services::existing_spot(&*state.store, spot_id).await?;

    let fields = payload.validate()?;

    if state.store.find_user_review(user.id, spot_id).await?.is_some() {
        return Err(already_reviewed());
    }

    let review = state
        .store
        .create_review(NewReview {
            spot_id,
            user_id: user.id,
            fields,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => already_reviewed(),
            other => ApiError::from(other),
        })?;

    tracing::info!("User {} reviewed spot {}", user.id, spot_id);
    Ok(ApiResponse::created(review))
}

/// POST /reviews/:id/images - attach an image to the caller's review
pub async fn review_image_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ImagePayload>,
) -> ApiResult<ReviewImageView> {
    let review_id = parse_id(&id, ApiError::review_not_found)?;
    services::authored_review(&*state.store, review_id, &user).await?;

    let image = payload.validate()?;

    let max_images = config::config().api.max_review_images;
    let image = state
        .store
        .create_image(
            NewImage {
                owner: Imageable::Review(review_id),
                url: image.url,
                preview_image: image.preview_image,
            },
            Some(max_images),
        )
        .await
        .map_err(|e| match e {
            DatabaseError::ImageLimit(..) => {
                ApiError::forbidden("Maximum number of images for this resource was reached")
            }
            DatabaseError::OwnerMissing(..) => ApiError::review_not_found(),
            other => ApiError::from(other),
        })?;
    Ok(ApiResponse::success(ReviewImageView::from(&image)))
}

/// PUT /reviews/:id - replace review text and stars
pub async fn review_update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ReviewPayload>,
) -> ApiResult<Review> {
    let review_id = parse_id(&id, ApiError::review_not_found)?;
    services::authored_review(&*state.store, review_id, &user).await?;

    let fields = payload.validate()?;
    let review = state
        .store
        .update_review(review_id, fields)
        .await?
        .ok_or_else(ApiError::review_not_found)?;
    Ok(ApiResponse::success(review))
}

/// DELETE /reviews/:id - remove a review and its images
pub async fn review_delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<Value> {
    let review_id = parse_id(&id, ApiError::review_not_found)?;
    services::authored_review(&*state.store, review_id, &user).await?;

    if !state.store.delete_review(review_id).await? {
        return Err(ApiError::review_not_found());
    }

    tracing::info!("User {} deleted review {}", user.id, review_id);
    Ok(ApiResponse::deleted())
}
