// handlers/protected/spots.rs - Spot management for the signed-in owner

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::api::format::ImageView;
use crate::api::{parse_id, AppJson, AppState};
use crate::database::models::{Imageable, NewImage, Spot, SpotFilter};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::payload::{ImagePayload, SpotPayload};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services;

/// GET /spots/current - spots owned by the caller, unpaginated
pub async fn spots_current(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Value> {
    let spots = state.store.list_spots(SpotFilter::owned_by(user.id)).await?;
    Ok(ApiResponse::success(json!({ "Spot": spots })))
}

/// POST /spots - create a spot owned by the caller
pub async fn spot_create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<SpotPayload>,
) -> ApiResult<Spot> {
    let fields = payload.validate()?;
    let spot = state.store.create_spot(user.id, fields).await?;
    tracing::info!("User {} created spot {}", user.id, spot.id);
    Ok(ApiResponse::created(spot))
}

/// PUT /spots/:id - replace a spot's attributes
pub async fn spot_update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<SpotPayload>,
) -> ApiResult<Spot> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    services::owned_spot(&*state.store, spot_id, &user).await?;

    let fields = payload.validate()?;
    let spot = state
        .store
        .update_spot(spot_id, fields)
        .await?
        .ok_or_else(ApiError::spot_not_found)?;
    Ok(ApiResponse::success(spot))
}

/// DELETE /spots/:id - remove a spot with its reviews, bookings and images
pub async fn spot_delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<Value> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    services::owned_spot(&*state.store, spot_id, &user).await?;

    if !state.store.delete_spot(spot_id).await? {
        return Err(ApiError::spot_not_found());
    }

    tracing::info!("User {} deleted spot {}", user.id, spot_id);
    Ok(ApiResponse::deleted())
}

/// POST /spots/:id/images - attach an image to an owned spot
pub async fn spot_image_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ImagePayload>,
) -> ApiResult<ImageView> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    services::owned_spot(&*state.store, spot_id, &user).await?;

    let image = payload.validate()?;
    let image = state
        .store
        .create_image(
            NewImage {
                owner: Imageable::Spot(spot_id),
                url: image.url,
                preview_image: image.preview_image,
            },
            None,
        )
        .await
        .map_err(|e| match e {
            DatabaseError::OwnerMissing(..) => ApiError::spot_not_found(),
            other => ApiError::from(other),
        })?;
    Ok(ApiResponse::success(ImageView::from(&image)))
}
