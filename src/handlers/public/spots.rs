// handlers/public/spots.rs - Anonymous spot browsing

use axum::extract::{rejection::QueryRejection, Path, Query, State};
use serde_json::{json, Value};

use crate::api::format::SpotDetailsView;
use crate::api::{parse_id, AppState};
use crate::config;
use crate::database::models::{ReviewFilter, SpotFilter};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services;
use crate::types::PageQuery;

/// GET /spots - every spot with its average rating and preview image
///
/// `?page=&size=` paginate only when both are integers of at least 1;
/// anything else returns the full list.
pub async fn spots_list(State(state): State<AppState>, query: Result<Query<PageQuery>, QueryRejection>) -> ApiResult<Value> {
    let api = &config::config().api;
    let pagination = match query {
        Ok(Query(query)) => query.pagination(api.default_page, api.default_page_size),
        Err(rejection) => {
            tracing::debug!("Ignoring unparsable pagination query: {}", rejection);
            None
        }
    };

    let spots = state.store.list_spots(SpotFilter::paginated(pagination)).await?;
    Ok(ApiResponse::success(json!({ "Spot": spots })))
}

/// GET /spots/:id - one spot with rating aggregate, images and owner
pub async fn spot_show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SpotDetailsView> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    let spot = services::existing_spot(&*state.store, spot_id).await?;
    Ok(ApiResponse::success(services::spot_details(&*state.store, spot).await?))
}

/// GET /spots/:id/reviews - a spot's reviews with author and images
pub async fn spot_reviews_list(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    services::existing_spot(&*state.store, spot_id).await?;

    let reviews = state.store.list_reviews(ReviewFilter::Spot(spot_id)).await?;
    let views = services::review_views(&*state.store, reviews, false).await?;
    Ok(ApiResponse::success(json!({ "Reviews": views })))
}
