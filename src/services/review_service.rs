use std::collections::HashMap;

use futures::future::try_join_all;

use crate::api::format::{ReviewImageView, ReviewSpotView, ReviewView, UserSummary};
use crate::database::models::{Imageable, Review};
use crate::database::{DatabaseError, Store};
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Load a review the caller wrote. Someone else's review is reported exactly
/// like a missing one.
pub async fn authored_review(store: &dyn Store, review_id: i32, user: &CurrentUser) -> Result<Review, ApiError> {
    let review = store.find_review(review_id).await?.ok_or_else(ApiError::review_not_found)?;
    if review.user_id != user.id {
        tracing::debug!("User {} is not the author of review {}", user.id, review_id);
        return Err(ApiError::review_not_found());
    }
    Ok(review)
}

/// Attach author, images and (optionally) a spot summary to each review
pub async fn review_views(store: &dyn Store, reviews: Vec<Review>, with_spot: bool) -> Result<Vec<ReviewView>, ApiError> {
    let mut author_ids: Vec<i32> = reviews.iter().map(|r| r.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i32, UserSummary> = store
        .find_users(&author_ids)
        .await?
        .iter()
        .map(|user| (user.id, UserSummary::from(user)))
        .collect();

    let spots = if with_spot {
        let mut spot_ids: Vec<i32> = reviews.iter().map(|r| r.spot_id).collect();
        spot_ids.sort_unstable();
        spot_ids.dedup();
        spot_summaries(store, &spot_ids).await?
    } else {
        HashMap::new()
    };

    let images = try_join_all(reviews.iter().map(|r| store.list_images(Imageable::Review(r.id)))).await?;

    Ok(reviews
        .into_iter()
        .zip(images)
        .map(|(review, images)| ReviewView {
            user: authors.get(&review.user_id).cloned(),
            spot: spots.get(&review.spot_id).cloned(),
            images: images.iter().map(ReviewImageView::from).collect(),
            review,
        })
        .collect())
}

async fn spot_summaries(store: &dyn Store, spot_ids: &[i32]) -> Result<HashMap<i32, ReviewSpotView>, DatabaseError> {
    let loaded = try_join_all(spot_ids.iter().map(|&id| async move {
        let (spot, preview) = futures::try_join!(store.find_spot(id), store.preview_image_url(id))?;
        Ok::<_, DatabaseError>(spot.map(|spot| ReviewSpotView::new(spot, preview)))
    }))
    .await?;

    Ok(loaded.into_iter().flatten().map(|view| (view.id, view)).collect())
}
