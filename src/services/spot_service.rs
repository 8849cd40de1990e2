use crate::api::format::SpotDetailsView;
use crate::database::models::{Imageable, Spot};
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Load a spot or fail with the standard spot 404
pub async fn existing_spot(store: &dyn Store, spot_id: i32) -> Result<Spot, ApiError> {
    store.find_spot(spot_id).await?.ok_or_else(ApiError::spot_not_found)
}

/// Load a spot the caller owns. A spot owned by someone else is reported
/// exactly like a missing one.
pub async fn owned_spot(store: &dyn Store, spot_id: i32, user: &CurrentUser) -> Result<Spot, ApiError> {
    let spot = existing_spot(store, spot_id).await?;
    if spot.owner_id != user.id {
        tracing::debug!("User {} is not the owner of spot {}", user.id, spot_id);
        return Err(ApiError::spot_not_found());
    }
    Ok(spot)
}

/// Spot with its rating aggregate, images and owner
pub async fn spot_details(store: &dyn Store, spot: Spot) -> Result<SpotDetailsView, ApiError> {
    let (rating, images, owner) = futures::try_join!(
        store.spot_rating(spot.id),
        store.list_images(Imageable::Spot(spot.id)),
        store.find_user(spot.owner_id),
    )?;

    if owner.is_none() {
        tracing::warn!("Spot {} refers to missing owner {}", spot.id, spot.owner_id);
    }

    Ok(SpotDetailsView::new(spot, rating, &images, owner.as_ref()))
}
