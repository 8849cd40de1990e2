// handlers/protected/bookings.rs - Reserving spots
//
// Owners see every booking of their spot; everyone else sees only their own.

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::api::format::{BookingView, GuestBookingView, OwnerBookingView, UserSummary};
use crate::api::{parse_id, AppJson, AppState};
use crate::database::models::{Booking, NewBooking};
use crate::database::DatabaseError;
use crate::error::{ApiError, FieldErrors};
use crate::handlers::payload::BookingPayload;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services;

fn booking_conflict() -> ApiError {
    let mut errors = FieldErrors::new();
    errors.insert("startDate".to_string(), "Start date conflicts with an existing booking".to_string());
    errors.insert("endDate".to_string(), "End date conflicts with an existing booking".to_string());
    ApiError::forbidden_with("Sorry, this spot is already booked for the specified dates", errors)
}

/// GET /spots/:id/bookings
pub async fn spot_bookings_list(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<Value> {
    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    let spot = services::existing_spot(&*state.store, spot_id).await?;

    let bookings: Vec<BookingView> = if spot.owner_id == user.id {
        state
            .store
            .list_bookings(spot_id, None)
            .await?
            .iter()
            .map(|b| BookingView::Owner(OwnerBookingView::from(b)))
            .collect()
    } else {
        let booker = UserSummary::from(&user);
        state
            .store
            .list_bookings(spot_id, Some(user.id))
            .await?
            .into_iter()
            .map(|booking| {
                BookingView::Guest(GuestBookingView {
                    booking,
                    user: booker.clone(),
                })
            })
            .collect()
    };

    Ok(ApiResponse::success(json!({ "Bookings": bookings })))
}

/// POST /spots/:id/bookings - reserve `[startDate, endDate)`
///
/// Dates are validated before the spot is looked up, so a bad range is a 400
/// even for a spot that does not exist.
pub async fn spot_booking_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<BookingPayload>,
) -> ApiResult<Booking> {
    let range = payload.validate()?;

    let spot_id = parse_id(&id, ApiError::spot_not_found)?;
    services::existing_spot(&*state.store, spot_id).await?;

    if let Some(existing) = state.store.find_conflicting_booking(spot_id, range).await? {
        tracing::debug!("Booking request on spot {} overlaps booking {}", spot_id, existing.id);
        return Err(booking_conflict());
    }

    let booking = state
        .store
        .create_booking(NewBooking {
            spot_id,
            user_id: user.id,
            range,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::ExclusionViolation(_) => booking_conflict(),
            other => ApiError::from(other),
        })?;

    tracing::info!("User {} booked spot {} ({} to {})", user.id, spot_id, range.start(), range.end());
    Ok(ApiResponse::created(booking))
}
