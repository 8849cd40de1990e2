//! Response shapes. Field names are camelCase; nested associations use
//! capitalized keys (`User`, `Images`, `Spot`, `Owner`).

use chrono::NaiveDate;
use serde::Serialize;

use crate::database::models::{Booking, Image, RatingAggregate, Review, Spot, User};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl From<&crate::middleware::CurrentUser> for UserSummary {
    fn from(user: &crate::middleware::CurrentUser) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// `user` object returned by the session endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<crate::middleware::CurrentUser> for SessionUser {
    fn from(user: crate::middleware::CurrentUser) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotImageView {
    pub id: i32,
    pub url: String,
    pub preview_image: bool,
}

impl From<&Image> for SpotImageView {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id,
            url: image.url.clone(),
            preview_image: image.preview_image,
        }
    }
}

/// Full image record, including which record owns it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    pub id: i32,
    pub url: String,
    pub preview_image: bool,
    pub imageable_type: &'static str,
    pub imageable_id: i32,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id,
            url: image.url.clone(),
            preview_image: image.preview_image,
            imageable_type: image.owner.kind(),
            imageable_id: image.owner.id(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewImageView {
    pub id: i32,
    pub imageable_id: i32,
    pub url: String,
}

impl From<&Image> for ReviewImageView {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id,
            imageable_id: image.owner.id(),
            url: image.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetailsView {
    #[serde(flatten)]
    pub spot: Spot,
    pub num_reviews: i64,
    pub avg_rating: Option<f64>,
    #[serde(rename = "Images")]
    pub images: Vec<SpotImageView>,
    #[serde(rename = "Owner")]
    pub owner: Option<UserSummary>,
}

impl SpotDetailsView {
    pub fn new(spot: Spot, rating: RatingAggregate, images: &[Image], owner: Option<&User>) -> Self {
        Self {
            spot,
            num_reviews: rating.num_reviews,
            avg_rating: rating.avg_rating,
            images: images.iter().map(SpotImageView::from).collect(),
            owner: owner.map(UserSummary::from),
        }
    }
}

/// Spot summary embedded in a review listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSpotView {
    pub id: i32,
    pub owner_id: i32,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub price: f64,
    pub preview_image: Option<String>,
}

impl ReviewSpotView {
    pub fn new(spot: Spot, preview_image: Option<String>) -> Self {
        Self {
            id: spot.id,
            owner_id: spot.owner_id,
            address: spot.address,
            city: spot.city,
            state: spot.state,
            country: spot.country,
            lat: spot.lat,
            lng: spot.lng,
            name: spot.name,
            price: spot.price,
            preview_image,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "User")]
    pub user: Option<UserSummary>,
    #[serde(rename = "Spot", skip_serializing_if = "Option::is_none")]
    pub spot: Option<ReviewSpotView>,
    #[serde(rename = "Images")]
    pub images: Vec<ReviewImageView>,
}

/// What a spot owner sees for each booking of their spot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerBookingView {
    pub id: i32,
    pub spot_id: i32,
    pub user_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&Booking> for OwnerBookingView {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            spot_id: booking.spot_id,
            user_id: booking.user_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
        }
    }
}

/// A guest's own booking with the booker's identity
#[derive(Debug, Clone, Serialize)]
pub struct GuestBookingView {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "User")]
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BookingView {
    Owner(OwnerBookingView),
    Guest(GuestBookingView),
}
