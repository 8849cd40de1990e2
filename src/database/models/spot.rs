use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::Pagination;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: i32,
    pub owner_id: i32,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, caller-editable spot attributes
#[derive(Debug, Clone, PartialEq)]
pub struct SpotFields {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// Spot row annotated with its review average and preview image url
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SpotListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub spot: Spot,
    pub avg_rating: Option<f64>,
    pub preview_image: Option<String>,
}

/// AVG/COUNT over a spot's reviews; `avg_rating` is None when there are none
#[derive(Debug, Clone, Copy, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub avg_rating: Option<f64>,
    pub num_reviews: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpotFilter {
    pub owner_id: Option<i32>,
    pub pagination: Option<Pagination>,
}

impl SpotFilter {
    pub fn owned_by(owner_id: i32) -> Self {
        Self {
            owner_id: Some(owner_id),
            pagination: None,
        }
    }

    pub fn paginated(pagination: Option<Pagination>) -> Self {
        Self {
            owner_id: None,
            pagination,
        }
    }
}
