use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub spot_id: i32,
    pub review: String,
    pub stars: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFields {
    pub review: String,
    pub stars: i32,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub spot_id: i32,
    pub user_id: i32,
    pub fields: ReviewFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
    Spot(i32),
    Author(i32),
}
