use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{
    Booking, DateRange, Image, Imageable, NewBooking, NewImage, NewReview, NewUser, RatingAggregate, Review,
    ReviewFields, ReviewFilter, Spot, SpotFields, SpotFilter, SpotListing, User,
};

/// Persistence operations behind every handler.
///
/// Implementations must enforce two rules atomically, independent of any
/// checks a handler performs first:
/// - one review per (user, spot): `create_review` fails with `UniqueViolation`
/// - no overlapping bookings per spot: `create_booking` fails with `ExclusionViolation`
///
/// Deleting a spot or review also removes everything attached to it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Users
    /// Fails with `UniqueViolation` when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn find_user(&self, id: i32) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_users(&self, ids: &[i32]) -> Result<Vec<User>, DatabaseError>;

    // Spots
    /// Ordered by id (creation order)
    async fn list_spots(&self, filter: SpotFilter) -> Result<Vec<SpotListing>, DatabaseError>;
    async fn find_spot(&self, id: i32) -> Result<Option<Spot>, DatabaseError>;
    async fn spot_rating(&self, spot_id: i32) -> Result<RatingAggregate, DatabaseError>;
    async fn preview_image_url(&self, spot_id: i32) -> Result<Option<String>, DatabaseError>;
    async fn create_spot(&self, owner_id: i32, fields: SpotFields) -> Result<Spot, DatabaseError>;
    async fn update_spot(&self, id: i32, fields: SpotFields) -> Result<Option<Spot>, DatabaseError>;
    /// Returns false when nothing was deleted
    async fn delete_spot(&self, id: i32) -> Result<bool, DatabaseError>;

    // Images
    /// A new preview image on a spot clears the flag on its other images.
    ///
    /// The owner check, the `limit` check and the insert are one atomic step:
    /// fails with `OwnerMissing` when the owner is gone, or `ImageLimit` when
    /// it already has `limit` images.
    async fn create_image(&self, image: NewImage, limit: Option<i64>) -> Result<Image, DatabaseError>;
    async fn list_images(&self, owner: Imageable) -> Result<Vec<Image>, DatabaseError>;

    // Reviews
    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>, DatabaseError>;
    async fn find_review(&self, id: i32) -> Result<Option<Review>, DatabaseError>;
    async fn find_user_review(&self, user_id: i32, spot_id: i32) -> Result<Option<Review>, DatabaseError>;
    async fn create_review(&self, review: NewReview) -> Result<Review, DatabaseError>;
    async fn update_review(&self, id: i32, fields: ReviewFields) -> Result<Option<Review>, DatabaseError>;
    async fn delete_review(&self, id: i32) -> Result<bool, DatabaseError>;

    // Bookings
    /// All bookings for a spot, or only `user_id`'s when given
    async fn list_bookings(&self, spot_id: i32, user_id: Option<i32>) -> Result<Vec<Booking>, DatabaseError>;
    async fn find_conflicting_booking(&self, spot_id: i32, range: DateRange) -> Result<Option<Booking>, DatabaseError>;
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError>;
}
