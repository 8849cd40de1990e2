use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{
    Booking, DateRange, Image, Imageable, NewBooking, NewImage, NewReview, NewUser, RatingAggregate, Review,
    ReviewFields, ReviewFilter, Spot, SpotFields, SpotFilter, SpotListing, User,
};
use super::store::Store;

/// In-process `Store` for tests and `--memory` runs.
///
/// Every mutation holds the write lock for its whole check-then-write, which
/// gives the same guarantees as the PostgreSQL constraints.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    spots: BTreeMap<i32, Spot>,
    reviews: BTreeMap<i32, Review>,
    images: BTreeMap<i32, Image>,
    bookings: BTreeMap<i32, Booking>,
    sequence: Sequence,
}

#[derive(Default)]
struct Sequence {
    users: i32,
    spots: i32,
    reviews: i32,
    images: i32,
    bookings: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl Tables {
    fn preview_url(&self, spot_id: i32) -> Option<String> {
        self.images
            .values()
            .rev()
            .find(|img| img.owner == Imageable::Spot(spot_id) && img.preview_image)
            .map(|img| img.url.clone())
    }

    fn rating(&self, spot_id: i32) -> RatingAggregate {
        let stars: Vec<i32> = self
            .reviews
            .values()
            .filter(|r| r.spot_id == spot_id)
            .map(|r| r.stars)
            .collect();

        let num_reviews = stars.len() as i64;
        let avg_rating = (num_reviews > 0).then(|| stars.iter().map(|s| f64::from(*s)).sum::<f64>() / num_reviews as f64);

        RatingAggregate { avg_rating, num_reviews }
    }

    fn remove_images_of(&mut self, owner: Imageable) {
        self.images.retain(|_, img| img.owner != owner);
    }

    fn remove_review(&mut self, id: i32) -> bool {
        self.remove_images_of(Imageable::Review(id));
        self.reviews.remove(&id).is_some()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(DatabaseError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: next(&mut tables.sequence.users),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            hashed_password: user.hashed_password,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_users(&self, ids: &[i32]) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn list_spots(&self, filter: SpotFilter) -> Result<Vec<SpotListing>, DatabaseError> {
        let tables = self.tables.read().await;

        let matching = tables
            .spots
            .values()
            .filter(|s| filter.owner_id.map_or(true, |owner| s.owner_id == owner));

        let (skip, take) = match filter.pagination {
            Some(p) => (p.offset as usize, p.limit as usize),
            None => (0, usize::MAX),
        };

        Ok(matching
            .skip(skip)
            .take(take)
            .map(|spot| SpotListing {
                avg_rating: tables.rating(spot.id).avg_rating,
                preview_image: tables.preview_url(spot.id),
                spot: spot.clone(),
            })
            .collect())
    }

    async fn find_spot(&self, id: i32) -> Result<Option<Spot>, DatabaseError> {
        Ok(self.tables.read().await.spots.get(&id).cloned())
    }

    async fn spot_rating(&self, spot_id: i32) -> Result<RatingAggregate, DatabaseError> {
        Ok(self.tables.read().await.rating(spot_id))
    }

    async fn preview_image_url(&self, spot_id: i32) -> Result<Option<String>, DatabaseError> {
        Ok(self.tables.read().await.preview_url(spot_id))
    }

    async fn create_spot(&self, owner_id: i32, fields: SpotFields) -> Result<Spot, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let spot = Spot {
            id: next(&mut tables.sequence.spots),
            owner_id,
            address: fields.address,
            city: fields.city,
            state: fields.state,
            country: fields.country,
            lat: fields.lat,
            lng: fields.lng,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            created_at: now,
            updated_at: now,
        };
        tables.spots.insert(spot.id, spot.clone());
        Ok(spot)
    }

    async fn update_spot(&self, id: i32, fields: SpotFields) -> Result<Option<Spot>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(spot) = tables.spots.get_mut(&id) else {
            return Ok(None);
        };

        spot.address = fields.address;
        spot.city = fields.city;
        spot.state = fields.state;
        spot.country = fields.country;
        spot.lat = fields.lat;
        spot.lng = fields.lng;
        spot.name = fields.name;
        spot.description = fields.description;
        spot.price = fields.price;
        spot.updated_at = Utc::now();

        Ok(Some(spot.clone()))
    }

    async fn delete_spot(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.spots.remove(&id).is_none() {
            return Ok(false);
        }

        let review_ids: Vec<i32> = tables.reviews.values().filter(|r| r.spot_id == id).map(|r| r.id).collect();
        for review_id in review_ids {
            tables.remove_review(review_id);
        }
        tables.remove_images_of(Imageable::Spot(id));
        tables.bookings.retain(|_, b| b.spot_id != id);

        Ok(true)
    }

    async fn create_image(&self, image: NewImage, limit: Option<i64>) -> Result<Image, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let owner_exists = match image.owner {
            Imageable::Spot(id) => tables.spots.contains_key(&id),
            Imageable::Review(id) => tables.reviews.contains_key(&id),
        };
        if !owner_exists {
            return Err(DatabaseError::OwnerMissing(image.owner.kind(), image.owner.id()));
        }

        if let Some(limit) = limit {
            let count = tables.images.values().filter(|img| img.owner == image.owner).count() as i64;
            if count >= limit {
                return Err(DatabaseError::ImageLimit(image.owner.kind(), image.owner.id(), count));
            }
        }

        if image.preview_image && matches!(image.owner, Imageable::Spot(_)) {
            for existing in tables.images.values_mut().filter(|img| img.owner == image.owner) {
                if existing.preview_image {
                    existing.preview_image = false;
                    existing.updated_at = now;
                }
            }
        }

        let created = Image {
            id: next(&mut tables.sequence.images),
            owner: image.owner,
            url: image.url,
            preview_image: image.preview_image,
            created_at: now,
            updated_at: now,
        };
        tables.images.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_images(&self, owner: Imageable) -> Result<Vec<Image>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.images.values().filter(|img| img.owner == owner).cloned().collect())
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|r| match filter {
                ReviewFilter::Spot(spot_id) => r.spot_id == spot_id,
                ReviewFilter::Author(user_id) => r.user_id == user_id,
            })
            .cloned()
            .collect())
    }

    async fn find_review(&self, id: i32) -> Result<Option<Review>, DatabaseError> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn find_user_review(&self, user_id: i32, spot_id: i32) -> Result<Option<Review>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.spot_id == spot_id)
            .cloned())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables
            .reviews
            .values()
            .any(|r| r.user_id == review.user_id && r.spot_id == review.spot_id)
        {
            return Err(DatabaseError::UniqueViolation("reviews_user_spot_key".to_string()));
        }

        let now = Utc::now();
        let created = Review {
            id: next(&mut tables.sequence.reviews),
            user_id: review.user_id,
            spot_id: review.spot_id,
            review: review.fields.review,
            stars: review.fields.stars,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_review(&self, id: i32, fields: ReviewFields) -> Result<Option<Review>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(review) = tables.reviews.get_mut(&id) else {
            return Ok(None);
        };

        review.review = fields.review;
        review.stars = fields.stars;
        review.updated_at = Utc::now();
        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.remove_review(id))
    }

    async fn list_bookings(&self, spot_id: i32, user_id: Option<i32>) -> Result<Vec<Booking>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.spot_id == spot_id && user_id.map_or(true, |uid| b.user_id == uid))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.start_date, b.id));
        Ok(bookings)
    }

    async fn find_conflicting_booking(&self, spot_id: i32, range: DateRange) -> Result<Option<Booking>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.spot_id == spot_id && b.range().overlaps(&range))
            .min_by_key(|b| b.start_date)
            .cloned())
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables
            .bookings
            .values()
            .any(|b| b.spot_id == booking.spot_id && b.range().overlaps(&booking.range))
        {
            return Err(DatabaseError::ExclusionViolation("bookings_no_overlap".to_string()));
        }

        let now = Utc::now();
        let created = Booking {
            id: next(&mut tables.sequence.bookings),
            spot_id: booking.spot_id,
            user_id: booking.user_id,
            start_date: booking.range.start(),
            end_date: booking.range.end(),
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(created.id, created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fields(name: &str) -> SpotFields {
        SpotFields {
            address: "1 Main St".to_string(),
            city: "X".to_string(),
            state: "Y".to_string(),
            country: "Z".to_string(),
            lat: 0.0,
            lng: 0.0,
            name: name.to_string(),
            description: "Nice".to_string(),
            price: 100.0,
        }
    }

    fn range(start: &str, end: &str) -> DateRange {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        DateRange::new(parse(start), parse(end)).unwrap()
    }

    async fn seeded() -> (MemoryStore, User, Spot) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                first_name: "Demo".to_string(),
                last_name: "User".to_string(),
                email: "demo@example.com".to_string(),
                hashed_password: "x".to_string(),
            })
            .await
            .unwrap();
        let spot = store.create_spot(user.id, fields("Cabin")).await.unwrap();
        (store, user, spot)
    }

    #[tokio::test]
    async fn duplicate_review_is_a_unique_violation() {
        let (store, user, spot) = seeded().await;
        let new = NewReview {
            spot_id: spot.id,
            user_id: user.id,
            fields: ReviewFields { review: "Great".to_string(), stars: 5 },
        };

        store.create_review(new.clone()).await.unwrap();
        let err = store.create_review(new).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn overlapping_booking_is_an_exclusion_violation() {
        let (store, user, spot) = seeded().await;
        let book = |r| NewBooking { spot_id: spot.id, user_id: user.id, range: r };

        store.create_booking(book(range("2030-01-01", "2030-01-05"))).await.unwrap();
        store.create_booking(book(range("2030-01-05", "2030-01-07"))).await.unwrap();

        let err = store.create_booking(book(range("2030-01-04", "2030-01-06"))).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ExclusionViolation(_)));
    }

    #[tokio::test]
    async fn rating_is_none_without_reviews() {
        let (store, user, spot) = seeded().await;
        assert_eq!(
            store.spot_rating(spot.id).await.unwrap(),
            RatingAggregate { avg_rating: None, num_reviews: 0 }
        );

        store
            .create_review(NewReview {
                spot_id: spot.id,
                user_id: user.id,
                fields: ReviewFields { review: "Ok".to_string(), stars: 4 },
            })
            .await
            .unwrap();

        let rating = store.spot_rating(spot.id).await.unwrap();
        assert_eq!(rating.avg_rating, Some(4.0));
        assert_eq!(rating.num_reviews, 1);
    }

    #[tokio::test]
    async fn new_preview_replaces_previous_preview() {
        let (store, _, spot) = seeded().await;
        for url in ["a.png", "b.png"] {
            store
                .create_image(NewImage { owner: Imageable::Spot(spot.id), url: url.to_string(), preview_image: true }, None)
                .await
                .unwrap();
        }

        assert_eq!(store.preview_image_url(spot.id).await.unwrap().as_deref(), Some("b.png"));
        let previews = store
            .list_images(Imageable::Spot(spot.id))
            .await
            .unwrap()
            .into_iter()
            .filter(|img| img.preview_image)
            .count();
        assert_eq!(previews, 1);
    }

    #[tokio::test]
    async fn deleting_a_spot_cascades() {
        let (store, user, spot) = seeded().await;
        let review = store
            .create_review(NewReview {
                spot_id: spot.id,
                user_id: user.id,
                fields: ReviewFields { review: "Ok".to_string(), stars: 3 },
            })
            .await
            .unwrap();
        store
            .create_image(NewImage { owner: Imageable::Review(review.id), url: "r.png".to_string(), preview_image: false }, None)
            .await
            .unwrap();
        store
            .create_booking(NewBooking { spot_id: spot.id, user_id: user.id, range: range("2030-02-01", "2030-02-03") })
            .await
            .unwrap();

        assert!(store.delete_spot(spot.id).await.unwrap());
        assert!(!store.delete_spot(spot.id).await.unwrap());
        assert!(store.find_review(review.id).await.unwrap().is_none());
        assert!(store.list_images(Imageable::Review(review.id)).await.unwrap().is_empty());
        assert!(store.list_bookings(spot.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_respects_owner_and_pagination() {
        let (store, user, _) = seeded().await;
        store.create_spot(user.id, fields("Second")).await.unwrap();
        store.create_spot(user.id + 1, fields("Third")).await.unwrap();

        let page = store
            .list_spots(SpotFilter::paginated(Some(crate::types::Pagination { limit: 1, offset: 1 })))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].spot.name, "Second");

        let owned = store.list_spots(SpotFilter::owned_by(user.id)).await.unwrap();
        assert_eq!(owned.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_uploads_stop_at_the_image_limit() {
        let (store, user, spot) = seeded().await;
        let review = store
            .create_review(NewReview {
                spot_id: spot.id,
                user_id: user.id,
                fields: ReviewFields { review: "Ok".to_string(), stars: 5 },
            })
            .await
            .unwrap();

        let store = std::sync::Arc::new(store);
        let uploads: Vec<_> = (0..25)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    let image = NewImage { owner: Imageable::Review(review.id), url: format!("{n}.png"), preview_image: false };
                    store.create_image(image, Some(10)).await
                })
            })
            .collect();

        let mut created = 0;
        for upload in uploads {
            match upload.await.unwrap() {
                Ok(_) => created += 1,
                Err(DatabaseError::ImageLimit(..)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 10);
        assert_eq!(store.list_images(Imageable::Review(review.id)).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn images_need_a_live_owner() {
        let (store, _, spot) = seeded().await;
        assert!(store.delete_spot(spot.id).await.unwrap());

        let err = store
            .create_image(NewImage { owner: Imageable::Spot(spot.id), url: "late.png".to_string(), preview_image: true }, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::OwnerMissing("Spot", id) if id == spot.id));
        assert!(store.list_images(Imageable::Spot(spot.id)).await.unwrap().is_empty());
    }
}
