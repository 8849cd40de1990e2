use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::image::ImageRow;
use super::models::{
    Booking, DateRange, Image, Imageable, NewBooking, NewImage, NewReview, NewUser, RatingAggregate, Review,
    ReviewFields, ReviewFilter, Spot, SpotFields, SpotFilter, SpotListing, User,
};
use super::store::Store;

const SPOT_COLUMNS: &str = "s.id, s.owner_id, s.address, s.city, s.state, s.country, s.lat, s.lng, \
                            s.name, s.description, s.price, s.created_at, s.updated_at";

/// `Store` backed by PostgreSQL; constraints live in `migrations/`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Row-locks the record an image is attached to, spot before review, so
    /// the caller's insert cannot interleave with a delete or another upload
    async fn lock_image_owner(conn: &mut PgConnection, owner: Imageable) -> Result<(), DatabaseError> {
        let missing = || DatabaseError::OwnerMissing(owner.kind(), owner.id());

        match owner {
            Imageable::Spot(spot_id) => {
                sqlx::query_scalar::<_, i32>("SELECT id FROM spots WHERE id = $1 FOR UPDATE")
                    .bind(spot_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(missing)?;
            }
            Imageable::Review(review_id) => {
                let spot_id = sqlx::query_scalar::<_, i32>("SELECT spot_id FROM reviews WHERE id = $1")
                    .bind(review_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(missing)?;
                sqlx::query_scalar::<_, i32>("SELECT id FROM spots WHERE id = $1 FOR KEY SHARE")
                    .bind(spot_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(missing)?;
                sqlx::query_scalar::<_, i32>("SELECT id FROM reviews WHERE id = $1 FOR UPDATE")
                    .bind(review_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(missing)?;
            }
        }
        Ok(())
    }

    fn into_images(rows: Vec<ImageRow>) -> Result<Vec<Image>, DatabaseError> {
        rows.into_iter()
            .map(|row| Image::try_from(row).map_err(|msg| DatabaseError::Sqlx(sqlx::Error::Decode(msg.into()))))
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (first_name, last_name, email, hashed_password)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[i32]) -> Result<Vec<User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1) ORDER BY id")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list_spots(&self, filter: SpotFilter) -> Result<Vec<SpotListing>, DatabaseError> {
        let sql = format!(
            "SELECT {SPOT_COLUMNS},
                (SELECT AVG(r.stars)::float8 FROM reviews r WHERE r.spot_id = s.id) AS avg_rating,
                (SELECT i.url FROM images i
                  WHERE i.imageable_type = 'Spot' AND i.imageable_id = s.id AND i.preview_image
                  ORDER BY i.id DESC LIMIT 1) AS preview_image
             FROM spots s
             WHERE ($1::int IS NULL OR s.owner_id = $1)
             ORDER BY s.id
             LIMIT $2 OFFSET $3"
        );

        let listings = sqlx::query_as::<_, SpotListing>(&sql)
            .bind(filter.owner_id)
            .bind(filter.pagination.map(|p| p.limit))
            .bind(filter.pagination.map(|p| p.offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(listings)
    }

    async fn find_spot(&self, id: i32) -> Result<Option<Spot>, DatabaseError> {
        let spot = sqlx::query_as::<_, Spot>("SELECT * FROM spots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(spot)
    }

    async fn spot_rating(&self, spot_id: i32) -> Result<RatingAggregate, DatabaseError> {
        let rating = sqlx::query_as::<_, RatingAggregate>(
            "SELECT AVG(stars)::float8 AS avg_rating, COUNT(*) AS num_reviews
             FROM reviews WHERE spot_id = $1",
        )
        .bind(spot_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn preview_image_url(&self, spot_id: i32) -> Result<Option<String>, DatabaseError> {
        let url = sqlx::query_scalar::<_, String>(
            "SELECT url FROM images
             WHERE imageable_type = 'Spot' AND imageable_id = $1 AND preview_image
             ORDER BY id DESC LIMIT 1",
        )
        .bind(spot_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(url)
    }

    async fn create_spot(&self, owner_id: i32, fields: SpotFields) -> Result<Spot, DatabaseError> {
        let spot = sqlx::query_as::<_, Spot>(
            "INSERT INTO spots (owner_id, address, city, state, country, lat, lng, name, description, price)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(owner_id)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.country)
        .bind(fields.lat)
        .bind(fields.lng)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(spot)
    }

    async fn update_spot(&self, id: i32, fields: SpotFields) -> Result<Option<Spot>, DatabaseError> {
        let spot = sqlx::query_as::<_, Spot>(
            "UPDATE spots
             SET address = $2, city = $3, state = $4, country = $5, lat = $6, lng = $7,
                 name = $8, description = $9, price = $10, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.country)
        .bind(fields.lat)
        .bind(fields.lng)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .fetch_optional(&self.pool)
        .await?;
        Ok(spot)
    }

    async fn delete_spot(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Waits out any image insert holding the spot
        sqlx::query("SELECT id FROM spots WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM images
             WHERE imageable_type = 'Review'
               AND imageable_id IN (SELECT id FROM reviews WHERE spot_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM images WHERE imageable_type = 'Spot' AND imageable_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // reviews and bookings go with the spot via ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM spots WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    async fn create_image(&self, image: NewImage, limit: Option<i64>) -> Result<Image, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        Self::lock_image_owner(&mut *tx, image.owner).await?;

        if let Some(limit) = limit {
            let count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM images WHERE imageable_type = $1 AND imageable_id = $2",
            )
            .bind(image.owner.kind())
            .bind(image.owner.id())
            .fetch_one(&mut *tx)
            .await?;
            if count >= limit {
                return Err(DatabaseError::ImageLimit(image.owner.kind(), image.owner.id(), count));
            }
        }

        if image.preview_image {
            if let Imageable::Spot(spot_id) = image.owner {
                sqlx::query(
                    "UPDATE images SET preview_image = false, updated_at = now()
                     WHERE imageable_type = 'Spot' AND imageable_id = $1 AND preview_image",
                )
                .bind(spot_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let row = sqlx::query_as::<_, ImageRow>(
            "INSERT INTO images (imageable_type, imageable_id, url, preview_image)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(image.owner.kind())
        .bind(image.owner.id())
        .bind(&image.url)
        .bind(image.preview_image)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::into_images(vec![row])?
            .pop()
            .ok_or(DatabaseError::Sqlx(sqlx::Error::RowNotFound))
    }

    async fn list_images(&self, owner: Imageable) -> Result<Vec<Image>, DatabaseError> {
        let rows = sqlx::query_as::<_, ImageRow>(
            "SELECT * FROM images WHERE imageable_type = $1 AND imageable_id = $2 ORDER BY id",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .fetch_all(&self.pool)
        .await?;
        Self::into_images(rows)
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<Review>, DatabaseError> {
        let (sql, id) = match filter {
            ReviewFilter::Spot(spot_id) => ("SELECT * FROM reviews WHERE spot_id = $1 ORDER BY id", spot_id),
            ReviewFilter::Author(user_id) => ("SELECT * FROM reviews WHERE user_id = $1 ORDER BY id", user_id),
        };

        let reviews = sqlx::query_as::<_, Review>(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn find_review(&self, id: i32) -> Result<Option<Review>, DatabaseError> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn find_user_review(&self, user_id: i32, spot_id: i32) -> Result<Option<Review>, DatabaseError> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE user_id = $1 AND spot_id = $2")
            .bind(user_id)
            .bind(spot_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, DatabaseError> {
        // reviews_user_spot_key rejects a duplicate that races past the handler's check
        let created = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (spot_id, user_id, review, stars)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(review.spot_id)
        .bind(review.user_id)
        .bind(&review.fields.review)
        .bind(review.fields.stars)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_review(&self, id: i32, fields: ReviewFields) -> Result<Option<Review>, DatabaseError> {
        let review = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET review = $2, stars = $3, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&fields.review)
        .bind(fields.stars)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn delete_review(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM reviews WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM images WHERE imageable_type = 'Review' AND imageable_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_bookings(&self, spot_id: i32, user_id: Option<i32>) -> Result<Vec<Booking>, DatabaseError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE spot_id = $1 AND ($2::int IS NULL OR user_id = $2)
             ORDER BY start_date, id",
        )
        .bind(spot_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn find_conflicting_booking(&self, spot_id: i32, range: DateRange) -> Result<Option<Booking>, DatabaseError> {
        // Overlap of half-open ranges: existing.start < new.end AND new.start < existing.end
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE spot_id = $1 AND start_date < $3 AND $2 < end_date
             ORDER BY start_date
             LIMIT 1",
        )
        .bind(spot_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatabaseError> {
        // bookings_no_overlap (EXCLUDE USING gist) rejects any overlap with SQLSTATE 23P01
        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (spot_id, user_id, start_date, end_date)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(booking.spot_id)
        .bind(booking.user_id)
        .bind(booking.range.start())
        .bind(booking.range.end())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }
}
