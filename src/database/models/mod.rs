pub mod booking;
pub mod image;
pub mod review;
pub mod spot;
pub mod user;

pub use booking::{Booking, DateRange, NewBooking};
pub use image::{Image, Imageable, NewImage};
pub use review::{NewReview, Review, ReviewFields, ReviewFilter};
pub use spot::{RatingAggregate, Spot, SpotFields, SpotFilter, SpotListing};
pub use user::{NewUser, User};
