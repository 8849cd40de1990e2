// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every handler here takes a `CurrentUser` argument, so a request without a
// valid session is answered with 401 before the handler body runs.
//
// Security Level: Signed-in user
// Ownership: owner-only mutations answer 404 for records the caller does not own

pub mod bookings;
pub mod reviews;
pub mod spots;

pub use bookings::{spot_booking_create, spot_bookings_list};
pub use reviews::{review_delete, review_image_create, review_update, reviews_current, spot_review_create};
pub use spots::{spot_create, spot_delete, spot_image_create, spot_update, spots_current};
