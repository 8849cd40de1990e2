// services/mod.rs - Lookups shared by several handlers
//
// Ownership checks and the assembly of nested response views live here so the
// handlers stay a thin layer over request parsing.

pub mod review_service;
pub mod spot_service;

pub use review_service::{authored_review, review_views};
pub use spot_service::{existing_spot, owned_spot, spot_details};
