use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections use the standard error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path ids that are not integers can never match a record
pub fn parse_id(raw: &str, not_found: fn() -> ApiError) -> Result<i32, ApiError> {
    raw.trim().parse::<i32>().map_err(|_| not_found())
}
