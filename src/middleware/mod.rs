pub mod auth;
pub mod response;

pub use auth::{clear_session_cookie, restore_user, set_session_cookie, CurrentUser};
pub use response::{ApiResponse, ApiResult};
