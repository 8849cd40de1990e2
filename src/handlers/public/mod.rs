// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Browsing spots and their reviews, plus the session endpoints that hand out
// credentials. `GET /session` reads the optional `CurrentUser` but never rejects.
//
// Security Level: None
// Middleware: restore_user (runs on every route, never rejects)

pub mod root;
pub mod session;
pub mod spots;

pub use root::{health, root};
pub use session::{login, logout, restore, signup};
pub use spots::{spot_reviews_list, spot_show, spots_list};
