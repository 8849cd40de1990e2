pub mod extract;
pub mod format;
pub mod routes;
pub mod state;

pub use extract::{parse_id, AppJson};
pub use routes::app;
pub use state::AppState;
