pub mod db;
pub mod server;
pub mod spots;
pub mod user;
