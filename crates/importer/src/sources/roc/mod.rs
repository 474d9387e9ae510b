mod client;
mod models;

pub use client::{DEFAULT_BASE_URL, RocClient};
pub use models::parse_punches;
