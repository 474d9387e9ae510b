pub mod handlers;
mod routes;
pub mod services;

pub use routes::routes;
