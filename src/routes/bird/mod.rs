pub mod errors;
pub(crate) mod handlers;
mod models;
mod routes;
pub mod schemas;
pub(crate) mod utils;

pub use routes::{admin_bird_route, bird_route};
