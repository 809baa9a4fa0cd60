pub mod errors;
pub(crate) mod handlers;
mod routes;
pub mod schemas;
pub mod utils;

pub use routes::admin_user_route;
