pub mod challenge;
pub mod errors;
pub mod form;
pub mod guard;
pub(crate) mod handlers;
pub mod middlewares;
mod models;
pub mod otp;
pub mod resolver;
mod routes;
pub mod schemas;
pub mod session;
pub mod utils;

pub use middlewares::{AdminContext, RequireAdmin};
pub use routes::auth_route;
