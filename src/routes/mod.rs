pub mod admin_user;
pub mod auth;
pub mod bird;
pub mod media;
mod route;
pub mod util;

pub use route::main_route;
