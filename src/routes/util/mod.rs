pub(crate) mod handlers;
mod routes;
pub mod schemas;
#[cfg(test)]
mod tests;
pub mod utils;

pub use routes::util_route;
