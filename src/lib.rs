pub mod commands;
pub mod configuration;
pub mod constants;
pub mod database;
pub mod domain;
pub mod errors;
pub mod general_utils;
pub mod identity_client;
pub mod openapi;
pub mod routes;
pub mod schemas;
pub mod startup;
pub mod storage_client;
pub mod telemetry;
mod tests;
