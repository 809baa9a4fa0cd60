use actix_web::web;

use super::handlers::{contact_link, health_check};

pub fn util_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/health_check", web::get().to(health_check))
        .route("/contact", web::get().to(contact_link));
}
