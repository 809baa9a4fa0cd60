use actix_web::web;

use super::handlers::{bird_detail, create_bird, edit_bird, featured_birds, list_birds, remove_bird};

pub fn bird_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/list", web::get().to(list_birds))
        .route("/featured", web::get().to(featured_birds))
        .route("/{bird_id}", web::get().to(bird_detail));
}

/// Mounted under the admin scope, which carries the guard.
pub fn admin_bird_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/create", web::post().to(create_bird));
    cfg.service(
        web::resource("/{bird_id}")
            .route(web::put().to(edit_bird))
            .route(web::delete().to(remove_bird)),
    );
}
