use actix_web::web;

use super::handlers::{grant_admin, list_admins};

pub fn admin_user_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/list", web::get().to(list_admins))
        .route("/grant", web::post().to(grant_admin));
}
