use actix_web::web;

use super::handlers::{delete_media, upload_media, upload_progress};

pub fn media_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload", web::post().to(upload_media))
        .route("/upload/{upload_id}", web::get().to(upload_progress))
        .route("/delete", web::post().to(delete_media));
}
