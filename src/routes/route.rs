use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::admin_user::admin_user_route;
use super::auth::{auth_route, RequireAdmin};
use super::bird::{admin_bird_route, bird_route};
use super::media::media_route;
use super::util::util_route;
use crate::openapi::ApiDoc;

pub fn main_route(cfg: &mut web::ServiceConfig) {
    let openapi = ApiDoc::openapi();
    cfg.service(web::scope("/util").configure(util_route))
        .service(web::scope("/bird").configure(bird_route))
        .service(web::scope("/auth").configure(auth_route))
        .service(
            web::scope("/admin")
                .wrap(RequireAdmin)
                .service(web::scope("/bird").configure(admin_bird_route))
                .service(web::scope("/media").configure(media_route))
                .service(web::scope("/user").configure(admin_user_route)),
        )
        .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", openapi));
}
