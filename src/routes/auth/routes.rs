use actix_web::web;

use super::handlers::{
    confirm_code, create_session, fetch_session, guard_decision, issue_challenge,
    mount_login_form, reset_login_form, send_code, sign_out, unmount_login_form,
};

pub fn auth_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/session")
            .route(web::post().to(create_session))
            .route(web::get().to(fetch_session)),
    );
    cfg.service(web::resource("/signout").route(web::post().to(sign_out)));
    cfg.service(web::resource("/guard").route(web::get().to(guard_decision)));
    cfg.service(web::resource("/login/form").route(web::post().to(mount_login_form)));
    cfg.service(
        web::resource("/login/form/{form_id}").route(web::delete().to(unmount_login_form)),
    );
    cfg.service(
        web::resource("/login/form/{form_id}/challenge").route(web::post().to(issue_challenge)),
    );
    cfg.service(web::resource("/login/form/{form_id}/send").route(web::post().to(send_code)));
    cfg.service(
        web::resource("/login/form/{form_id}/confirm").route(web::post().to(confirm_code)),
    );
    cfg.service(
        web::resource("/login/form/{form_id}/reset").route(web::post().to(reset_login_form)),
    );
}
