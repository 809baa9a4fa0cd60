use crate::helpers::spawn_app;

#[actix_web::test]
async fn new_session_starts_signed_out() {
    let app = spawn_app().await;
    let token = app.open_session().await;

    let response = app
        .api_client
        .get(format!("{}/auth/session", &app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Invalid session body");
    assert_eq!(body["data"]["loading"], false);
    assert!(body["data"]["identity"].is_null());
    assert_eq!(body["data"]["is_admin"], false);
}

#[actix_web::test]
async fn guard_redirects_anonymous_visitors_to_login() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/auth/guard", &app.address))
        .query(&[("path", "/admin/birds")])
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Invalid guard body");
    assert_eq!(body["data"]["action"], "redirect");
    assert_eq!(body["data"]["target"], "/admin/login");
}

#[actix_web::test]
async fn guard_renders_public_pages() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/auth/guard", &app.address))
        .query(&[("path", "/birds")])
        .send()
        .await
        .expect("Failed to execute request.");

    let body: serde_json::Value = response.json().await.expect("Invalid guard body");
    assert_eq!(body["data"]["action"], "render");
}

#[actix_web::test]
async fn admin_scope_rejects_signed_out_sessions() {
    let app = spawn_app().await;
    let token = app.open_session().await;

    let anonymous = app
        .api_client
        .get(format!("{}/admin/user/list", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(anonymous.status().as_u16(), 401);

    let signed_out = app
        .api_client
        .get(format!("{}/admin/user/list", &app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(signed_out.status().as_u16(), 401);
    let body: serde_json::Value = signed_out.json().await.expect("Invalid error body");
    assert_eq!(body["data"]["redirect_to"], "/admin/login");
}
