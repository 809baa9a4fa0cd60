use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use uuid::Uuid;

use super::challenge::ChallengeAnchor;
use super::errors::{AuthError, OtpError};
use super::guard::{decide, AuthSnapshot, GuardDecision, RouteKind};
use super::middlewares::SessionContext;
use super::schemas::{
    ChallengeWidgetData, ConfirmCodeRequest, GuardQuery, LoginFormData, MountLoginFormData,
    MountLoginFormRequest, SendCodeRequest, SessionData, SessionTokenData, SignInData,
};
use super::session::SessionHub;
use crate::configuration::{AuthSettings, SecretSetting};
use crate::constants::SESSION_COOKIE_NAME;
use crate::general_utils::generate_jwt_token_for_session;
use crate::identity_client::IdentityProvider;
use crate::schemas::{EmptyGenericResponse, GenericResponse};

#[utoipa::path(
    post,
    path = "/auth/session",
    tag = "Auth Session API",
    responses(
        (status=200, description= "Anonymous session created", body= GenericResponse<SessionTokenData>),
    )
)]
#[tracing::instrument(err, name = "Create session", skip(hub, secret))]
pub async fn create_session(
    hub: web::Data<SessionHub>,
    secret: web::Data<SecretSetting>,
) -> Result<HttpResponse, AuthError> {
    let session = hub.open();
    let token =
        generate_jwt_token_for_session(session.id(), session.expires_at(), &secret.jwt.secret)?;
    let cookie = Cookie::build(SESSION_COOKIE_NAME, token.expose_secret().to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(GenericResponse::success(
        "Session created",
        Some(SessionTokenData {
            session_id: session.id(),
            token: token.expose_secret().to_string(),
            expires_at: session.expires_at(),
        }),
    )))
}

#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "Auth Session API",
    responses(
        (status=200, description= "Current authentication state", body= GenericResponse<SessionData>),
    )
)]
#[tracing::instrument(name = "Fetch session", skip(session, auth_settings))]
pub async fn fetch_session(
    session: SessionContext,
    auth_settings: web::Data<AuthSettings>,
) -> Result<web::Json<GenericResponse<SessionData>>, AuthError> {
    let snapshot = session
        .0
        .settled(auth_settings.guard_wait())
        .await
        .unwrap_or_else(|pending| pending);
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched session",
        Some(SessionData::from(&snapshot)),
    )))
}

#[utoipa::path(
    post,
    path = "/auth/signout",
    tag = "Auth Session API",
    responses(
        (status=200, description= "Signed out", body= GenericResponse<SessionData>),
    )
)]
#[tracing::instrument(name = "Sign out", skip(session, auth_settings))]
pub async fn sign_out(
    session: SessionContext,
    auth_settings: web::Data<AuthSettings>,
) -> Result<web::Json<GenericResponse<SessionData>>, AuthError> {
    session.0.sign_out();
    let snapshot = session
        .0
        .settled(auth_settings.guard_wait())
        .await
        .unwrap_or_else(|pending| pending);
    Ok(web::Json(GenericResponse::success(
        "Signed out",
        Some(SessionData::from(&snapshot)),
    )))
}

#[utoipa::path(
    get,
    path = "/auth/guard",
    tag = "Auth Session API",
    params(GuardQuery),
    responses(
        (status=200, description= "Guard decision for a page", body= GenericResponse<GuardDecision>),
    )
)]
#[tracing::instrument(name = "Guard decision", skip(session, auth_settings))]
pub async fn guard_decision(
    query: web::Query<GuardQuery>,
    session: Option<SessionContext>,
    auth_settings: web::Data<AuthSettings>,
) -> Result<web::Json<GenericResponse<GuardDecision>>, AuthError> {
    let snapshot = match session {
        Some(session) => session
            .0
            .settled(auth_settings.guard_wait())
            .await
            .unwrap_or_else(|pending| pending),
        None => AuthSnapshot::signed_out(0),
    };
    let decision = decide(RouteKind::classify(&query.path), &snapshot);
    Ok(web::Json(GenericResponse::success(
        "Guard decision",
        Some(decision),
    )))
}

#[utoipa::path(
    post,
    path = "/auth/login/form",
    tag = "Admin Login API",
    request_body(content = MountLoginFormRequest, description = "Request Body"),
    responses(
        (status=200, description= "Login form mounted, or where to go instead", body= GenericResponse<MountLoginFormData>),
    )
)]
#[tracing::instrument(name = "Mount login form", skip(session, hub, auth_settings))]
pub async fn mount_login_form(
    body: web::Json<MountLoginFormRequest>,
    session: SessionContext,
    hub: web::Data<SessionHub>,
    auth_settings: web::Data<AuthSettings>,
) -> Result<web::Json<GenericResponse<MountLoginFormData>>, OtpError> {
    let snapshot = session
        .0
        .settled(auth_settings.guard_wait())
        .await
        .unwrap_or_else(|pending| pending);
    let decision = decide(RouteKind::Login, &snapshot);
    if decision != GuardDecision::Render {
        return Ok(web::Json(GenericResponse::success(
            "Login form not mounted",
            Some(MountLoginFormData {
                decision,
                form: None,
            }),
        )));
    }

    let anchor = ChallengeAnchor::new(body.0.container_id);
    let (_, slot) = session
        .0
        .mount_form(anchor, auth_settings.otp_timeout(), hub.issuer().as_ref());
    let form = slot.try_lock()?;
    Ok(web::Json(GenericResponse::success(
        "Login form mounted",
        Some(MountLoginFormData {
            decision,
            form: Some(LoginFormData::from(&*form)),
        }),
    )))
}

#[utoipa::path(
    delete,
    path = "/auth/login/form/{form_id}",
    tag = "Admin Login API",
    params(("form_id" = Uuid, Path, description = "Login form id")),
    responses(
        (status=200, description= "Login form unmounted", body= EmptyGenericResponse),
    )
)]
#[tracing::instrument(name = "Unmount login form", skip(session, hub))]
pub async fn unmount_login_form(
    form_id: web::Path<Uuid>,
    session: SessionContext,
    hub: web::Data<SessionHub>,
) -> Result<web::Json<GenericResponse<()>>, OtpError> {
    if !session.0.unmount_form(&form_id, hub.issuer().as_ref()) {
        return Err(OtpError::FormNotFound);
    }
    Ok(web::Json(GenericResponse::success(
        "Login form unmounted",
        Some(()),
    )))
}

#[utoipa::path(
    post,
    path = "/auth/login/form/{form_id}/challenge",
    tag = "Admin Login API",
    params(("form_id" = Uuid, Path, description = "Login form id")),
    responses(
        (status=200, description= "Challenge widget for the form", body= GenericResponse<ChallengeWidgetData>),
    )
)]
#[tracing::instrument(err, name = "Issue challenge", skip(session, hub))]
pub async fn issue_challenge(
    form_id: web::Path<Uuid>,
    session: SessionContext,
    hub: web::Data<SessionHub>,
) -> Result<web::Json<GenericResponse<ChallengeWidgetData>>, OtpError> {
    let slot = session.0.form(&form_id).ok_or(OtpError::FormNotFound)?;
    let mut form = slot.try_lock()?;
    let handle = form.challenge(hub.issuer().as_ref())?;
    Ok(web::Json(GenericResponse::success(
        "Challenge ready",
        Some(ChallengeWidgetData::from(&*handle)),
    )))
}

#[utoipa::path(
    post,
    path = "/auth/login/form/{form_id}/send",
    tag = "Admin Login API",
    params(("form_id" = Uuid, Path, description = "Login form id")),
    request_body(content = SendCodeRequest, description = "Request Body"),
    responses(
        (status=200, description= "Code sent", body= GenericResponse<LoginFormData>),
    )
)]
#[tracing::instrument(err, name = "Send OTP", skip(session, hub, provider, body))]
pub async fn send_code(
    form_id: web::Path<Uuid>,
    body: web::Json<SendCodeRequest>,
    session: SessionContext,
    hub: web::Data<SessionHub>,
    provider: web::Data<dyn IdentityProvider>,
) -> Result<web::Json<GenericResponse<LoginFormData>>, OtpError> {
    let slot = session.0.form(&form_id).ok_or(OtpError::FormNotFound)?;
    let mut form = slot.try_lock()?;
    let issuer = hub.issuer().as_ref();
    let result = form
        .send_code(
            &body.phone_number,
            body.challenge_response.as_deref(),
            issuer,
            provider.get_ref(),
        )
        .await
        .map(|_| ());
    if slot.is_detached() {
        form.unmount(issuer);
        return Err(OtpError::FormClosed);
    }
    result?;
    Ok(web::Json(GenericResponse::success(
        "OTP sent successfully",
        Some(LoginFormData::from(&*form)),
    )))
}

#[utoipa::path(
    post,
    path = "/auth/login/form/{form_id}/confirm",
    tag = "Admin Login API",
    params(("form_id" = Uuid, Path, description = "Login form id")),
    request_body(content = ConfirmCodeRequest, description = "Request Body"),
    responses(
        (status=200, description= "Signed in", body= GenericResponse<SignInData>),
    )
)]
#[tracing::instrument(err, name = "Confirm OTP", skip(session, hub, provider, body, auth_settings))]
pub async fn confirm_code(
    form_id: web::Path<Uuid>,
    body: web::Json<ConfirmCodeRequest>,
    session: SessionContext,
    hub: web::Data<SessionHub>,
    provider: web::Data<dyn IdentityProvider>,
    auth_settings: web::Data<AuthSettings>,
) -> Result<web::Json<GenericResponse<SignInData>>, OtpError> {
    let slot = session.0.form(&form_id).ok_or(OtpError::FormNotFound)?;
    let identity = {
        let mut form = slot.try_lock()?;
        let result = form.confirm_code(&body.code, provider.get_ref()).await;
        if slot.is_detached() {
            form.unmount(hub.issuer().as_ref());
            return Err(OtpError::FormClosed);
        }
        result?
    };

    session.0.sign_in(identity);
    let snapshot = session
        .0
        .settled(auth_settings.guard_wait())
        .await
        .unwrap_or_else(|pending| pending);
    let decision = decide(RouteKind::Login, &snapshot);
    Ok(web::Json(GenericResponse::success(
        "Successfully signed in",
        Some(SignInData {
            session: SessionData::from(&snapshot),
            decision,
        }),
    )))
}

#[utoipa::path(
    post,
    path = "/auth/login/form/{form_id}/reset",
    tag = "Admin Login API",
    params(("form_id" = Uuid, Path, description = "Login form id")),
    responses(
        (status=200, description= "Form back to phone entry", body= GenericResponse<LoginFormData>),
    )
)]
#[tracing::instrument(name = "Reset login form", skip(session))]
pub async fn reset_login_form(
    form_id: web::Path<Uuid>,
    session: SessionContext,
) -> Result<web::Json<GenericResponse<LoginFormData>>, OtpError> {
    let slot = session.0.form(&form_id).ok_or(OtpError::FormNotFound)?;
    let mut form = slot.try_lock()?;
    form.reset();
    Ok(web::Json(GenericResponse::success(
        "Login form reset",
        Some(LoginFormData::from(&*form)),
    )))
}
