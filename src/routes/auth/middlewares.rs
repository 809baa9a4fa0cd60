use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use anyhow::anyhow;
use futures::future::LocalBoxFuture;

use super::errors::AuthError;
use super::guard::{decide, AuthSnapshot, GuardDecision, RouteKind};
use super::schemas::UserProfile;
use super::session::{Session, SessionHub};
use crate::configuration::{AuthSettings, SecretSetting};
use crate::errors::GenericError;
use crate::general_utils::{decode_token, get_session_token};
use crate::identity_client::Identity;

fn lookup_session(req: &HttpRequest) -> Result<Arc<Session>, AuthError> {
    let hub = req
        .app_data::<web::Data<SessionHub>>()
        .ok_or_else(|| AuthError::UnexpectedError(anyhow!("Session hub is not configured")))?;
    let secret = req
        .app_data::<web::Data<SecretSetting>>()
        .ok_or_else(|| AuthError::UnexpectedError(anyhow!("JWT secret is not configured")))?;
    let token = get_session_token(req).ok_or(AuthError::SessionNotFound)?;
    let session_id =
        decode_token(token, &secret.jwt.secret).map_err(|e| AuthError::InvalidJWT(e.to_string()))?;
    hub.get(&session_id).ok_or(AuthError::SessionNotFound)
}

/// The caller's browser session, resolved from the session token.
#[derive(Clone)]
pub struct SessionContext(pub Arc<Session>);

impl FromRequest for SessionContext {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(lookup_session(req).map(SessionContext))
    }
}

/// Inserted by [`RequireAdmin`] once the guard allows the request through.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub identity: Identity,
    pub profile: UserProfile,
}

impl FromRequest for AdminContext {
    type Error = GenericError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let value = req.extensions().get::<AdminContext>().cloned();
        let result = match value {
            Some(context) => Ok(context),
            None => Err(GenericError::UnexpectedError(anyhow!(
                "Something went wrong while reading the admin context"
            ))),
        };
        ready(result)
    }
}

pub struct AdminGuardMiddleware<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AdminGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<actix_web::body::BoxBody>, Error = Error>
        + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        Box::pin(async move {
            let guard_wait = match req.app_data::<web::Data<AuthSettings>>() {
                Some(settings) => settings.guard_wait(),
                None => {
                    let (request, _pl) = req.into_parts();
                    let error = AuthError::UnexpectedError(anyhow!("Auth settings missing"));
                    return Ok(ServiceResponse::from_err(error, request));
                }
            };

            let snapshot = match lookup_session(req.request()) {
                Ok(session) => match session.settled(guard_wait).await {
                    Ok(snapshot) => snapshot,
                    Err(pending) => pending,
                },
                Err(AuthError::UnexpectedError(e)) => {
                    let (request, _pl) = req.into_parts();
                    return Ok(ServiceResponse::from_err(
                        AuthError::UnexpectedError(e),
                        request,
                    ));
                }
                Err(_) => AuthSnapshot::signed_out(0),
            };

            match decide(RouteKind::AdminOnly, &snapshot) {
                GuardDecision::Render => {
                    if let (Some(identity), Some(profile)) = (snapshot.identity, snapshot.profile) {
                        req.extensions_mut()
                            .insert::<AdminContext>(AdminContext { identity, profile });
                        let res = srv.call(req).await?;
                        return Ok(res);
                    }
                    let (request, _pl) = req.into_parts();
                    Ok(ServiceResponse::from_err(AuthError::AuthorizationPending, request))
                }
                GuardDecision::Loading => {
                    let (request, _pl) = req.into_parts();
                    Ok(ServiceResponse::from_err(AuthError::AuthorizationPending, request))
                }
                GuardDecision::Redirect { target } => {
                    tracing::info!(path = %req.path(), redirect_to = %target, "Admin route denied");
                    let error = if snapshot.identity.is_none() {
                        AuthError::Unauthenticated {
                            redirect_to: target,
                        }
                    } else {
                        AuthError::Forbidden {
                            redirect_to: target,
                        }
                    };
                    let (request, _pl) = req.into_parts();
                    Ok(ServiceResponse::from_err(error, request))
                }
            }
        })
    }
}

/// Middleware factory gating a scope behind an admin identity.
pub struct RequireAdmin;

impl<S> Transform<S, ServiceRequest> for RequireAdmin
where
    S: Service<ServiceRequest, Response = ServiceResponse<actix_web::body::BoxBody>, Error = Error>
        + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AdminGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}
