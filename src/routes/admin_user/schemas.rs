use actix_web::dev::Payload;
use actix_web::web::Json;
use actix_web::{FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use utoipa::ToSchema;

use super::errors::AdminUserError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantAdminRequest {
    /// International format, e.g. `+919876543210`.
    pub phone_number: String,
}

impl FromRequest for GrantAdminRequest {
    type Error = AdminUserError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            match fut.await {
                Ok(json) => Ok(json.into_inner()),
                Err(e) => Err(AdminUserError::ValidationError(e.to_string())),
            }
        })
    }
}
