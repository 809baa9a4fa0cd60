use actix_web::web;
use utoipa::TupleUnit;

use super::errors::AdminUserError;
use super::schemas::GrantAdminRequest;
use super::utils::grant_admin_role;
use crate::routes::auth::resolver::ProfileStore;
use crate::routes::auth::schemas::UserProfile;
use crate::routes::auth::session::SessionHub;
use crate::routes::auth::AdminContext;
use crate::schemas::GenericResponse;

#[utoipa::path(
    get,
    path = "/admin/user/list",
    tag = "Admin User",
    summary = "Admin List",
    responses(
        (status=200, description= "Users with admin access", body= GenericResponse<Vec<UserProfile>>),
        (status=401, description= "Not signed in", body= GenericResponse<TupleUnit>),
        (status=403, description= "Not an admin", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "List admins", skip(store, _admin))]
pub async fn list_admins(
    _admin: AdminContext,
    store: web::Data<dyn ProfileStore>,
) -> Result<web::Json<GenericResponse<Vec<UserProfile>>>, AdminUserError> {
    let admins = store.list_admins().await.map_err(|e| {
        AdminUserError::DatabaseError("Something went wrong while fetching admins".to_string(), e)
    })?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched admins",
        Some(admins),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/user/grant",
    tag = "Admin User",
    summary = "Grant Admin",
    request_body(content = GrantAdminRequest, description = "Request Body"),
    responses(
        (status=200, description= "Admin access granted", body= GenericResponse<UserProfile>),
        (status=400, description= "Invalid phone number", body= GenericResponse<TupleUnit>),
        (status=404, description= "User never signed in", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Grant admin", skip(store, hub), fields(admin_id = %admin.identity.id))]
pub async fn grant_admin(
    body: GrantAdminRequest,
    admin: AdminContext,
    store: web::Data<dyn ProfileStore>,
    hub: web::Data<SessionHub>,
) -> Result<web::Json<GenericResponse<UserProfile>>, AdminUserError> {
    let profile = grant_admin_role(store.get_ref(), &body.phone_number).await?;
    let refreshed = hub.refresh_identity(&profile.id);
    tracing::info!(refreshed, "Sessions re-resolved after grant");
    Ok(web::Json(GenericResponse::success(
        &format!("{} is now an admin.", profile.phone_number),
        Some(profile),
    )))
}
