use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::errors::BirdError;
use super::models::BirdModel;
use super::schemas::{Bird, BirdListQuery, BirdRequest};
use super::utils::{
    delete_bird, fetch_bird, fetch_birds, fetch_featured_birds, remove_media, save_bird,
    update_bird, validate_media_urls,
};
use crate::constants::FEATURED_BIRD_LIMIT;
use crate::routes::auth::AdminContext;
use crate::schemas::GenericResponse;
use crate::storage_client::MediaStore;

#[utoipa::path(
    get,
    path = "/bird/list",
    tag = "Bird",
    summary = "Bird List",
    params(BirdListQuery),
    responses(
        (status=200, description= "Birds, newest first", body= GenericResponse<Vec<Bird>>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "List birds", skip(pool))]
pub async fn list_birds(
    query: web::Query<BirdListQuery>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Vec<Bird>>>, BirdError> {
    let birds = fetch_birds(&pool, &query)
        .await
        .map_err(|e| BirdError::DatabaseError("Something went wrong while fetching birds".to_string(), e))?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched birds",
        Some(birds.into_iter().map(BirdModel::into_schema).collect()),
    )))
}

#[utoipa::path(
    get,
    path = "/bird/featured",
    tag = "Bird",
    summary = "Featured Birds",
    responses(
        (status=200, description= "Featured birds, newest first", body= GenericResponse<Vec<Bird>>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Featured birds", skip(pool))]
pub async fn featured_birds(
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Vec<Bird>>>, BirdError> {
    let birds = fetch_featured_birds(&pool, FEATURED_BIRD_LIMIT)
        .await
        .map_err(|e| {
            BirdError::DatabaseError(
                "Something went wrong while fetching featured birds".to_string(),
                e,
            )
        })?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched featured birds",
        Some(birds.into_iter().map(BirdModel::into_schema).collect()),
    )))
}

#[utoipa::path(
    get,
    path = "/bird/{bird_id}",
    tag = "Bird",
    summary = "Bird Detail",
    params(("bird_id" = Uuid, Path, description = "Bird id")),
    responses(
        (status=200, description= "Bird detail", body= GenericResponse<Bird>),
        (status=404, description= "Bird not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Bird detail", skip(pool))]
pub async fn bird_detail(
    bird_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Bird>>, BirdError> {
    let bird = fetch_bird(&pool, bird_id.into_inner())
        .await
        .map_err(|e| BirdError::DatabaseError("Something went wrong while fetching the bird".to_string(), e))?
        .ok_or(BirdError::NotFound)?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched bird",
        Some(bird.into_schema()),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/bird/create",
    tag = "Admin Bird",
    summary = "Add Bird",
    request_body(content = BirdRequest, description = "Request Body"),
    responses(
        (status=200, description= "Bird added", body= GenericResponse<Bird>),
        (status=400, description= "Invalid Request body", body= GenericResponse<TupleUnit>),
        (status=401, description= "Not signed in", body= GenericResponse<TupleUnit>),
        (status=403, description= "Not an admin", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Create bird", skip(pool, media_store, body), fields(admin_id = %admin.identity.id))]
pub async fn create_bird(
    body: BirdRequest,
    admin: AdminContext,
    pool: web::Data<PgPool>,
    media_store: web::Data<dyn MediaStore>,
) -> Result<web::Json<GenericResponse<Bird>>, BirdError> {
    validate_media_urls(&body, media_store.get_ref()).map_err(BirdError::ValidationError)?;
    let bird = save_bird(&pool, &body)
        .await
        .map_err(|e| BirdError::DatabaseError("Failed to add bird.".to_string(), e))?;
    tracing::info!(bird_id = %bird.id, "Bird added");
    Ok(web::Json(GenericResponse::success(
        "Bird added successfully!",
        Some(bird.into_schema()),
    )))
}

#[utoipa::path(
    put,
    path = "/admin/bird/{bird_id}",
    tag = "Admin Bird",
    summary = "Edit Bird",
    params(("bird_id" = Uuid, Path, description = "Bird id")),
    request_body(content = BirdRequest, description = "Request Body"),
    responses(
        (status=200, description= "Bird updated", body= GenericResponse<Bird>),
        (status=400, description= "Invalid Request body", body= GenericResponse<TupleUnit>),
        (status=404, description= "Bird not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Edit bird", skip(pool, media_store, body), fields(admin_id = %admin.identity.id))]
pub async fn edit_bird(
    bird_id: web::Path<Uuid>,
    body: BirdRequest,
    admin: AdminContext,
    pool: web::Data<PgPool>,
    media_store: web::Data<dyn MediaStore>,
) -> Result<web::Json<GenericResponse<Bird>>, BirdError> {
    validate_media_urls(&body, media_store.get_ref()).map_err(BirdError::ValidationError)?;
    let bird = update_bird(&pool, bird_id.into_inner(), &body)
        .await
        .map_err(|e| BirdError::DatabaseError("Failed to update bird.".to_string(), e))?
        .ok_or(BirdError::NotFound)?;
    Ok(web::Json(GenericResponse::success(
        "Bird updated successfully!",
        Some(bird.into_schema()),
    )))
}

#[utoipa::path(
    delete,
    path = "/admin/bird/{bird_id}",
    tag = "Admin Bird",
    summary = "Delete Bird",
    params(("bird_id" = Uuid, Path, description = "Bird id")),
    responses(
        (status=200, description= "Bird deleted", body= GenericResponse<TupleUnit>),
        (status=404, description= "Bird not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Delete bird", skip(pool, media_store), fields(admin_id = %admin.identity.id))]
pub async fn remove_bird(
    bird_id: web::Path<Uuid>,
    admin: AdminContext,
    pool: web::Data<PgPool>,
    media_store: web::Data<dyn MediaStore>,
) -> Result<web::Json<GenericResponse<()>>, BirdError> {
    let bird = delete_bird(&pool, bird_id.into_inner())
        .await
        .map_err(|e| BirdError::DatabaseError("Failed to delete bird.".to_string(), e))?
        .ok_or(BirdError::NotFound)?;
    let urls = bird.media_urls();
    let removed = remove_media(media_store.get_ref(), &urls).await;
    tracing::info!(bird_id = %bird.id, removed, total = urls.len(), "Bird deleted");
    Ok(web::Json(GenericResponse::success(
        "Bird deleted successfully!",
        Some(()),
    )))
}
