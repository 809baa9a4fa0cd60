use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use utoipa::TupleUnit;

use super::schemas::{ContactLink, ContactQuery};
use super::utils::{bird_inquiry_message, whatsapp_link};
use crate::configuration::ContactSettings;
use crate::errors::GenericError;
use crate::routes::bird::utils::fetch_bird;
use crate::schemas::GenericResponse;

#[utoipa::path(
    get,
    path = "/util/health_check",
    tag = "Util",
    responses(
        (status=200, description= "Service is up"),
    )
)]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("Running Server")
}

#[utoipa::path(
    get,
    path = "/util/contact",
    tag = "Util",
    summary = "WhatsApp Contact Link",
    params(ContactQuery),
    responses(
        (status=200, description= "Chat link to the farm", body= GenericResponse<ContactLink>),
        (status=404, description= "Bird not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Contact link", skip(pool, contact))]
pub async fn contact_link(
    query: web::Query<ContactQuery>,
    pool: web::Data<PgPool>,
    contact: web::Data<ContactSettings>,
) -> Result<web::Json<GenericResponse<ContactLink>>, GenericError> {
    let message = match query.bird_id {
        Some(bird_id) => {
            let bird = fetch_bird(&pool, bird_id)
                .await
                .map_err(|e| {
                    GenericError::DatabaseError(
                        "Something went wrong while fetching the bird".to_string(),
                        e,
                    )
                })?
                .ok_or_else(|| GenericError::NotFound("Bird not found.".to_string()))?;
            bird_inquiry_message(&contact, bird.id, &bird.name)
        }
        None => contact.greeting.clone(),
    };
    let link = whatsapp_link(&contact, message)?;
    Ok(web::Json(GenericResponse::success(
        "Successfully built contact link",
        Some(link),
    )))
}
