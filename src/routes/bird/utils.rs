use anyhow::Context;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationErrors;

use super::models::BirdModel;
use super::schemas::{BirdListQuery, BirdRequest};
use crate::storage_client::MediaStore;

const BIRD_COLUMNS: &str = "id, name, age, weight, color, line, price, availability, is_featured, \
     images, videos, parents, skills, created_at, updated_at";

/// Picks one message out of `errors`, ordered by field name so repeated requests answer alike.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errors)| errors.iter().map(move |e| (field.clone(), e)))
        .map(|(field, e)| match &e.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value for {}", field),
        })
        .next()
        .unwrap_or_else(|| "Invalid request body".to_string())
}

/// Every media URL in the request must come from our storage bucket.
pub fn validate_media_urls(body: &BirdRequest, media_store: &dyn MediaStore) -> Result<(), String> {
    let parents = &body.parents;
    let foreign = body
        .images
        .iter()
        .chain(body.videos.iter())
        .chain(parents.father.images.iter())
        .chain(parents.father.videos.iter())
        .chain(parents.mother.images.iter())
        .chain(parents.mother.videos.iter())
        .find(|url| !media_store.owns_url(url));
    match foreign {
        Some(url) => Err(format!(
            "Media URL must point to the farm's storage bucket: {}",
            url
        )),
        None => Ok(()),
    }
}

#[tracing::instrument(name = "Fetch bird list", skip(pool))]
pub async fn fetch_birds(
    pool: &PgPool,
    filter: &BirdListQuery,
) -> Result<Vec<BirdModel>, anyhow::Error> {
    let query = format!(
        r#"
        SELECT {} FROM bird
        WHERE ($1::bird_availability IS NULL OR availability = $1)
        AND ($2::boolean IS NULL OR is_featured = $2)
        ORDER BY created_at DESC
        "#,
        BIRD_COLUMNS
    );
    let rows = sqlx::query_as::<_, BirdModel>(&query)
        .bind(filter.availability)
        .bind(filter.featured)
        .fetch_all(pool)
        .await
        .context("Failed to execute bird list query")?;
    Ok(rows)
}

#[tracing::instrument(name = "Fetch featured birds", skip(pool))]
pub async fn fetch_featured_birds(pool: &PgPool, limit: i64) -> Result<Vec<BirdModel>, anyhow::Error> {
    let query = format!(
        r#"SELECT {} FROM bird WHERE is_featured ORDER BY created_at DESC LIMIT $1"#,
        BIRD_COLUMNS
    );
    let rows = sqlx::query_as::<_, BirdModel>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to execute featured bird query")?;
    Ok(rows)
}

#[tracing::instrument(name = "Fetch bird", skip(pool))]
pub async fn fetch_bird(pool: &PgPool, id: Uuid) -> Result<Option<BirdModel>, anyhow::Error> {
    let query = format!(r#"SELECT {} FROM bird WHERE id = $1"#, BIRD_COLUMNS);
    let row = sqlx::query_as::<_, BirdModel>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to execute bird fetch query")?;
    Ok(row)
}

#[tracing::instrument(name = "Save bird", skip(pool, body), fields(name = %body.name))]
pub async fn save_bird(pool: &PgPool, body: &BirdRequest) -> Result<BirdModel, anyhow::Error> {
    let query = format!(
        r#"
        INSERT INTO bird (id, name, age, weight, color, line, price, availability, is_featured,
            images, videos, parents, skills, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now(), now())
        RETURNING {}
        "#,
        BIRD_COLUMNS
    );
    let row = sqlx::query_as::<_, BirdModel>(&query)
        .bind(Uuid::new_v4())
        .bind(&body.name)
        .bind(&body.age)
        .bind(&body.weight)
        .bind(&body.color)
        .bind(&body.line)
        .bind(&body.price)
        .bind(body.availability)
        .bind(body.is_featured)
        .bind(Json(&body.images))
        .bind(Json(&body.videos))
        .bind(Json(&body.parents))
        .bind(Json(&body.skills))
        .fetch_one(pool)
        .await
        .context("Failed to execute bird insert query")?;
    Ok(row)
}

#[tracing::instrument(name = "Update bird", skip(pool, body))]
pub async fn update_bird(
    pool: &PgPool,
    id: Uuid,
    body: &BirdRequest,
) -> Result<Option<BirdModel>, anyhow::Error> {
    let query = format!(
        r#"
        UPDATE bird SET name = $2, age = $3, weight = $4, color = $5, line = $6, price = $7,
            availability = $8, is_featured = $9, images = $10, videos = $11, parents = $12,
            skills = $13, updated_at = now()
        WHERE id = $1
        RETURNING {}
        "#,
        BIRD_COLUMNS
    );
    let row = sqlx::query_as::<_, BirdModel>(&query)
        .bind(id)
        .bind(&body.name)
        .bind(&body.age)
        .bind(&body.weight)
        .bind(&body.color)
        .bind(&body.line)
        .bind(&body.price)
        .bind(body.availability)
        .bind(body.is_featured)
        .bind(Json(&body.images))
        .bind(Json(&body.videos))
        .bind(Json(&body.parents))
        .bind(Json(&body.skills))
        .fetch_optional(pool)
        .await
        .context("Failed to execute bird update query")?;
    Ok(row)
}

#[tracing::instrument(name = "Delete bird", skip(pool))]
pub async fn delete_bird(pool: &PgPool, id: Uuid) -> Result<Option<BirdModel>, anyhow::Error> {
    let query = format!(r#"DELETE FROM bird WHERE id = $1 RETURNING {}"#, BIRD_COLUMNS);
    let row = sqlx::query_as::<_, BirdModel>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to execute bird delete query")?;
    Ok(row)
}

/// Deletes stored objects, logging the ones that fail. Returns how many were removed.
#[tracing::instrument(name = "Remove bird media", skip(media_store, urls), fields(count = urls.len()))]
pub async fn remove_media(media_store: &dyn MediaStore, urls: &[String]) -> usize {
    let results = futures::future::join_all(
        urls.iter()
            .filter(|url| media_store.owns_url(url))
            .map(|url| async move { (url, media_store.delete(url).await) }),
    )
    .await;
    results
        .into_iter()
        .filter(|(url, result)| match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(url = %url, error = ?e, "Failed to delete stored media");
                false
            }
        })
        .count()
}
