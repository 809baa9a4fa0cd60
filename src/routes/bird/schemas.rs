use actix_web::dev::Payload;
use actix_web::web::Json;
use actix_web::{FromRequest, HttpRequest};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::errors::BirdError;
use super::utils::validation_message;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "bird_availability", rename_all = "lowercase")]
pub enum BirdAvailability {
    #[default]
    Available,
    Sold,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParentMedia {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BirdParents {
    #[serde(default)]
    pub father: ParentMedia,
    #[serde(default)]
    pub mother: ParentMedia,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Bird {
    pub id: Uuid,
    pub name: String,
    pub age: String,
    pub weight: String,
    pub color: String,
    pub line: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub availability: BirdAvailability,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub parents: BirdParents,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_price(price: &BigDecimal) -> Result<(), ValidationError> {
    if price < &BigDecimal::from(0) {
        return Err(ValidationError::new("price").with_message("Price cannot be negative.".into()));
    }
    Ok(())
}

/// Body of bird create and update. Updates replace every field.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BirdRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Age is required"))]
    pub age: String,
    #[validate(length(min = 1, message = "Weight is required"))]
    pub weight: String,
    #[validate(length(min = 1, message = "Color is required"))]
    pub color: String,
    #[validate(length(min = 1, message = "Bloodline is required"))]
    pub line: String,
    #[schema(value_type = Option<String>)]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<BigDecimal>,
    #[serde(default)]
    pub availability: BirdAvailability,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub parents: BirdParents,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl BirdRequest {
    /// Trims text fields and drops blank skills so validation sees what gets stored.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.name,
            &mut self.age,
            &mut self.weight,
            &mut self.color,
            &mut self.line,
        ] {
            *field = field.trim().to_string();
        }
        self.skills = self
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }
}

impl FromRequest for BirdRequest {
    type Error = BirdError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            let body = fut
                .await
                .map_err(|e| BirdError::ValidationError(e.to_string()))?
                .into_inner()
                .normalized();
            body.validate()
                .map_err(|e| BirdError::ValidationError(validation_message(&e)))?;
            Ok(body)
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct BirdListQuery {
    pub availability: Option<BirdAvailability>,
    pub featured: Option<bool>,
}
