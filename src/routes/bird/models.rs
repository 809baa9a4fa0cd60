use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{Bird, BirdAvailability, BirdParents};

#[derive(Debug, FromRow)]
pub struct BirdModel {
    pub id: Uuid,
    pub name: String,
    pub age: String,
    pub weight: String,
    pub color: String,
    pub line: String,
    pub price: Option<BigDecimal>,
    pub availability: BirdAvailability,
    pub is_featured: bool,
    pub images: Json<Vec<String>>,
    pub videos: Json<Vec<String>>,
    pub parents: Json<BirdParents>,
    pub skills: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BirdModel {
    /// Every stored media URL of the bird and its parents.
    pub fn media_urls(&self) -> Vec<String> {
        let parents = &self.parents.0;
        self.images
            .0
            .iter()
            .chain(self.videos.0.iter())
            .chain(parents.father.images.iter())
            .chain(parents.father.videos.iter())
            .chain(parents.mother.images.iter())
            .chain(parents.mother.videos.iter())
            .filter(|url| !url.is_empty())
            .cloned()
            .collect()
    }

    pub fn into_schema(self) -> Bird {
        Bird {
            id: self.id,
            name: self.name,
            age: self.age,
            weight: self.weight,
            color: self.color,
            line: self.line,
            price: self.price,
            availability: self.availability,
            is_featured: self.is_featured,
            images: self.images.0,
            videos: self.videos.0,
            parents: self.parents.0,
            skills: self.skills.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
