use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ContactQuery {
    /// Mentions this bird in the prefilled message.
    pub bird_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactLink {
    pub url: String,
    pub phone_number: String,
    pub message: String,
}
