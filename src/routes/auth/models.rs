use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::schemas::UserProfile;

#[derive(Debug, FromRow)]
pub struct UserProfileModel {
    pub id: String,
    pub phone_number: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfileModel {
    pub fn into_schema(self) -> UserProfile {
        UserProfile {
            id: self.id,
            phone_number: self.phone_number,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}
