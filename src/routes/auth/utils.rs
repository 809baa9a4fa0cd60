use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::UserProfileModel;
use super::resolver::ProfileStore;
use super::schemas::UserProfile;
use crate::domain::PhoneNumber;
use crate::identity_client::Identity;

/// Postgres-backed role records in `user_profile`.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[tracing::instrument(name = "Fetch user profile", skip(self))]
    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, anyhow::Error> {
        let row = sqlx::query_as::<_, UserProfileModel>(
            r#"SELECT id, phone_number, is_admin, created_at FROM user_profile WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to execute profile fetch query")?;
        Ok(row.map(UserProfileModel::into_schema))
    }

    #[tracing::instrument(name = "Create user profile", skip(self, identity), fields(identity_id = %identity.id))]
    async fn create_profile(&self, identity: &Identity) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_profile (id, phone_number, is_admin, created_at)
            VALUES ($1, $2, FALSE, now())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&identity.id)
        .bind(&identity.phone_number)
        .execute(&self.pool)
        .await
        .context("Failed to execute profile insert query")?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetch admin grant", skip(self))]
    async fn get_admin_grant(&self, id: &str) -> Result<bool, anyhow::Error> {
        let is_admin: Option<bool> =
            sqlx::query_scalar(r#"SELECT is_admin FROM user_profile WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to execute admin grant query")?;
        Ok(is_admin.unwrap_or(false))
    }

    #[tracing::instrument(name = "Fetch user profile by phone", skip(self))]
    async fn find_by_phone(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<UserProfile>, anyhow::Error> {
        let row = sqlx::query_as::<_, UserProfileModel>(
            r#"
            SELECT id, phone_number, is_admin, created_at FROM user_profile
            WHERE phone_number = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(phone_number.as_ref())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to execute profile lookup query")?;
        Ok(row.map(UserProfileModel::into_schema))
    }

    #[tracing::instrument(name = "Update admin grant", skip(self))]
    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool, anyhow::Error> {
        let result = sqlx::query(r#"UPDATE user_profile SET is_admin = $2 WHERE id = $1"#)
            .bind(id)
            .bind(is_admin)
            .execute(&self.pool)
            .await
            .context("Failed to execute admin grant update")?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "List admins", skip(self))]
    async fn list_admins(&self) -> Result<Vec<UserProfile>, anyhow::Error> {
        let rows = sqlx::query_as::<_, UserProfileModel>(
            r#"
            SELECT id, phone_number, is_admin, created_at FROM user_profile
            WHERE is_admin
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to execute admin list query")?;
        Ok(rows.into_iter().map(UserProfileModel::into_schema).collect())
    }
}
