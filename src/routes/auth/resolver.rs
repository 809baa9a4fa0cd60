use std::sync::Arc;

use async_trait::async_trait;

use super::schemas::UserProfile;
use crate::domain::PhoneNumber;
use crate::general_utils::error_chain_fmt;
use crate::identity_client::Identity;

/// Role-record store. Keyed by identity id; writes are idempotent.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, anyhow::Error>;

    /// Inserts a non-admin profile unless one already exists. Never overwrites.
    async fn create_profile(&self, identity: &Identity) -> Result<(), anyhow::Error>;

    /// `false` when no record exists.
    async fn get_admin_grant(&self, id: &str) -> Result<bool, anyhow::Error>;

    async fn find_by_phone(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<UserProfile>, anyhow::Error>;

    /// Returns whether a profile was updated.
    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool, anyhow::Error>;

    async fn list_admins(&self) -> Result<Vec<UserProfile>, anyhow::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub is_admin: bool,
    pub profile: UserProfile,
}

#[derive(thiserror::Error)]
pub enum ResolutionError {
    #[error("Failed to read the user profile")]
    ProfileRead(#[source] anyhow::Error),
    #[error("Failed to create the user profile")]
    ProfileWrite(#[source] anyhow::Error),
}

impl std::fmt::Debug for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct AuthorizationResolver {
    store: Arc<dyn ProfileStore>,
}

impl AuthorizationResolver {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    /// Admin status for `identity`, creating its profile on first sight.
    /// Absence of a role record means "not admin".
    #[tracing::instrument(name = "Resolve authorization", skip(self), fields(identity_id = %identity.id))]
    pub async fn resolve(&self, identity: &Identity) -> Result<Resolution, ResolutionError> {
        let is_admin = self
            .store
            .get_admin_grant(&identity.id)
            .await
            .map_err(ResolutionError::ProfileRead)?;

        let profile = match self
            .store
            .get_profile(&identity.id)
            .await
            .map_err(ResolutionError::ProfileRead)?
        {
            Some(profile) => profile,
            None => {
                self.store
                    .create_profile(identity)
                    .await
                    .map_err(ResolutionError::ProfileWrite)?;
                self.store
                    .get_profile(&identity.id)
                    .await
                    .map_err(ResolutionError::ProfileRead)?
                    .ok_or_else(|| {
                        ResolutionError::ProfileWrite(anyhow::anyhow!(
                            "Profile missing after creation"
                        ))
                    })?
            }
        };

        Ok(Resolution {
            is_admin: is_admin && profile.is_admin,
            profile,
        })
    }
}
