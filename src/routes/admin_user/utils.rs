use super::errors::AdminUserError;
use crate::domain::PhoneNumber;
use crate::routes::auth::resolver::ProfileStore;
use crate::routes::auth::schemas::UserProfile;

/// Marks the profile signed in with `raw_phone_number` as admin.
/// Users get a profile on first sign in, so unknown numbers are rejected.
#[tracing::instrument(name = "Grant admin role", skip(store))]
pub async fn grant_admin_role(
    store: &dyn ProfileStore,
    raw_phone_number: &str,
) -> Result<UserProfile, AdminUserError> {
    let phone_number = PhoneNumber::parse(raw_phone_number).map_err(AdminUserError::ValidationError)?;
    let mut profile = store
        .find_by_phone(&phone_number)
        .await
        .map_err(|e| {
            AdminUserError::DatabaseError("Failed to look up the user.".to_string(), e)
        })?
        .ok_or_else(|| AdminUserError::UserNotFound(phone_number.to_string()))?;
    if profile.is_admin {
        return Ok(profile);
    }
    let updated = store.set_admin(&profile.id, true).await.map_err(|e| {
        AdminUserError::DatabaseError("Failed to grant admin access.".to_string(), e)
    })?;
    if !updated {
        return Err(AdminUserError::UserNotFound(phone_number.to_string()));
    }
    profile.is_admin = true;
    tracing::info!(profile_id = %profile.id, "Admin role granted");
    Ok(profile)
}
