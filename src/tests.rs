#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use secrecy::SecretString;

    use crate::configuration::{AuthSettings, ChallengeSettings, SecretSetting, JWT};
    use crate::domain::{OtpCode, PhoneNumber};
    use crate::identity_client::{
        Identity, IdentityProvider, IdentityProviderError, VerificationSession,
    };
    use crate::routes::auth::challenge::{ChallengeSize, ChallengeToken, RecaptchaChallengeIssuer};
    use crate::routes::auth::resolver::{AuthorizationResolver, ProfileStore};
    use crate::routes::auth::schemas::UserProfile;
    use crate::routes::auth::session::SessionHub;
    use crate::storage_client::{MediaFile, MediaStore, ProgressCallback, UploadProgress};

    pub const CORRECT_CODE: &str = "123456";
    pub const STORAGE_PREFIX: &str = "https://storage.test/v0/b/farm/o/";

    pub fn identity_for(phone_number: &str) -> Identity {
        Identity {
            id: format!("uid-{}", phone_number.trim_start_matches('+')),
            phone_number: phone_number.to_string(),
        }
    }

    /// Accepts `123456` for every number. Counts calls so tests can assert
    /// that validation happens before any network call.
    #[derive(Default)]
    pub struct MockIdentityProvider {
        pub send_calls: AtomicUsize,
        pub confirm_calls: AtomicUsize,
        next_send_error: Mutex<Option<IdentityProviderError>>,
        delay: Option<Duration>,
    }

    impl MockIdentityProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        pub fn fail_next_send(&self, error: IdentityProviderError) {
            *self.next_send_error.lock().unwrap() = Some(error);
        }

        pub fn network_calls(&self) -> usize {
            self.send_calls.load(Ordering::SeqCst) + self.confirm_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentityProvider {
        async fn send_verification(
            &self,
            phone_number: &PhoneNumber,
            _challenge: &ChallengeToken,
        ) -> Result<VerificationSession, IdentityProviderError> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(error) = self.next_send_error.lock().unwrap().take() {
                return Err(error);
            }
            Ok(VerificationSession::new(phone_number.as_ref()))
        }

        async fn confirm(
            &self,
            session: &VerificationSession,
            code: &OtpCode,
        ) -> Result<Identity, IdentityProviderError> {
            self.confirm_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if code.expose() == CORRECT_CODE {
                Ok(identity_for(session.as_str()))
            } else {
                Err(IdentityProviderError::InvalidCode)
            }
        }
    }

    #[derive(Default)]
    pub struct MemoryProfileStore {
        profiles: Mutex<HashMap<String, UserProfile>>,
        pub create_calls: AtomicUsize,
    }

    impl MemoryProfileStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_admin(identity: &Identity) -> Self {
            let store = Self::default();
            store.profiles.lock().unwrap().insert(
                identity.id.clone(),
                UserProfile {
                    id: identity.id.clone(),
                    phone_number: identity.phone_number.clone(),
                    is_admin: true,
                    created_at: Utc::now(),
                },
            );
            store
        }

        pub fn len(&self) -> usize {
            self.profiles.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryProfileStore {
        async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, anyhow::Error> {
            tokio::task::yield_now().await;
            Ok(self.profiles.lock().unwrap().get(id).cloned())
        }

        async fn create_profile(&self, identity: &Identity) -> Result<(), anyhow::Error> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.profiles
                .lock()
                .unwrap()
                .entry(identity.id.clone())
                .or_insert_with(|| UserProfile {
                    id: identity.id.clone(),
                    phone_number: identity.phone_number.clone(),
                    is_admin: false,
                    created_at: Utc::now(),
                });
            Ok(())
        }

        async fn get_admin_grant(&self, id: &str) -> Result<bool, anyhow::Error> {
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .get(id)
                .map(|p| p.is_admin)
                .unwrap_or(false))
        }

        async fn find_by_phone(
            &self,
            phone_number: &PhoneNumber,
        ) -> Result<Option<UserProfile>, anyhow::Error> {
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .values()
                .find(|p| p.phone_number == phone_number.as_ref())
                .cloned())
        }

        async fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool, anyhow::Error> {
            Ok(match self.profiles.lock().unwrap().get_mut(id) {
                Some(profile) => {
                    profile.is_admin = is_admin;
                    true
                }
                None => false,
            })
        }

        async fn list_admins(&self) -> Result<Vec<UserProfile>, anyhow::Error> {
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.is_admin)
                .cloned()
                .collect())
        }
    }

    /// Reads succeed with nothing stored; every write fails.
    pub struct ReadOnlyProfileStore;

    #[async_trait]
    impl ProfileStore for ReadOnlyProfileStore {
        async fn get_profile(&self, _id: &str) -> Result<Option<UserProfile>, anyhow::Error> {
            Ok(None)
        }

        async fn create_profile(&self, _identity: &Identity) -> Result<(), anyhow::Error> {
            Err(anyhow::anyhow!("permission denied"))
        }

        async fn get_admin_grant(&self, _id: &str) -> Result<bool, anyhow::Error> {
            Ok(false)
        }

        async fn find_by_phone(
            &self,
            _phone_number: &PhoneNumber,
        ) -> Result<Option<UserProfile>, anyhow::Error> {
            Ok(None)
        }

        async fn set_admin(&self, _id: &str, _is_admin: bool) -> Result<bool, anyhow::Error> {
            Err(anyhow::anyhow!("permission denied"))
        }

        async fn list_admins(&self) -> Result<Vec<UserProfile>, anyhow::Error> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    pub struct MemoryMediaStore {
        pub objects: Mutex<HashMap<String, MediaFile>>,
        pub deleted: Mutex<Vec<String>>,
        pub progress: Mutex<Vec<UploadProgress>>,
        pub fail_deletes: bool,
    }

    impl MemoryMediaStore {
        pub fn failing_deletes() -> Self {
            Self {
                fail_deletes: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl MediaStore for MemoryMediaStore {
        async fn upload(
            &self,
            file: MediaFile,
            path: &str,
            on_progress: ProgressCallback,
        ) -> Result<String, anyhow::Error> {
            let total_bytes = file.content.len() as u64;
            let progress = UploadProgress {
                bytes_sent: total_bytes,
                total_bytes,
            };
            on_progress(progress);
            self.progress.lock().unwrap().push(progress);
            let url = format!("{}{}?alt=media", STORAGE_PREFIX, path.replace('/', "%2F"));
            self.objects.lock().unwrap().insert(url.clone(), file);
            Ok(url)
        }

        async fn delete(&self, url: &str) -> Result<(), anyhow::Error> {
            if self.fail_deletes {
                return Err(anyhow::anyhow!("storage unavailable"));
            }
            self.objects.lock().unwrap().remove(url);
            self.deleted.lock().unwrap().push(url.to_string());
            Ok(())
        }

        fn owns_url(&self, url: &str) -> bool {
            url.starts_with(STORAGE_PREFIX)
        }
    }

    pub fn get_test_issuer() -> Arc<RecaptchaChallengeIssuer> {
        Arc::new(RecaptchaChallengeIssuer::new(&ChallengeSettings {
            site_key: "test-site-key".to_string(),
            size: ChallengeSize::Invisible,
        }))
    }

    pub fn get_test_hub(store: Arc<dyn ProfileStore>, ttl_hours: i64) -> SessionHub {
        SessionHub::new(
            Arc::new(AuthorizationResolver::new(store)),
            get_test_issuer(),
            ttl_hours,
        )
    }

    /// Role lookups stall for `delay`, keeping sessions in the loading state.
    pub struct SlowProfileStore {
        inner: MemoryProfileStore,
        delay: Duration,
    }

    impl SlowProfileStore {
        pub fn new(inner: MemoryProfileStore, delay: Duration) -> Self {
            Self { inner, delay }
        }
    }

    #[async_trait]
    impl ProfileStore for SlowProfileStore {
        async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, anyhow::Error> {
            tokio::time::sleep(self.delay).await;
            self.inner.get_profile(id).await
        }

        async fn create_profile(&self, identity: &Identity) -> Result<(), anyhow::Error> {
            self.inner.create_profile(identity).await
        }

        async fn get_admin_grant(&self, id: &str) -> Result<bool, anyhow::Error> {
            tokio::time::sleep(self.delay).await;
            self.inner.get_admin_grant(id).await
        }

        async fn find_by_phone(
            &self,
            phone_number: &PhoneNumber,
        ) -> Result<Option<UserProfile>, anyhow::Error> {
            self.inner.find_by_phone(phone_number).await
        }

        async fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool, anyhow::Error> {
            self.inner.set_admin(id, is_admin).await
        }

        async fn list_admins(&self) -> Result<Vec<UserProfile>, anyhow::Error> {
            self.inner.list_admins().await
        }
    }

    pub fn get_test_secret() -> SecretSetting {
        SecretSetting {
            jwt: JWT {
                secret: SecretString::from("test-jwt-secret"),
                expiry: 1,
            },
        }
    }

    pub fn get_test_auth_settings() -> AuthSettings {
        AuthSettings {
            otp_timeout_seconds: 5,
            guard_wait_seconds: 2,
            session_prune_interval_seconds: 60,
        }
    }
}
