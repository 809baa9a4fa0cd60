use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::configuration::IdentityProviderSettings;
use crate::domain::{OtpCode, PhoneNumber};
use crate::general_utils::error_chain_fmt;
use crate::routes::auth::challenge::ChallengeToken;

/// The authenticated principal returned after a successful code confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: String,
    pub phone_number: String,
}

/// Provider-side handle of a dispatched code.
#[derive(Clone)]
pub struct VerificationSession(String);

impl VerificationSession {
    pub fn new(session_info: impl Into<String>) -> Self {
        Self(session_info.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for VerificationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VerificationSession(..)")
    }
}

#[derive(thiserror::Error)]
pub enum IdentityProviderError {
    #[error("Too many attempts")]
    RateLimited,
    #[error("Caller is not authorized to use phone verification: {0}")]
    NotAuthorized(String),
    #[error("Verification code rejected")]
    InvalidCode,
    #[error("Phone number rejected")]
    InvalidPhoneNumber,
    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),
    #[error("Identity provider unreachable")]
    Transport(#[source] anyhow::Error),
}

impl std::fmt::Debug for IdentityProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Maps a provider error message such as `TOO_MANY_ATTEMPTS_TRY_LATER : ...` to a category.
pub fn classify_provider_error(message: &str) -> IdentityProviderError {
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    match code.as_str() {
        "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => IdentityProviderError::RateLimited,
        "CAPTCHA_CHECK_FAILED"
        | "UNAUTHORIZED_DOMAIN"
        | "OPERATION_NOT_ALLOWED"
        | "API_KEY_INVALID"
        | "INVALID_APP_CREDENTIAL"
        | "MISSING_APP_CREDENTIAL"
        | "PROJECT_NOT_FOUND" => IdentityProviderError::NotAuthorized(code),
        "INVALID_CODE" | "INVALID_SESSION_INFO" | "SESSION_EXPIRED" | "CODE_EXPIRED"
        | "MISSING_CODE" => IdentityProviderError::InvalidCode,
        "INVALID_PHONE_NUMBER" | "MISSING_PHONE_NUMBER" => {
            IdentityProviderError::InvalidPhoneNumber
        }
        _ if message.contains("API key not valid") => {
            IdentityProviderError::NotAuthorized("API_KEY_INVALID".to_string())
        }
        _ => IdentityProviderError::Rejected(code),
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn send_verification(
        &self,
        phone_number: &PhoneNumber,
        challenge: &ChallengeToken,
    ) -> Result<VerificationSession, IdentityProviderError>;

    async fn confirm(
        &self,
        session: &VerificationSession,
        code: &OtpCode,
    ) -> Result<Identity, IdentityProviderError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendVerificationCodeRequest<'a> {
    phone_number: &'a str,
    recaptcha_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendVerificationCodeResponse {
    session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithPhoneNumberRequest<'a> {
    session_info: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithPhoneNumberResponse {
    local_id: String,
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Phone sign-in against the Identity Toolkit REST API.
#[derive(Debug)]
pub struct IdentityToolkitClient {
    http_client: Client,
    base_url: String,
    api_key: SecretString,
}

impl IdentityToolkitClient {
    pub fn new(
        base_url: String,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    pub fn from_settings(settings: &IdentityProviderSettings) -> Result<Self, anyhow::Error> {
        Self::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            settings.timeout(),
        )
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.base_url.trim_end_matches('/'),
            method,
            self.api_key.expose_secret()
        )
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R, IdentityProviderError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http_client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.into()))?;

        if response.status().is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| IdentityProviderError::Transport(e.into()));
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.into()))?;
        match serde_json::from_str::<ProviderErrorBody>(&text) {
            Ok(body) => {
                tracing::warn!(%status, provider_message = %body.error.message, "Identity provider error");
                Err(classify_provider_error(&body.error.message))
            }
            Err(_) => Err(IdentityProviderError::Transport(anyhow::anyhow!(
                "Unexpected identity provider response {}: {}",
                status,
                text
            ))),
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitClient {
    #[tracing::instrument(name = "Send verification code", skip(self, challenge))]
    async fn send_verification(
        &self,
        phone_number: &PhoneNumber,
        challenge: &ChallengeToken,
    ) -> Result<VerificationSession, IdentityProviderError> {
        let request = SendVerificationCodeRequest {
            phone_number: phone_number.as_ref(),
            recaptcha_token: challenge.expose(),
        };
        let response: SendVerificationCodeResponse =
            self.post("sendVerificationCode", &request).await?;
        Ok(VerificationSession::new(response.session_info))
    }

    #[tracing::instrument(name = "Confirm verification code", skip(self, session, code))]
    async fn confirm(
        &self,
        session: &VerificationSession,
        code: &OtpCode,
    ) -> Result<Identity, IdentityProviderError> {
        let request = SignInWithPhoneNumberRequest {
            session_info: session.as_str(),
            code: code.expose(),
        };
        let response: SignInWithPhoneNumberResponse =
            self.post("signInWithPhoneNumber", &request).await?;
        Ok(Identity {
            id: response.local_id,
            phone_number: response.phone_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_provider_error, IdentityProviderError};

    #[test]
    fn test_rate_limit_messages_are_classified() {
        assert!(matches!(
            classify_provider_error("TOO_MANY_ATTEMPTS_TRY_LATER : Try again later."),
            IdentityProviderError::RateLimited
        ));
        assert!(matches!(
            classify_provider_error("QUOTA_EXCEEDED"),
            IdentityProviderError::RateLimited
        ));
    }

    #[test]
    fn test_configuration_messages_keep_their_code() {
        match classify_provider_error("CAPTCHA_CHECK_FAILED : Hostname match not found") {
            IdentityProviderError::NotAuthorized(code) => assert_eq!(code, "CAPTCHA_CHECK_FAILED"),
            other => panic!("unexpected classification {:?}", other),
        }
        assert!(matches!(
            classify_provider_error("API key not valid. Please pass a valid API key."),
            IdentityProviderError::NotAuthorized(_)
        ));
    }

    #[test]
    fn test_code_and_phone_messages_are_classified() {
        assert!(matches!(
            classify_provider_error("INVALID_CODE"),
            IdentityProviderError::InvalidCode
        ));
        assert!(matches!(
            classify_provider_error("SESSION_EXPIRED"),
            IdentityProviderError::InvalidCode
        ));
        assert!(matches!(
            classify_provider_error("INVALID_PHONE_NUMBER : TOO_SHORT"),
            IdentityProviderError::InvalidPhoneNumber
        ));
    }

    #[test]
    fn test_unknown_messages_are_rejections() {
        match classify_provider_error("SOMETHING_NEW") {
            IdentityProviderError::Rejected(code) => assert_eq!(code, "SOMETHING_NEW"),
            other => panic!("unexpected classification {:?}", other),
        }
    }
}
