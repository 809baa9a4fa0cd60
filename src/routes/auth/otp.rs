use std::time::Duration;

use chrono::{DateTime, Utc};

use super::challenge::ChallengeToken;
use super::errors::OtpError;
use crate::domain::{OtpCode, PhoneNumber};
use crate::identity_client::{
    Identity, IdentityProvider, IdentityProviderError, VerificationSession,
};

#[derive(Debug)]
pub struct PendingVerification {
    phone_number: PhoneNumber,
    session: VerificationSession,
    sent_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

#[derive(Debug)]
pub enum OtpState {
    Idle,
    CodeSent(PendingVerification),
}

fn send_error(error: IdentityProviderError) -> OtpError {
    match error {
        IdentityProviderError::RateLimited => OtpError::RateLimited,
        IdentityProviderError::NotAuthorized(code) => OtpError::Configuration(code),
        IdentityProviderError::InvalidPhoneNumber => OtpError::ValidationError(
            "This phone number cannot receive verification codes.".to_string(),
        ),
        IdentityProviderError::InvalidCode | IdentityProviderError::Rejected(_) => {
            OtpError::SendFailed
        }
        IdentityProviderError::Transport(_) => OtpError::ProviderUnavailable,
    }
}

// Every rejection of the code itself reads the same to avoid enumeration.
fn confirm_error(error: IdentityProviderError) -> OtpError {
    match error {
        IdentityProviderError::RateLimited => OtpError::RateLimited,
        IdentityProviderError::NotAuthorized(code) => OtpError::Configuration(code),
        IdentityProviderError::InvalidCode
        | IdentityProviderError::InvalidPhoneNumber
        | IdentityProviderError::Rejected(_) => OtpError::IncorrectCode,
        IdentityProviderError::Transport(_) => OtpError::ProviderUnavailable,
    }
}

/// Send / confirm / reset state machine for one login form.
#[derive(Debug)]
pub struct OtpFlow {
    state: OtpState,
    timeout: Duration,
}

impl OtpFlow {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: OtpState::Idle,
            timeout,
        }
    }

    pub fn state(&self) -> &OtpState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingVerification> {
        match &self.state {
            OtpState::CodeSent(pending) => Some(pending),
            OtpState::Idle => None,
        }
    }

    pub fn is_code_sent(&self) -> bool {
        self.pending().is_some()
    }

    /// Dispatches a code. Any earlier pending verification is superseded.
    #[tracing::instrument(name = "OTP send code", skip(self, challenge, provider))]
    pub async fn send_code(
        &mut self,
        phone_number: PhoneNumber,
        challenge: ChallengeToken,
        provider: &dyn IdentityProvider,
    ) -> Result<&PendingVerification, OtpError> {
        self.state = OtpState::Idle;
        let session = tokio::time::timeout(
            self.timeout,
            provider.send_verification(&phone_number, &challenge),
        )
        .await
        .map_err(|_| OtpError::Timeout)?
        .map_err(|e| {
            tracing::error!("Failed to send verification code: {:?}", e);
            send_error(e)
        })?;

        self.state = OtpState::CodeSent(PendingVerification {
            phone_number,
            session,
            sent_at: Utc::now(),
        });
        self.pending()
            .ok_or_else(|| OtpError::UnexpectedError(anyhow::anyhow!("pending verification missing")))
    }

    /// Confirms `raw_code` against the pending verification. Returns to idle only on success.
    #[tracing::instrument(name = "OTP confirm code", skip(self, raw_code, provider))]
    pub async fn confirm_code(
        &mut self,
        raw_code: &str,
        provider: &dyn IdentityProvider,
    ) -> Result<Identity, OtpError> {
        let code = OtpCode::parse(raw_code).map_err(OtpError::ValidationError)?;
        let pending = self.pending().ok_or(OtpError::NoPendingVerification)?;

        let identity = tokio::time::timeout(self.timeout, provider.confirm(&pending.session, &code))
            .await
            .map_err(|_| OtpError::Timeout)?
            .map_err(|e| {
                tracing::warn!("Verification code rejected: {:?}", e);
                confirm_error(e)
            })?;

        self.state = OtpState::Idle;
        Ok(identity)
    }

    pub fn reset(&mut self) {
        self.state = OtpState::Idle;
    }
}
