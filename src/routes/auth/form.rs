use std::time::Duration;

use uuid::Uuid;

use super::challenge::{ChallengeAnchor, ChallengeError, ChallengeHandle, ChallengeIssuer};
use super::errors::OtpError;
use super::otp::{OtpFlow, PendingVerification};
use crate::domain::PhoneNumber;
use crate::identity_client::{Identity, IdentityProvider};

/// A mounted login form: its challenge widget plus its OTP flow.
#[derive(Debug)]
pub struct LoginForm {
    id: Uuid,
    anchor: ChallengeAnchor,
    challenge: Option<ChallengeHandle>,
    flow: OtpFlow,
}

impl LoginForm {
    pub fn new(anchor: ChallengeAnchor, otp_timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            anchor,
            challenge: None,
            flow: OtpFlow::new(otp_timeout),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn flow(&self) -> &OtpFlow {
        &self.flow
    }

    pub fn challenge_handle(&self) -> Option<&ChallengeHandle> {
        self.challenge.as_ref()
    }

    /// Returns the form's widget, issuing it on first use.
    pub fn challenge(
        &mut self,
        issuer: &dyn ChallengeIssuer,
    ) -> Result<&mut ChallengeHandle, OtpError> {
        if self.challenge.is_none() {
            let handle = issuer
                .issue(&self.anchor)
                .map_err(|e| OtpError::ChallengeNotReady(e.to_string()))?;
            self.challenge = Some(handle);
        }
        self.challenge
            .as_mut()
            .ok_or_else(|| OtpError::ChallengeNotReady(ChallengeError::NotReady.to_string()))
    }

    /// Clears the widget so the next attempt renders a fresh one.
    pub fn release_challenge(&mut self, issuer: &dyn ChallengeIssuer) {
        if let Some(handle) = self.challenge.take() {
            issuer.dispose(handle);
        }
    }

    pub async fn send_code(
        &mut self,
        raw_phone_number: &str,
        challenge_response: Option<&str>,
        issuer: &dyn ChallengeIssuer,
        provider: &dyn IdentityProvider,
    ) -> Result<&PendingVerification, OtpError> {
        let phone_number = PhoneNumber::parse(raw_phone_number).map_err(OtpError::ValidationError)?;

        let superseding = self.flow.is_code_sent();
        let handle = self.challenge(issuer)?;
        if superseding {
            handle.reset();
        }
        let token = handle
            .authorize(challenge_response)
            .map_err(|e| OtpError::ChallengeNotReady(e.to_string()))?;

        match self.flow.send_code(phone_number, token, provider).await {
            Ok(_) => {}
            Err(
                e @ (OtpError::RateLimited | OtpError::SendFailed | OtpError::ValidationError(_)),
            ) => {
                if let Some(handle) = self.challenge.as_mut() {
                    handle.reset();
                }
                return Err(e);
            }
            Err(e) => {
                self.release_challenge(issuer);
                return Err(e);
            }
        }
        self.flow
            .pending()
            .ok_or_else(|| OtpError::UnexpectedError(anyhow::anyhow!("pending verification missing")))
    }

    pub async fn confirm_code(
        &mut self,
        raw_code: &str,
        provider: &dyn IdentityProvider,
    ) -> Result<Identity, OtpError> {
        let identity = self.flow.confirm_code(raw_code, provider).await?;
        // Back to Idle: the next send needs an armed widget, same as after reset.
        if let Some(handle) = self.challenge.as_mut() {
            handle.reset();
        }
        Ok(identity)
    }

    /// "Try another number": drops the pending verification and re-arms the widget.
    pub fn reset(&mut self) {
        self.flow.reset();
        if let Some(handle) = self.challenge.as_mut() {
            handle.reset();
        }
    }

    pub fn unmount(&mut self, issuer: &dyn ChallengeIssuer) {
        self.flow.reset();
        self.release_challenge(issuer);
    }
}
