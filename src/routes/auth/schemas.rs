use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::challenge::{ChallengeHandle, ChallengeSize};
use super::form::LoginForm;
use super::guard::{AuthSnapshot, GuardDecision};
use super::otp::OtpState;
use crate::identity_client::Identity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub phone_number: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MountLoginFormRequest {
    /// Id of the page element the challenge widget renders into.
    pub container_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    pub phone_number: String,
    pub challenge_response: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ConfirmCodeRequest {
    pub code: String,
}

impl std::fmt::Debug for ConfirmCodeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmCodeRequest").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct GuardQuery {
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionTokenData {
    pub session_id: Uuid,
    #[schema(value_type = String)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionData {
    pub loading: bool,
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
    pub is_admin: bool,
}

impl From<&AuthSnapshot> for SessionData {
    fn from(snapshot: &AuthSnapshot) -> Self {
        Self {
            loading: snapshot.loading,
            identity: snapshot.identity.clone(),
            profile: snapshot.profile.clone(),
            is_admin: snapshot.is_admin,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeWidgetData {
    pub widget_id: Uuid,
    pub container_id: String,
    pub site_key: String,
    pub size: ChallengeSize,
    pub armed: bool,
}

impl From<&ChallengeHandle> for ChallengeWidgetData {
    fn from(handle: &ChallengeHandle) -> Self {
        Self {
            widget_id: handle.widget_id(),
            container_id: handle.anchor().container_id().to_string(),
            site_key: handle.site_key().to_string(),
            size: handle.size(),
            armed: handle.is_armed(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoginStep {
    Idle,
    CodeSent,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginFormData {
    pub form_id: Uuid,
    pub step: LoginStep,
    pub phone_number: Option<String>,
    pub code_sent_at: Option<DateTime<Utc>>,
    pub challenge: Option<ChallengeWidgetData>,
}

impl From<&LoginForm> for LoginFormData {
    fn from(form: &LoginForm) -> Self {
        let (step, phone_number, code_sent_at) = match form.flow().state() {
            OtpState::Idle => (LoginStep::Idle, None, None),
            OtpState::CodeSent(pending) => (
                LoginStep::CodeSent,
                Some(pending.phone_number().to_string()),
                Some(pending.sent_at()),
            ),
        };
        Self {
            form_id: form.id(),
            step,
            phone_number,
            code_sent_at,
            challenge: form.challenge_handle().map(ChallengeWidgetData::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MountLoginFormData {
    pub decision: GuardDecision,
    pub form: Option<LoginFormData>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInData {
    pub session: SessionData,
    pub decision: GuardDecision,
}
