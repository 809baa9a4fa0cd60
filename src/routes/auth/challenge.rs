use std::collections::HashSet;
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::configuration::ChallengeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSize {
    Invisible,
    Normal,
    Compact,
}

/// The page element a challenge widget renders into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeAnchor {
    container_id: String,
}

impl ChallengeAnchor {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into().trim().to_string(),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn is_mounted(&self) -> bool {
        !self.container_id.is_empty()
    }
}

/// Proof produced by a solved challenge, forwarded with a send request.
pub struct ChallengeToken(SecretString);

impl ChallengeToken {
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ChallengeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChallengeToken(..)")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("Recaptcha not ready. Please wait a moment and try again.")]
    NotReady,
    #[error("Verification challenge was already used. Reset it before trying again.")]
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Armed,
    Consumed,
}

/// One widget instance. Authorizes exactly one send until reset.
#[derive(Debug)]
pub struct ChallengeHandle {
    widget_id: Uuid,
    anchor: ChallengeAnchor,
    site_key: String,
    size: ChallengeSize,
    state: HandleState,
}

impl ChallengeHandle {
    pub fn widget_id(&self) -> Uuid {
        self.widget_id
    }

    pub fn anchor(&self) -> &ChallengeAnchor {
        &self.anchor
    }

    pub fn site_key(&self) -> &str {
        &self.site_key
    }

    pub fn size(&self) -> ChallengeSize {
        self.size
    }

    pub fn is_armed(&self) -> bool {
        self.state == HandleState::Armed
    }

    pub fn authorize(&mut self, response: Option<&str>) -> Result<ChallengeToken, ChallengeError> {
        if self.state == HandleState::Consumed {
            return Err(ChallengeError::Consumed);
        }
        let response = response
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(ChallengeError::NotReady)?;
        self.state = HandleState::Consumed;
        Ok(ChallengeToken(SecretString::from(response)))
    }

    pub fn reset(&mut self) {
        self.state = HandleState::Armed;
    }
}

pub trait ChallengeIssuer: Send + Sync {
    fn issue(&self, anchor: &ChallengeAnchor) -> Result<ChallengeHandle, ChallengeError>;

    fn dispose(&self, handle: ChallengeHandle);

    fn live_widgets(&self) -> usize;
}

/// Issues reCAPTCHA widget descriptors and tracks which ones are still rendered.
#[derive(Debug)]
pub struct RecaptchaChallengeIssuer {
    site_key: String,
    size: ChallengeSize,
    live: Mutex<HashSet<Uuid>>,
}

impl RecaptchaChallengeIssuer {
    pub fn new(settings: &ChallengeSettings) -> Self {
        Self {
            site_key: settings.site_key.trim().to_string(),
            size: settings.size,
            live: Mutex::new(HashSet::new()),
        }
    }
}

impl ChallengeIssuer for RecaptchaChallengeIssuer {
    fn issue(&self, anchor: &ChallengeAnchor) -> Result<ChallengeHandle, ChallengeError> {
        if self.site_key.is_empty() || !anchor.is_mounted() {
            return Err(ChallengeError::NotReady);
        }
        let widget_id = Uuid::new_v4();
        self.live
            .lock()
            .map_err(|_| ChallengeError::NotReady)?
            .insert(widget_id);
        tracing::debug!(%widget_id, container_id = anchor.container_id(), "Challenge widget issued");
        Ok(ChallengeHandle {
            widget_id,
            anchor: anchor.clone(),
            site_key: self.site_key.clone(),
            size: self.size,
            state: HandleState::Armed,
        })
    }

    fn dispose(&self, handle: ChallengeHandle) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&handle.widget_id);
        }
        tracing::debug!(widget_id = %handle.widget_id, "Challenge widget disposed");
    }

    fn live_widgets(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or_default()
    }
}
