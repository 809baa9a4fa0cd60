use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use uuid::Uuid;

use super::challenge::{ChallengeAnchor, ChallengeIssuer};
use super::errors::OtpError;
use super::form::LoginForm;
use super::guard::{AuthObserver, AuthSnapshot, IdentityChange};
use super::resolver::AuthorizationResolver;
use crate::constants::MAX_LOGIN_FORMS_PER_SESSION;
use crate::identity_client::Identity;

/// Owner of a mounted login form. Outstanding operations hold the lock; a detached
/// slot has been unmounted and its results are ignored.
#[derive(Debug)]
pub struct LoginFormSlot {
    mount_order: u64,
    detached: AtomicBool,
    form: AsyncMutex<LoginForm>,
}

impl LoginFormSlot {
    fn new(form: LoginForm, mount_order: u64) -> Self {
        Self {
            mount_order,
            detached: AtomicBool::new(false),
            form: AsyncMutex::new(form),
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Rejects instead of queueing when another send/confirm is outstanding.
    pub fn try_lock(&self) -> Result<AsyncMutexGuard<'_, LoginForm>, OtpError> {
        if self.is_detached() {
            return Err(OtpError::FormClosed);
        }
        self.form
            .try_lock()
            .map_err(|_| OtpError::OperationInProgress)
    }

    /// Marks the slot detached and disposes its widget now, or as soon as the
    /// outstanding operation releases the form.
    pub fn detach(&self, issuer: &dyn ChallengeIssuer) {
        self.detached.store(true, Ordering::SeqCst);
        if let Ok(mut form) = self.form.try_lock() {
            form.unmount(issuer);
        }
    }
}

pub struct Session {
    id: Uuid,
    expires_at: DateTime<Utc>,
    identity_tx: watch::Sender<IdentityChange>,
    auth_rx: watch::Receiver<AuthSnapshot>,
    forms: Mutex<HashMap<Uuid, Arc<LoginFormSlot>>>,
    mounts: AtomicU64,
}

impl Session {
    fn open(id: Uuid, expires_at: DateTime<Utc>, resolver: Arc<AuthorizationResolver>) -> Self {
        let (identity_tx, identity_rx) = watch::channel(IdentityChange::default());
        let auth_rx = AuthObserver::spawn(identity_rx, resolver);
        Self {
            id,
            expires_at,
            identity_tx,
            auth_rx,
            forms: Mutex::new(HashMap::new()),
            mounts: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity_tx.borrow().identity.clone()
    }

    fn publish(&self, identity: Option<Identity>) -> u64 {
        let mut revision = 0;
        self.identity_tx.send_modify(|change| {
            change.revision += 1;
            change.identity = identity;
            revision = change.revision;
        });
        revision
    }

    #[tracing::instrument(name = "Session sign in", skip(self, identity), fields(session_id = %self.id, identity_id = %identity.id))]
    pub fn sign_in(&self, identity: Identity) -> u64 {
        self.publish(Some(identity))
    }

    #[tracing::instrument(name = "Session sign out", skip(self), fields(session_id = %self.id))]
    pub fn sign_out(&self) -> u64 {
        self.publish(None)
    }

    /// Re-runs authorization for the current identity.
    pub fn refresh(&self) -> u64 {
        let identity = self.identity();
        self.publish(identity)
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.auth_rx.clone()
    }

    pub fn current(&self) -> AuthSnapshot {
        self.auth_rx.borrow().clone()
    }

    /// Waits until the snapshot reflects the latest identity change and is no longer loading.
    /// After `wait` the error carries a loading snapshot, never one older than that change.
    pub async fn settled(&self, wait: Duration) -> Result<AuthSnapshot, AuthSnapshot> {
        let target = self.identity_tx.borrow().revision;
        let mut rx = self.subscribe();
        let outcome = tokio::time::timeout(
            wait,
            rx.wait_for(|s| s.revision >= target && !s.loading),
        )
        .await;
        match outcome {
            Ok(Ok(snapshot)) => Ok(snapshot.clone()),
            _ => {
                let current = self.current();
                if current.revision < target {
                    Err(AuthSnapshot::pending(target, self.identity()))
                } else {
                    Err(current)
                }
            }
        }
    }

    /// Mounts a new form. Past the per-session limit the oldest form is unmounted.
    pub fn mount_form(
        &self,
        anchor: ChallengeAnchor,
        otp_timeout: Duration,
        issuer: &dyn ChallengeIssuer,
    ) -> (Uuid, Arc<LoginFormSlot>) {
        let form = LoginForm::new(anchor, otp_timeout);
        let form_id = form.id();
        let mount_order = self.mounts.fetch_add(1, Ordering::SeqCst);
        let slot = Arc::new(LoginFormSlot::new(form, mount_order));
        let mut evicted = vec![];
        if let Ok(mut forms) = self.forms.lock() {
            while forms.len() >= MAX_LOGIN_FORMS_PER_SESSION {
                let oldest = forms
                    .iter()
                    .min_by_key(|(_, slot)| slot.mount_order)
                    .map(|(id, _)| *id);
                match oldest.and_then(|id| forms.remove(&id)) {
                    Some(slot) => evicted.push(slot),
                    None => break,
                }
            }
            forms.insert(form_id, slot.clone());
        }
        for old in evicted {
            tracing::debug!(session_id = %self.id, "Unmounting oldest login form");
            old.detach(issuer);
        }
        (form_id, slot)
    }

    pub fn form_count(&self) -> usize {
        self.forms.lock().map(|forms| forms.len()).unwrap_or_default()
    }

    pub fn form(&self, form_id: &Uuid) -> Option<Arc<LoginFormSlot>> {
        self.forms
            .lock()
            .ok()
            .and_then(|forms| forms.get(form_id).cloned())
    }

    pub fn unmount_form(&self, form_id: &Uuid, issuer: &dyn ChallengeIssuer) -> bool {
        let slot = self
            .forms
            .lock()
            .ok()
            .and_then(|mut forms| forms.remove(form_id));
        match slot {
            Some(slot) => {
                slot.detach(issuer);
                true
            }
            None => false,
        }
    }

    fn unmount_all(&self, issuer: &dyn ChallengeIssuer) {
        let slots: Vec<_> = match self.forms.lock() {
            Ok(mut forms) => forms.drain().map(|(_, slot)| slot).collect(),
            Err(_) => vec![],
        };
        for slot in slots {
            slot.detach(issuer);
        }
    }
}

/// In-process registry of browser sessions.
pub struct SessionHub {
    sessions: Mutex<HashMap<Uuid, Arc<Session>>>,
    resolver: Arc<AuthorizationResolver>,
    issuer: Arc<dyn ChallengeIssuer>,
    ttl: chrono::Duration,
}

impl SessionHub {
    pub fn new(
        resolver: Arc<AuthorizationResolver>,
        issuer: Arc<dyn ChallengeIssuer>,
        ttl_hours: i64,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            resolver,
            issuer,
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }

    pub fn issuer(&self) -> &Arc<dyn ChallengeIssuer> {
        &self.issuer
    }

    pub fn open(&self) -> Arc<Session> {
        let session = Arc::new(Session::open(
            Uuid::new_v4(),
            Utc::now() + self.ttl,
            self.resolver.clone(),
        ));
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(session.id(), session.clone());
        }
        tracing::info!(session_id = %session.id(), "Session opened");
        session
    }

    pub fn get(&self, session_id: &Uuid) -> Option<Arc<Session>> {
        let session = self
            .sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(session_id).cloned())?;
        if session.is_expired() {
            self.close(session_id);
            return None;
        }
        Some(session)
    }

    pub fn close(&self, session_id: &Uuid) -> bool {
        let session = self
            .sessions
            .lock()
            .ok()
            .and_then(|mut sessions| sessions.remove(session_id));
        match session {
            Some(session) => {
                session.unmount_all(self.issuer.as_ref());
                true
            }
            None => false,
        }
    }

    /// Re-resolves every session signed in as `identity_id`, after a role change.
    pub fn refresh_identity(&self, identity_id: &str) -> usize {
        let sessions: Vec<Arc<Session>> = match self.sessions.lock() {
            Ok(sessions) => sessions.values().cloned().collect(),
            Err(_) => return 0,
        };
        sessions
            .iter()
            .filter(|s| s.identity().is_some_and(|i| i.id == identity_id))
            .map(|s| s.refresh())
            .count()
    }

    #[tracing::instrument(name = "Prune expired sessions", skip(self))]
    pub fn prune(&self) -> usize {
        let expired: Vec<Arc<Session>> = match self.sessions.lock() {
            Ok(mut sessions) => {
                let ids: Vec<Uuid> = sessions
                    .iter()
                    .filter(|(_, s)| s.is_expired())
                    .map(|(id, _)| *id)
                    .collect();
                ids.iter().filter_map(|id| sessions.remove(id)).collect()
            }
            Err(_) => vec![],
        };
        for session in &expired {
            session.unmount_all(self.issuer.as_ref());
        }
        if !expired.is_empty() {
            tracing::info!("Pruned {} expired sessions", expired.len());
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
