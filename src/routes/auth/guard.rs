use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use utoipa::ToSchema;

use super::resolver::{AuthorizationResolver, Resolution, ResolutionError};
use super::schemas::UserProfile;
use crate::constants::{ADMIN_PATH_PREFIX, DASHBOARD_PATH, LOGIN_PATH};
use crate::identity_client::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    Login,
    AdminOnly,
}

impl RouteKind {
    pub fn classify(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        if path == LOGIN_PATH {
            RouteKind::Login
        } else if path == ADMIN_PATH_PREFIX
            || path
                .strip_prefix(ADMIN_PATH_PREFIX)
                .is_some_and(|rest| rest.starts_with('/'))
        {
            RouteKind::AdminOnly
        } else {
            RouteKind::Public
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GuardDecision {
    Loading,
    Redirect { target: String },
    Render,
}

/// Latest identity as published by a session. `revision` grows with every change.
#[derive(Debug, Clone, Default)]
pub struct IdentityChange {
    pub revision: u64,
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub revision: u64,
    pub loading: bool,
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
    pub is_admin: bool,
}

impl AuthSnapshot {
    pub fn initial() -> Self {
        Self {
            revision: 0,
            loading: true,
            identity: None,
            profile: None,
            is_admin: false,
        }
    }

    /// Stands in for a change the observer has not picked up yet.
    pub fn pending(revision: u64, identity: Option<Identity>) -> Self {
        Self {
            revision,
            loading: true,
            identity,
            profile: None,
            is_admin: false,
        }
    }

    pub fn signed_out(revision: u64) -> Self {
        Self {
            revision,
            loading: false,
            identity: None,
            profile: None,
            is_admin: false,
        }
    }
}

pub fn decide(route: RouteKind, snapshot: &AuthSnapshot) -> GuardDecision {
    match route {
        RouteKind::Public => GuardDecision::Render,
        _ if snapshot.loading => GuardDecision::Loading,
        RouteKind::Login => {
            if snapshot.identity.is_some() && snapshot.is_admin {
                GuardDecision::Redirect {
                    target: DASHBOARD_PATH.to_string(),
                }
            } else {
                GuardDecision::Render
            }
        }
        RouteKind::AdminOnly => {
            if snapshot.identity.is_some() && snapshot.is_admin {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect {
                    target: LOGIN_PATH.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTicket {
    revision: u64,
    identity_id: String,
}

/// Folds identity changes and resolution results into the current snapshot.
/// Results computed for a superseded identity change are dropped.
#[derive(Debug)]
pub struct AuthTracker {
    snapshot: AuthSnapshot,
}

impl Default for AuthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthTracker {
    pub fn new() -> Self {
        Self {
            snapshot: AuthSnapshot::initial(),
        }
    }

    pub fn snapshot(&self) -> &AuthSnapshot {
        &self.snapshot
    }

    pub fn identity_changed(&mut self, change: IdentityChange) -> Option<(ResolutionTicket, Identity)> {
        match change.identity {
            None => {
                self.snapshot = AuthSnapshot::signed_out(change.revision);
                None
            }
            Some(identity) => {
                self.snapshot = AuthSnapshot {
                    revision: change.revision,
                    loading: true,
                    identity: Some(identity.clone()),
                    profile: None,
                    is_admin: false,
                };
                let ticket = ResolutionTicket {
                    revision: change.revision,
                    identity_id: identity.id.clone(),
                };
                Some((ticket, identity))
            }
        }
    }

    /// Returns `false` when the result was stale and discarded.
    pub fn apply(
        &mut self,
        ticket: &ResolutionTicket,
        outcome: Result<Resolution, ResolutionError>,
    ) -> bool {
        let current_id = self.snapshot.identity.as_ref().map(|i| i.id.as_str());
        if ticket.revision != self.snapshot.revision
            || current_id != Some(ticket.identity_id.as_str())
        {
            tracing::debug!(
                ticket_revision = ticket.revision,
                current_revision = self.snapshot.revision,
                "Discarding stale authorization result"
            );
            return false;
        }
        match outcome {
            Ok(resolution) => {
                self.snapshot.loading = false;
                self.snapshot.is_admin = resolution.is_admin;
                self.snapshot.profile = Some(resolution.profile);
            }
            Err(e) => {
                tracing::error!(identity_id = %ticket.identity_id, "Treating identity as signed out: {:?}", e);
                self.snapshot = AuthSnapshot::signed_out(ticket.revision);
            }
        }
        true
    }
}

pub struct AuthObserver;

impl AuthObserver {
    /// Watches `identities` and publishes derived snapshots until the sender side is dropped.
    pub fn spawn(
        mut identities: watch::Receiver<IdentityChange>,
        resolver: Arc<AuthorizationResolver>,
    ) -> watch::Receiver<AuthSnapshot> {
        let (snapshot_tx, snapshot_rx) = watch::channel(AuthSnapshot::initial());
        tokio::spawn(async move {
            let mut tracker = AuthTracker::new();
            let (result_tx, mut result_rx) =
                mpsc::unbounded_channel::<(ResolutionTicket, Result<Resolution, ResolutionError>)>();

            let dispatch = |tracker: &mut AuthTracker, change: IdentityChange| {
                if let Some((ticket, identity)) = tracker.identity_changed(change) {
                    let resolver = resolver.clone();
                    let result_tx = result_tx.clone();
                    tokio::spawn(async move {
                        let outcome = resolver.resolve(&identity).await;
                        let _ = result_tx.send((ticket, outcome));
                    });
                }
            };

            let initial = identities.borrow_and_update().clone();
            dispatch(&mut tracker, initial);
            snapshot_tx.send_replace(tracker.snapshot().clone());

            loop {
                tokio::select! {
                    changed = identities.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let change = identities.borrow_and_update().clone();
                        dispatch(&mut tracker, change);
                        snapshot_tx.send_replace(tracker.snapshot().clone());
                    }
                    Some((ticket, outcome)) = result_rx.recv() => {
                        if tracker.apply(&ticket, outcome) {
                            snapshot_tx.send_replace(tracker.snapshot().clone());
                        }
                    }
                }
            }
        });
        snapshot_rx
    }
}
