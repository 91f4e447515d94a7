//! The contract between the marketplace and its hosted backend.
//!
//! A [`Backend`] bundles the two collaborators the page talks to: the auth
//! provider (magic-link sign-in, session issuance, change notifications) and
//! the row store (`select` / `insert` / `upsert` per table). The production
//! implementation lives in the `api` crate; [`crate::MemoryBackend`] is the
//! in-process one used by tests and the offline fallback.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{AuthChange, AuthEvent, Order, Session, Table};

/// Failure reported by the backend, carrying the provider's message.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    /// HTTP status when the failure came from a response.
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Auth provider plus row store, as seen by the marketplace.
pub trait Backend {
    /// The current session, restored from a persisted handle if needed.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Subscribe to auth state changes. Dropping the subscription unsubscribes.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Ask the provider to email a one-time sign-in link.
    async fn sign_in_with_otp(&self, email: &str) -> Result<(), BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// `select('*')` on a table with an optional ordering.
    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        order: Option<Order>,
    ) -> Result<Vec<T>, BackendError>;

    async fn insert<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<(), BackendError>;

    /// Insert-or-update keyed by the row's `id`.
    async fn upsert<T: Serialize>(&self, table: Table, row: &T) -> Result<(), BackendError>;
}

const AUTH_EVENT_CAPACITY: usize = 16;

/// Fan-out of auth state changes to every live [`AuthSubscription`].
#[derive(Clone, Debug)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthChange>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Deliver a change to current subscribers. Nobody listening is not an error.
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        tracing::debug!(?event, signed_in = session.is_some(), "auth state change");
        let _ = self.tx.send(AuthChange { event, session });
    }
}

/// A live subscription to auth state changes.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    /// Wait for the next change. Returns `None` once the backend is gone.
    pub async fn next(&mut self) -> Option<AuthChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth subscriber lagged; skipping missed events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let events = AuthEvents::new();
        let mut sub = events.subscribe();

        events.emit(AuthEvent::SignedIn, None);
        events.emit(AuthEvent::SignedOut, None);

        assert_eq!(sub.next().await.unwrap().event, AuthEvent::SignedIn);
        assert_eq!(sub.next().await.unwrap().event, AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_backend_dropped() {
        let events = AuthEvents::new();
        let mut sub = events.subscribe();
        drop(events);
        assert!(sub.next().await.is_none());
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let events = AuthEvents::new();
        events.emit(AuthEvent::SignedOut, None);
        let sub = events.subscribe();
        sub.unsubscribe();
        events.emit(AuthEvent::SignedOut, None);
    }
}
