//! [`SupabaseClient`]: the hosted backend behind [`store::Backend`].

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::{AuthEvent, AuthEvents, AuthSubscription, Backend, BackendError, Order, Session, Table};

use crate::auth::{parse_callback, AuthApi, SessionStorage};
use crate::config::SupabaseConfig;
use crate::error::SupabaseError;
use crate::rest::RestApi;

/// Seconds before expiry at which a session is already treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 10;

struct Inner {
    auth: AuthApi,
    rest: RestApi,
    session: RefCell<Option<Session>>,
    storage: SessionStorage,
    events: AuthEvents,
}

/// Client for the hosted auth service and REST tables.
///
/// Cheap to clone; clones share the session and the auth event channel.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Rc<Inner>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Self {
        let storage = SessionStorage::platform(&config.session_key);
        Self::with_storage(config, storage)
    }

    pub fn from_env() -> Result<Self, SupabaseError> {
        Ok(Self::new(SupabaseConfig::from_env()?))
    }

    pub fn with_storage(config: SupabaseConfig, storage: SessionStorage) -> Self {
        let http = reqwest::Client::new();
        Self {
            inner: Rc::new(Inner {
                auth: AuthApi::new(http.clone(), config.clone()),
                rest: RestApi::new(http, config),
                session: RefCell::new(None),
                storage,
                events: AuthEvents::new(),
            }),
        }
    }

    fn current(&self) -> Option<Session> {
        self.inner.session.borrow().clone()
    }

    fn access_token(&self) -> Option<String> {
        self.inner.session.borrow().as_ref().map(|s| s.access_token.clone())
    }

    /// Store, persist and announce a new session state.
    fn set_session(&self, session: Option<Session>, event: AuthEvent) {
        match &session {
            Some(session) => {
                if let Err(e) = self.inner.storage.save(session) {
                    tracing::warn!(error = %e, "failed to persist session");
                }
            }
            None => self.inner.storage.clear(),
        }
        *self.inner.session.borrow_mut() = session.clone();
        self.inner.events.emit(event, session);
    }

    /// Finish a magic-link sign-in from the redirect's URL fragment.
    ///
    /// Returns `Ok(None)` when the fragment carries no tokens. On success the
    /// session is persisted and `SIGNED_IN` is emitted.
    pub async fn redeem_callback(&self, fragment: &str) -> Result<Option<Session>, SupabaseError> {
        let Some(tokens) = parse_callback(fragment, Utc::now())? else {
            return Ok(None);
        };
        let user = self.inner.auth.get_user(&tokens.access_token).await?;
        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at: tokens.expires_at,
            user,
        };
        tracing::info!(user_id = %session.user.id, "magic link redeemed");
        self.set_session(Some(session.clone()), AuthEvent::SignedIn);
        Ok(Some(session))
    }

    async fn restore_session(&self) -> Option<Session> {
        let session = self.current().or_else(|| self.inner.storage.load())?;
        let deadline = Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS);
        if !session.is_expired(deadline) {
            *self.inner.session.borrow_mut() = Some(session.clone());
            return Some(session);
        }

        match self.inner.auth.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => {
                tracing::debug!(user_id = %refreshed.user.id, "session refreshed");
                self.set_session(Some(refreshed.clone()), AuthEvent::TokenRefreshed);
                Some(refreshed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed; signing out locally");
                self.inner.storage.clear();
                *self.inner.session.borrow_mut() = None;
                None
            }
        }
    }
}

impl Backend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.restore_session().await)
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.inner.events.subscribe()
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), BackendError> {
        Ok(self.inner.auth.send_magic_link(email).await?)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let result = match self.access_token() {
            Some(token) => self.inner.auth.logout(&token).await,
            None => Ok(()),
        };
        self.set_session(None, AuthEvent::SignedOut);
        Ok(result?)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        order: Option<Order>,
    ) -> Result<Vec<T>, BackendError> {
        let token = self.access_token();
        Ok(self.inner.rest.select(table, order, token.as_deref()).await?)
    }

    async fn insert<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<(), BackendError> {
        let token = self.access_token();
        Ok(self.inner.rest.insert(table, rows, token.as_deref()).await?)
    }

    async fn upsert<T: Serialize>(&self, table: Table, row: &T) -> Result<(), BackendError> {
        let token = self.access_token();
        Ok(self.inner.rest.upsert(table, row, token.as_deref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{AuthUser, UserMetadata};

    fn config() -> SupabaseConfig {
        SupabaseConfig::new("http://127.0.0.1:9", "anon").unwrap()
    }

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_at,
            user: AuthUser {
                id: "0b6c".to_string(),
                email: Some("asha@college.edu".to_string()),
                user_metadata: UserMetadata::default(),
            },
        }
    }

    #[tokio::test]
    async fn test_get_session_restores_persisted_handle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::File { path: dir.path().join("session.json") };
        let stored = session(Some(Utc::now().timestamp() + 3600));
        storage.save(&stored).unwrap();

        let client = SupabaseClient::with_storage(config(), storage);
        assert_eq!(client.get_session().await.unwrap(), Some(stored));
        assert_eq!(client.access_token().as_deref(), Some("access"));
    }

    #[tokio::test]
    async fn test_get_session_without_handle() {
        let client = SupabaseClient::with_storage(config(), SessionStorage::Disabled);
        assert_eq!(client.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_persisted_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = SessionStorage::File { path: path.clone() };
        storage.save(&session(Some(0))).unwrap();

        // nothing listens on port 9, so the refresh request fails
        let client = SupabaseClient::with_storage(config(), storage);
        assert_eq!(client.get_session().await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_and_emits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = SessionStorage::File { path: path.clone() };
        let client = SupabaseClient::with_storage(config(), storage);
        client.set_session(Some(session(None)), AuthEvent::SignedIn);
        assert!(path.exists());

        let mut sub = client.on_auth_state_change();
        // the logout request fails, the local session is cleared anyway
        assert!(client.sign_out().await.is_err());
        assert_eq!(client.get_session().await.unwrap(), None);
        assert!(!path.exists());

        let change = sub.next().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.session.is_none());
    }

    #[tokio::test]
    async fn test_redeem_callback_error_fragment() {
        let client = SupabaseClient::with_storage(config(), SessionStorage::Disabled);
        let err = client
            .redeem_callback("#error=access_denied&error_description=Email+link+is+invalid+or+has+expired")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email link is invalid or has expired");
        assert!(client.redeem_callback("").await.unwrap().is_none());
    }
}
