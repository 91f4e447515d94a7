//! Platform backend constructor.
//!
//! Returns the hosted backend when it is configured, otherwise an in-memory
//! marketplace whose sign-in links confirm themselves, so the page is still
//! usable for local development.

use api::{SupabaseClient, SupabaseError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::{AuthSubscription, Backend, BackendError, MemoryBackend, Order, Session, Table};

#[derive(Clone)]
pub enum AppBackend {
    Hosted(SupabaseClient),
    Offline(MemoryBackend),
}

/// Pick the backend for this run.
pub fn make_backend() -> AppBackend {
    match SupabaseClient::from_env() {
        Ok(client) => AppBackend::Hosted(client),
        Err(e) => {
            tracing::warn!(error = %e, "hosted backend not configured; using in-memory marketplace");
            AppBackend::Offline(MemoryBackend::new().with_auto_confirm())
        }
    }
}

impl AppBackend {
    pub fn is_offline(&self) -> bool {
        matches!(self, AppBackend::Offline(_))
    }

    /// Finish a magic-link sign-in from the page's URL fragment.
    pub async fn redeem_callback(&self, fragment: &str) -> Result<Option<Session>, SupabaseError> {
        match self {
            AppBackend::Hosted(client) => client.redeem_callback(fragment).await,
            AppBackend::Offline(_) => Ok(None),
        }
    }
}

impl Backend for AppBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        match self {
            AppBackend::Hosted(b) => b.get_session().await,
            AppBackend::Offline(b) => b.get_session().await,
        }
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        match self {
            AppBackend::Hosted(b) => b.on_auth_state_change(),
            AppBackend::Offline(b) => b.on_auth_state_change(),
        }
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), BackendError> {
        match self {
            AppBackend::Hosted(b) => b.sign_in_with_otp(email).await,
            AppBackend::Offline(b) => b.sign_in_with_otp(email).await,
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        match self {
            AppBackend::Hosted(b) => b.sign_out().await,
            AppBackend::Offline(b) => b.sign_out().await,
        }
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        order: Option<Order>,
    ) -> Result<Vec<T>, BackendError> {
        match self {
            AppBackend::Hosted(b) => b.select(table, order).await,
            AppBackend::Offline(b) => b.select(table, order).await,
        }
    }

    async fn insert<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<(), BackendError> {
        match self {
            AppBackend::Hosted(b) => b.insert(table, rows).await,
            AppBackend::Offline(b) => b.insert(table, rows).await,
        }
    }

    async fn upsert<T: Serialize>(&self, table: Table, row: &T) -> Result<(), BackendError> {
        match self {
            AppBackend::Hosted(b) => b.upsert(table, row).await,
            AppBackend::Offline(b) => b.upsert(table, row).await,
        }
    }
}
