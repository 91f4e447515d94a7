use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::{AuthEvents, AuthSubscription, Backend, BackendError};
use crate::models::{AuthEvent, AuthUser, Order, Session, Table, UserMetadata};

/// One request the backend received.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSession,
    SignInWithOtp,
    SignOut,
    Select(Table),
    Insert(Table),
    Upsert(Table),
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<Table, Vec<Value>>,
    calls: Vec<Operation>,
    otp_requests: Vec<String>,
    failures: HashMap<Operation, String>,
    session: Option<Session>,
    users: HashMap<String, String>,
    next_id: i64,
    ticks: i64,
    auto_confirm: bool,
}

impl State {
    /// Record a call and pop an injected failure for it, if any.
    fn record(&mut self, op: Operation) -> Result<(), BackendError> {
        self.calls.push(op.clone());
        match self.failures.remove(&op) {
            Some(message) => Err(BackendError::new(message)),
            None => Ok(()),
        }
    }

    /// Monotonic clock so that later inserts always sort as newer.
    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        epoch + Duration::seconds(self.ticks)
    }

    fn fill_defaults(&mut self, row: &mut Map<String, Value>) {
        if row.get("id").is_none_or(Value::is_null) {
            self.next_id += 1;
            row.insert("id".to_string(), Value::from(self.next_id));
        }
        if row.get("created_at").is_none_or(Value::is_null) {
            let ts = self.tick();
            row.insert("created_at".to_string(), Value::from(ts.to_rfc3339()));
        }
    }
}

/// In-memory [`Backend`] for tests and the offline fallback.
///
/// Rows live as JSON objects per table. Every request is appended to a call
/// log, and a failure can be armed for the next request of a given kind.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    events: AuthEvents,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign-in requests complete immediately instead of waiting for a link click.
    pub fn with_auto_confirm(self) -> Self {
        self.state().auto_confirm = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert rows directly, bypassing the call log.
    pub fn seed<T: Serialize>(&self, table: Table, rows: &[T]) {
        let mut state = self.state();
        for row in rows {
            if let Ok(Value::Object(mut obj)) = serde_json::to_value(row) {
                state.fill_defaults(&mut obj);
                state.tables.entry(table).or_default().push(Value::Object(obj));
            }
        }
    }

    /// Raw rows of a table in insertion order.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.state().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Every request received so far, oldest first.
    pub fn calls(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Emails for which a sign-in link was requested.
    pub fn otp_requests(&self) -> Vec<String> {
        self.state().otp_requests.clone()
    }

    /// Make the next request of kind `op` fail with `message`.
    pub fn fail_next(&self, op: Operation, message: impl Into<String>) {
        self.state().failures.insert(op, message.into());
    }

    /// Replace the current session without emitting an event, as if it had
    /// been restored from storage.
    pub fn set_session(&self, session: Option<Session>) {
        self.state().session = session;
    }

    /// Simulate the user clicking the emailed link.
    pub fn complete_sign_in(&self, email: &str) -> Session {
        let session = {
            let mut state = self.state();
            let next = state.users.len() + 1;
            let id = state
                .users
                .entry(email.to_string())
                .or_insert_with(|| format!("user-{next}"))
                .clone();
            let session = Session {
                access_token: format!("access-{id}"),
                refresh_token: format!("refresh-{id}"),
                token_type: "bearer".to_string(),
                expires_at: None,
                user: AuthUser {
                    id,
                    email: Some(email.to_string()),
                    user_metadata: UserMetadata::default(),
                },
            };
            state.session = Some(session.clone());
            session
        };
        self.events.emit(AuthEvent::SignedIn, Some(session.clone()));
        session
    }
}

fn compare_column(a: &Value, b: &Value, column: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let value = |row: &Value| row.get(column).filter(|v| !v.is_null()).cloned();
    match (value(a), value(b)) {
        (None, None) => Ordering::Equal,
        // NULLS LAST when ascending
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(&y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

impl Backend for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let mut state = self.state();
        state.record(Operation::GetSession)?;
        Ok(state.session.clone())
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), BackendError> {
        let auto_confirm = {
            let mut state = self.state();
            state.record(Operation::SignInWithOtp)?;
            state.otp_requests.push(email.to_string());
            state.auto_confirm
        };
        if auto_confirm {
            self.complete_sign_in(email);
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        {
            let mut state = self.state();
            state.record(Operation::SignOut)?;
            state.session = None;
        }
        self.events.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        order: Option<Order>,
    ) -> Result<Vec<T>, BackendError> {
        let mut rows = {
            let mut state = self.state();
            state.record(Operation::Select(table))?;
            state.tables.get(&table).cloned().unwrap_or_default()
        };
        if let Some(order) = order {
            if order.ascending {
                rows.sort_by(|a, b| compare_column(a, b, order.column));
            } else {
                rows.sort_by(|a, b| compare_column(b, a, order.column));
            }
        }
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| BackendError::new(e.to_string())))
            .collect()
    }

    async fn insert<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<(), BackendError> {
        let mut state = self.state();
        state.record(Operation::Insert(table))?;
        let mut encoded = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::to_value(row) {
                Ok(Value::Object(obj)) => encoded.push(obj),
                Ok(_) => return Err(BackendError::new("row must be a JSON object").with_status(400)),
                Err(e) => return Err(BackendError::new(e.to_string()).with_status(400)),
            }
        }
        for mut obj in encoded {
            state.fill_defaults(&mut obj);
            state.tables.entry(table).or_default().push(Value::Object(obj));
        }
        Ok(())
    }

    async fn upsert<T: Serialize>(&self, table: Table, row: &T) -> Result<(), BackendError> {
        let mut state = self.state();
        state.record(Operation::Upsert(table))?;
        let obj = match serde_json::to_value(row) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => return Err(BackendError::new("row must be a JSON object").with_status(400)),
            Err(e) => return Err(BackendError::new(e.to_string()).with_status(400)),
        };
        let Some(id) = obj.get("id").filter(|id| !id.is_null()).cloned() else {
            return Err(BackendError::new("upsert requires an id").with_status(400));
        };
        let rows = state.tables.entry(table).or_default();
        match rows.iter().position(|existing| existing.get("id") == Some(&id)) {
            Some(pos) => {
                if let Value::Object(existing) = &mut rows[pos] {
                    existing.extend(obj);
                }
            }
            None => rows.push(Value::Object(obj)),
        }
        Ok(())
    }
}
