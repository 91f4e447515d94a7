//! Session persistence and token responses.
//!
//! The signed-in session survives a reload through a [`SessionStorage`]:
//! browser `localStorage` on WASM, a JSON file under the platform data
//! directory on native targets.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use store::{AuthUser, Session};

use crate::error::SupabaseError;

/// Body of a successful `/token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: self
                .expires_at
                .or(self.expires_in.map(|secs| now.timestamp() + secs)),
            user: self.user,
        }
    }
}

/// Where the session handle is kept between page loads.
#[derive(Debug, Clone)]
pub enum SessionStorage {
    #[cfg(target_arch = "wasm32")]
    LocalStorage { key: String },
    File { path: PathBuf },
    /// Nothing is persisted.
    Disabled,
}

impl SessionStorage {
    /// The natural storage for the current platform.
    pub fn platform(key: &str) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            SessionStorage::LocalStorage { key: key.to_string() }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            match dirs::data_dir() {
                Some(dir) => SessionStorage::File {
                    path: dir.join("campusskill").join(format!("{key}.json")),
                },
                None => {
                    tracing::warn!("no data directory; session will not persist");
                    SessionStorage::Disabled
                }
            }
        }
    }

    /// The persisted session, if one is stored and readable.
    pub fn load(&self) -> Option<Session> {
        let raw = match self.read() {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable persisted session");
                self.clear();
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), SupabaseError> {
        let raw = serde_json::to_string(session)?;
        self.write(Some(&raw))
    }

    pub fn clear(&self) {
        if let Err(e) = self.write(None) {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
    }

    fn read(&self) -> Result<Option<String>, SupabaseError> {
        match self {
            #[cfg(target_arch = "wasm32")]
            SessionStorage::LocalStorage { key } => local_storage()?
                .get_item(key)
                .map_err(|_| SupabaseError::Storage("localStorage read failed".to_string())),
            SessionStorage::File { path } => match std::fs::read_to_string(path) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(SupabaseError::Storage(e.to_string())),
            },
            SessionStorage::Disabled => Ok(None),
        }
    }

    fn write(&self, raw: Option<&str>) -> Result<(), SupabaseError> {
        match self {
            #[cfg(target_arch = "wasm32")]
            SessionStorage::LocalStorage { key } => {
                let storage = local_storage()?;
                let result = match raw {
                    Some(raw) => storage.set_item(key, raw),
                    None => storage.remove_item(key),
                };
                result.map_err(|_| SupabaseError::Storage("localStorage write failed".to_string()))
            }
            SessionStorage::File { path } => {
                let result = match raw {
                    Some(raw) => path
                        .parent()
                        .map_or(Ok(()), std::fs::create_dir_all)
                        .and_then(|()| std::fs::write(path, raw)),
                    None => match std::fs::remove_file(path) {
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                        other => other,
                    },
                };
                result.map_err(|e| SupabaseError::Storage(e.to_string()))
            }
            SessionStorage::Disabled => Ok(()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, SupabaseError> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or_else(|| SupabaseError::Storage("localStorage unavailable".to_string()))
}
