//! # Domain models for the marketplace
//!
//! Row types for the three backend tables plus the auth session. These types
//! are `Serialize + Deserialize` because they travel as JSON between the
//! client and the hosted backend.
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Profile`] | A row in `profiles`, one per user id. |
//! | [`Service`] | A row in `services`: a listing posted by its `owner`. |
//! | [`NewService`] | The insert payload built from the post-service draft. |
//! | [`Interest`] | A row in `interests`. Write-only from this client. |
//! | [`Session`] / [`AuthUser`] | The signed-in identity issued by the auth provider. |
//!
//! Text columns on [`Service`] tolerate `null` and decode it as an empty
//! string, so the view code never has to care.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Fixed message attached to every interest row.
pub const INTEREST_MESSAGE: &str = "Interested via campus app";

/// A backend table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Services,
    Interests,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Services => "services",
            Table::Interests => "interests",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering clause for a select, e.g. `created_at.desc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self { column, ascending: true }
    }

    pub fn desc(column: &'static str) -> Self {
        Self { column, ascending: false }
    }
}

/// Primary key of a service row.
///
/// The table may use an integer or a text (uuid) key; either way the value is
/// echoed back unchanged when an interest references it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceId::Int(id) => write!(f, "{id}"),
            ServiceId::Text(id) => f.write_str(id),
        }
    }
}

/// A row in the `profiles` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A row in the `services` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub owner: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new service. The backend fills in `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub owner: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Option<f64>,
    pub location: String,
}

/// A row in the `interests` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub service_id: ServiceId,
    pub user_id: String,
    pub message: String,
}

impl Interest {
    pub fn new(service_id: ServiceId, user_id: impl Into<String>) -> Self {
        Self {
            service_id,
            user_id: user_id.into(),
            message: INTEREST_MESSAGE.to_string(),
        }
    }
}

/// Free-form metadata the auth provider keeps per user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// The authenticated user carried by a [`Session`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    /// Name used for the user's profile: metadata name, then email, then id.
    pub fn display_name(&self) -> &str {
        self.user_metadata
            .full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref().filter(|email| !email.is_empty()))
            .unwrap_or(&self.id)
    }
}

/// A signed-in session as issued by the auth provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Whether the access token has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now.timestamp())
    }
}

/// Kind of auth state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// One notification from the auth provider: the event and the session after it.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_tolerates_null_columns() {
        let service: Service = serde_json::from_value(json!({
            "id": 7,
            "owner": "u-1",
            "title": "Math Tutoring",
            "description": null,
            "category": null,
            "price": null,
            "location": null,
            "created_at": "2024-03-01T10:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(service.id, ServiceId::Int(7));
        assert_eq!(service.description, "");
        assert_eq!(service.category, "");
        assert_eq!(service.location, "");
        assert!(service.price.is_none());
        assert!(service.created_at.is_some());
    }

    #[test]
    fn test_service_id_keeps_its_shape() {
        let text: ServiceId = serde_json::from_value(json!("9b2c")).unwrap();
        assert_eq!(text, ServiceId::Text("9b2c".to_string()));
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("9b2c"));

        let int: ServiceId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(serde_json::to_value(&int).unwrap(), json!(42));
        assert_eq!(int.to_string(), "42");
    }

    #[test]
    fn test_display_name_prefers_metadata() {
        let mut user = AuthUser {
            id: "u-1".to_string(),
            email: Some("asha@college.edu".to_string()),
            user_metadata: UserMetadata {
                full_name: Some("Asha Rao".to_string()),
            },
        };
        assert_eq!(user.display_name(), "Asha Rao");

        user.user_metadata.full_name = Some(String::new());
        assert_eq!(user.display_name(), "asha@college.edu");

        user.email = None;
        assert_eq!(user.display_name(), "u-1");
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let user = AuthUser {
            id: "u-1".to_string(),
            email: None,
            user_metadata: UserMetadata::default(),
        };
        let mut session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: default_token_type(),
            expires_at: None,
            user,
        };
        assert!(!session.is_expired(now));

        session.expires_at = Some(now.timestamp() - 1);
        assert!(session.is_expired(now));

        session.expires_at = Some(now.timestamp() + 3600);
        assert!(!session.is_expired(now));
    }

    #[test]
    fn test_interest_carries_fixed_message() {
        let interest = Interest::new(ServiceId::Int(3), "u-2");
        assert_eq!(
            serde_json::to_value(&interest).unwrap(),
            json!({ "service_id": 3, "user_id": "u-2", "message": "Interested via campus app" })
        );
    }
}
