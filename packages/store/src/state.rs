//! State containers owned by the marketplace.
//!
//! Each container has a narrow mutation API: caches are only ever replaced
//! wholesale, drafts are edited field by field and cleared.

use std::collections::HashMap;

use crate::models::{NewService, Profile, Service, Session};

/// The current signed-in identity, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    session: Option<Session>,
}

impl SessionState {
    pub fn get(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn replace(&mut self, session: Option<Session>) {
        self.session = session;
    }

    pub fn clear(&mut self) {
        self.session = None;
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user.id.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.user.email.as_deref())
    }
}

/// Profiles keyed by user id. A snapshot, not a live view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileCache {
    profiles: HashMap<String, Profile>,
}

impl ProfileCache {
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Drop every cached profile and index `profiles` by id.
    pub fn replace_all(&mut self, profiles: Vec<Profile>) {
        self.profiles = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
    }
}

impl FromIterator<Profile> for ProfileCache {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let mut cache = Self::default();
        cache.replace_all(iter.into_iter().collect());
        cache
    }
}

/// Services, newest first, plus whether a fetch is running.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    services: Vec<Service>,
    loading: bool,
}

impl Listing {
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn replace_all(&mut self, services: Vec<Service>) {
        self.services = services;
    }
}

/// The sign-in email input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignInForm {
    pub email: String,
}

impl SignInForm {
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }
}

/// Editable field of the post-service draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    Category,
    Price,
    Location,
}

/// The new-service form as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub location: String,
    /// An insert for this draft is in flight.
    pub submitting: bool,
}

impl ServiceDraft {
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Title => self.title = value,
            DraftField::Description => self.description = value,
            DraftField::Category => self.category = value,
            DraftField::Price => self.price = value,
            DraftField::Location => self.location = value,
        }
    }

    /// Reset every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Build the insert payload for `owner`.
    ///
    /// A non-empty price that does not parse to a finite number is sent as
    /// `null`.
    pub fn to_new_service(&self, owner: &str) -> NewService {
        let price = match self.price.trim() {
            "" => None,
            raw => raw.parse::<f64>().ok().filter(|p| p.is_finite()),
        };
        NewService {
            owner: owner.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            price,
            location: self.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(price: &str) -> ServiceDraft {
        let mut draft = ServiceDraft::default();
        draft.set(DraftField::Title, "Math Tutoring");
        draft.set(DraftField::Description, "Calculus, linear algebra");
        draft.set(DraftField::Category, "Tutoring");
        draft.set(DraftField::Price, price);
        draft
    }

    #[test]
    fn test_price_coercion() {
        assert_eq!(draft("250").to_new_service("u-1").price, Some(250.0));
        assert_eq!(draft(" 99.5 ").to_new_service("u-1").price, Some(99.5));
        assert_eq!(draft("").to_new_service("u-1").price, None);
        assert_eq!(draft("cheap").to_new_service("u-1").price, None);
        assert_eq!(draft("inf").to_new_service("u-1").price, None);
    }

    #[test]
    fn test_location_defaults_to_empty() {
        let payload = draft("10").to_new_service("u-1");
        assert_eq!(payload.location, "");
        assert_eq!(payload.owner, "u-1");
        assert_eq!(payload.title, "Math Tutoring");
    }

    #[test]
    fn test_clear_resets_every_field() {
        let mut d = draft("10");
        d.set(DraftField::Location, "Library");
        d.submitting = true;
        d.clear();
        assert_eq!(d, ServiceDraft::default());
    }

    #[test]
    fn test_profile_cache_replaces_wholesale() {
        let mut cache: ProfileCache = vec![
            Profile { id: "a".into(), full_name: Some("A".into()), created_at: None },
            Profile { id: "b".into(), full_name: None, created_at: None },
        ]
        .into_iter()
        .collect();
        assert_eq!(cache.len(), 2);

        cache.replace_all(vec![Profile { id: "c".into(), full_name: None, created_at: None }]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }
}
