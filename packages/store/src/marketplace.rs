//! # The marketplace controller
//!
//! [`Marketplace`] owns the state containers (session, profile cache,
//! listing, sign-in form, service draft) and runs every user action against a
//! [`Backend`]. It is the only writer of that state.
//!
//! ## Consistency
//!
//! The caches are snapshots. The one rule that keeps them fresh is that each
//! write which succeeds is followed by a full reload of what it touched:
//!
//! | Action | Post-condition on success |
//! |--------|---------------------------|
//! | auth change carrying a user | upsert that user's profile, then reload profiles (even if the upsert failed) |
//! | [`Marketplace::create_service`] | clear the draft, reload profiles then services |
//! | [`Marketplace::mark_interest`] | nothing; interests are never shown |
//!
//! Failed reads are logged and leave the previous snapshot in place. Failed
//! writes come back as a [`Notice`] carrying the provider's message.
//!
//! ## Borrowing
//!
//! State lives in `RefCell`s and is only borrowed between awaits, never
//! across one. Actions take `&self` so a single instance can be shared by
//! every component of the page.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;

use crate::backend::{AuthSubscription, Backend};
use crate::models::{AuthChange, AuthEvent, AuthUser, Interest, Order, Profile, Service, ServiceId, Session, Table};
use crate::state::{DraftField, Listing, ProfileCache, ServiceDraft, SessionState, SignInForm};
use crate::view::ListingView;

pub const MSG_ENTER_EMAIL: &str = "Enter email";
pub const MSG_CHECK_EMAIL: &str = "Check your email for the magic link.";
pub const MSG_SIGN_IN_FIRST: &str = "Sign in first";
pub const MSG_SIGN_IN_FOR_INTEREST: &str = "Sign in to show interest";
pub const MSG_INTEREST_RECORDED: &str = "Interest recorded — owner can view it.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A message the user has to acknowledge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

type Observer = Rc<dyn Fn()>;

pub struct Marketplace<B> {
    backend: B,
    session: RefCell<SessionState>,
    profiles: RefCell<ProfileCache>,
    listing: RefCell<Listing>,
    sign_in: RefCell<SignInForm>,
    draft: RefCell<ServiceDraft>,
    observer: RefCell<Option<Observer>>,
}

impl<B: Backend> Marketplace<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: RefCell::default(),
            profiles: RefCell::default(),
            listing: RefCell::default(),
            sign_in: RefCell::default(),
            draft: RefCell::default(),
            observer: RefCell::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Register the callback run after every state change.
    pub fn set_observer(&self, observer: impl Fn() + 'static) {
        *self.observer.borrow_mut() = Some(Rc::new(observer));
    }

    fn changed(&self) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            observer();
        }
    }

    // -- reads -------------------------------------------------------------

    pub fn session(&self) -> Option<Session> {
        self.session.borrow().get().cloned()
    }

    /// Email of the signed-in user, for the account bar.
    pub fn signed_in_email(&self) -> Option<String> {
        self.session.borrow().email().map(str::to_string)
    }

    pub fn profiles(&self) -> ProfileCache {
        self.profiles.borrow().clone()
    }

    pub fn services(&self) -> Vec<Service> {
        self.listing.borrow().services().to_vec()
    }

    pub fn loading(&self) -> bool {
        self.listing.borrow().loading()
    }

    pub fn sign_in_email(&self) -> String {
        self.sign_in.borrow().email.clone()
    }

    pub fn draft(&self) -> ServiceDraft {
        self.draft.borrow().clone()
    }

    /// The filtered, rendered listing for `query`.
    pub fn listing_view(&self, query: &str) -> ListingView {
        ListingView::compose(&self.listing.borrow(), &self.profiles.borrow(), query)
    }

    // -- form edits --------------------------------------------------------

    pub fn set_sign_in_email(&self, email: impl Into<String>) {
        self.sign_in.borrow_mut().set_email(email);
        self.changed();
    }

    pub fn set_draft_field(&self, field: DraftField, value: impl Into<String>) {
        self.draft.borrow_mut().set(field, value);
        self.changed();
    }

    // -- session -----------------------------------------------------------

    pub fn subscribe(&self) -> AuthSubscription {
        self.backend.on_auth_state_change()
    }

    /// Initial load: current session, then profiles and services.
    ///
    /// A restored session is applied as an `INITIAL_SESSION` auth change, so
    /// its profile is upserted (and profiles reloaded) before services load.
    pub async fn load(&self) {
        let session = match self.backend.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "failed to read current session");
                None
            }
        };
        if session.is_some() {
            self.handle_auth_change(AuthChange { event: AuthEvent::InitialSession, session })
                .await;
            self.fetch_services().await;
        } else {
            self.session.borrow_mut().clear();
            self.changed();
            self.fetch_all().await;
        }
    }

    /// Apply auth changes until the subscription ends.
    pub async fn listen(&self, mut subscription: AuthSubscription) {
        while let Some(change) = subscription.next().await {
            self.handle_auth_change(change).await;
        }
        tracing::debug!("auth subscription closed");
    }

    pub async fn handle_auth_change(&self, change: AuthChange) {
        tracing::info!(event = ?change.event, signed_in = change.session.is_some(), "session changed");
        let user = change.session.as_ref().map(|s| s.user.clone());
        self.session.borrow_mut().replace(change.session);
        self.changed();
        if let Some(user) = user {
            self.upsert_profile(&user).await;
        }
    }

    /// Request a magic link for the email in the sign-in form.
    ///
    /// Success does not touch local state; the session arrives later as an
    /// auth change once the link is clicked.
    pub async fn sign_in(&self) -> Notice {
        let email = self.sign_in_email().trim().to_string();
        if email.is_empty() {
            return Notice::warning(MSG_ENTER_EMAIL);
        }
        match self.backend.sign_in_with_otp(&email).await {
            Ok(()) => Notice::success(MSG_CHECK_EMAIL),
            Err(e) => Notice::error(e.message),
        }
    }

    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.sign_out().await {
            tracing::error!(error = %e, "sign-out request failed");
        }
        self.session.borrow_mut().clear();
        self.changed();
    }

    // -- profiles ----------------------------------------------------------

    pub async fn fetch_profiles(&self) {
        match self.backend.select::<Profile>(Table::Profiles, None).await {
            Ok(profiles) => {
                self.profiles.borrow_mut().replace_all(profiles);
                self.changed();
            }
            Err(e) => tracing::error!(error = %e, "failed to fetch profiles"),
        }
    }

    /// Create or refresh the profile row for `user`, then reload profiles
    /// whether or not the upsert went through.
    pub async fn upsert_profile(&self, user: &AuthUser) {
        let profile = Profile {
            id: user.id.clone(),
            full_name: Some(user.display_name().to_string()),
            created_at: Some(Utc::now()),
        };
        if let Err(e) = self.backend.upsert(Table::Profiles, &profile).await {
            tracing::error!(error = %e, user_id = %user.id, "failed to upsert profile");
        }
        self.fetch_profiles().await;
    }

    // -- services ----------------------------------------------------------

    pub async fn fetch_services(&self) {
        self.listing.borrow_mut().set_loading(true);
        self.changed();
        match self
            .backend
            .select::<Service>(Table::Services, Some(Order::desc("created_at")))
            .await
        {
            Ok(services) => self.listing.borrow_mut().replace_all(services),
            Err(e) => tracing::error!(error = %e, "failed to fetch services"),
        }
        self.listing.borrow_mut().set_loading(false);
        self.changed();
    }

    /// Profiles first, then services.
    pub async fn fetch_all(&self) {
        self.fetch_profiles().await;
        self.fetch_services().await;
    }

    /// Post the current draft as a new service.
    ///
    /// Returns a notice when the user has to be told something; `None` on
    /// success or when an earlier submission is still in flight. Dropping
    /// that second submission is deliberate: the form never sends a draft twice.
    pub async fn create_service(&self) -> Option<Notice> {
        let Some(owner) = self.session.borrow().user_id().map(str::to_string) else {
            return Some(Notice::warning(MSG_SIGN_IN_FIRST));
        };
        let payload = {
            let mut draft = self.draft.borrow_mut();
            if draft.submitting {
                tracing::debug!("ignoring duplicate submission");
                return None;
            }
            draft.submitting = true;
            draft.to_new_service(&owner)
        };
        self.changed();

        let result = self.backend.insert(Table::Services, &[payload]).await;
        self.draft.borrow_mut().submitting = false;
        match result {
            Err(e) => {
                self.changed();
                Some(Notice::error(format!("Error: {}", e.message)))
            }
            Ok(()) => {
                self.draft.borrow_mut().clear();
                self.changed();
                self.fetch_all().await;
                None
            }
        }
    }

    pub async fn mark_interest(&self, service_id: ServiceId) -> Notice {
        let Some(user_id) = self.session.borrow().user_id().map(str::to_string) else {
            return Notice::warning(MSG_SIGN_IN_FOR_INTEREST);
        };
        let interest = Interest::new(service_id, user_id);
        match self.backend.insert(Table::Interests, &[interest]).await {
            Ok(()) => Notice::success(MSG_INTEREST_RECORDED),
            Err(e) => Notice::error(format!("Error: {}", e.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::memory::{MemoryBackend, Operation};
    use serde_json::json;

    fn market() -> (Marketplace<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        (Marketplace::new(backend.clone()), backend)
    }

    async fn signed_in(market: &Marketplace<MemoryBackend>, backend: &MemoryBackend) -> Session {
        let mut sub = market.subscribe();
        backend.complete_sign_in("asha@college.edu");
        let change = sub.next().await.unwrap();
        market.handle_auth_change(change.clone()).await;
        backend.clear_calls();
        change.session.unwrap()
    }

    fn fill_draft(market: &Marketplace<MemoryBackend>) {
        market.set_draft_field(DraftField::Title, "Math Tutoring");
        market.set_draft_field(DraftField::Description, "Calculus and algebra");
        market.set_draft_field(DraftField::Category, "Tutoring");
        market.set_draft_field(DraftField::Price, "200");
    }

    #[tokio::test]
    async fn test_load_without_session_fetches_everything() {
        let (market, backend) = market();
        backend.seed(Table::Services, &[json!({ "owner": "user-1", "title": "Old" })]);
        backend.seed(Table::Services, &[json!({ "owner": "user-1", "title": "New" })]);

        market.load().await;

        assert!(market.session().is_none());
        assert_eq!(
            backend.calls(),
            vec![
                Operation::GetSession,
                Operation::Select(Table::Profiles),
                Operation::Select(Table::Services),
            ]
        );
        let titles: Vec<_> = market.services().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
        assert!(!market.loading());
    }

    #[tokio::test]
    async fn test_load_upserts_profile_for_restored_session() {
        let (market, backend) = market();
        let session = backend.complete_sign_in("ravi@college.edu");
        backend.clear_calls();
        let _sub = market.subscribe();

        market.load().await;

        assert_eq!(market.session(), Some(session));
        assert_eq!(
            backend.calls(),
            vec![
                Operation::GetSession,
                Operation::Upsert(Table::Profiles),
                Operation::Select(Table::Profiles),
                Operation::Select(Table::Services),
            ]
        );
        let profiles = market.profiles();
        let profile = profiles.get("user-1").unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("ravi@college.edu"));
    }

    #[tokio::test]
    async fn test_load_applies_session_restored_from_storage() {
        let (market, backend) = market();
        let session = Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_at: None,
            user: AuthUser {
                id: "user-9".to_string(),
                email: Some("meera@college.edu".to_string()),
                user_metadata: Default::default(),
            },
        };
        backend.set_session(Some(session.clone()));

        market.load().await;

        assert_eq!(market.session(), Some(session));
        assert_eq!(backend.rows(Table::Profiles).len(), 1);
        assert_eq!(backend.rows(Table::Profiles)[0]["id"], "user-9");
    }

    #[tokio::test]
    async fn test_auth_change_upserts_profile_once_then_refetches() {
        let (market, backend) = market();
        let mut sub = market.subscribe();
        backend.complete_sign_in("asha@college.edu");

        let change = sub.next().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedIn);
        market.handle_auth_change(change).await;

        assert_eq!(
            backend.calls(),
            vec![Operation::Upsert(Table::Profiles), Operation::Select(Table::Profiles)]
        );
        let profiles = market.profiles();
        let profile = profiles.get("user-1").unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("asha@college.edu"));
        assert_eq!(market.signed_in_email().as_deref(), Some("asha@college.edu"));
    }

    #[tokio::test]
    async fn test_failed_profile_upsert_still_refetches() {
        let (market, backend) = market();
        backend.fail_next(Operation::Upsert(Table::Profiles), "permission denied");
        let mut sub = market.subscribe();
        backend.complete_sign_in("asha@college.edu");
        market.handle_auth_change(sub.next().await.unwrap()).await;

        assert_eq!(
            backend.calls(),
            vec![Operation::Upsert(Table::Profiles), Operation::Select(Table::Profiles)]
        );
        assert!(market.profiles().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_event_issues_no_requests() {
        let (market, backend) = market();
        signed_in(&market, &backend).await;

        market
            .handle_auth_change(AuthChange { event: AuthEvent::SignedOut, session: None })
            .await;
        assert!(market.session().is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reads_keep_stale_snapshot() {
        let (market, backend) = market();
        backend.seed(Table::Services, &[json!({ "owner": "u-1", "title": "Bike Repair" })]);
        backend.seed(Table::Profiles, &[json!({ "id": "u-1", "full_name": "Ravi" })]);
        market.fetch_all().await;
        assert_eq!(market.services().len(), 1);

        backend.seed(Table::Services, &[json!({ "owner": "u-1", "title": "Laundry" })]);
        backend.fail_next(Operation::Select(Table::Services), "timeout");
        backend.fail_next(Operation::Select(Table::Profiles), "timeout");
        market.fetch_all().await;

        assert_eq!(market.services().len(), 1);
        assert_eq!(market.profiles().len(), 1);
        assert!(!market.loading());
    }

    #[tokio::test]
    async fn test_sign_in_requires_email() {
        let (market, backend) = market();
        let notice = market.sign_in().await;
        assert_eq!(notice, Notice::warning("Enter email"));

        market.set_sign_in_email("   ");
        assert_eq!(market.sign_in().await.message, "Enter email");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_requests_link_without_state_change() {
        let (market, backend) = market();
        market.set_sign_in_email("asha@college.edu");

        let notice = market.sign_in().await;
        assert_eq!(notice, Notice::success("Check your email for the magic link."));
        assert_eq!(backend.otp_requests(), vec!["asha@college.edu".to_string()]);
        assert!(market.session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_surfaces_provider_error() {
        let (market, backend) = market();
        backend.fail_next(Operation::SignInWithOtp, "Email rate limit exceeded");
        market.set_sign_in_email("asha@college.edu");

        let notice = market.sign_in().await;
        assert_eq!(notice, Notice::error("Email rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_on_failure() {
        let (market, backend) = market();
        signed_in(&market, &backend).await;
        backend.fail_next(Operation::SignOut, "network down");

        market.sign_out().await;
        assert!(market.session().is_none());
    }

    #[tokio::test]
    async fn test_create_service_without_session_is_blocked() {
        let (market, backend) = market();
        fill_draft(&market);
        let before = market.draft();

        let notice = market.create_service().await;
        assert_eq!(notice, Some(Notice::warning("Sign in first")));
        assert!(backend.calls().is_empty());
        assert_eq!(market.draft(), before);
    }

    #[tokio::test]
    async fn test_create_service_clears_draft_and_lists_new_record_first() {
        let (market, backend) = market();
        backend.seed(Table::Services, &[json!({ "owner": "u-9", "title": "Bike Repair" })]);
        let session = signed_in(&market, &backend).await;
        fill_draft(&market);

        let notice = market.create_service().await;
        assert!(notice.is_none());
        assert_eq!(market.draft(), ServiceDraft::default());
        assert_eq!(
            backend.calls(),
            vec![
                Operation::Insert(Table::Services),
                Operation::Select(Table::Profiles),
                Operation::Select(Table::Services),
            ]
        );

        let services = market.services();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].title, "Math Tutoring");
        assert_eq!(services[0].owner, session.user.id);
        assert_eq!(services[0].price, Some(200.0));
        assert_eq!(services[0].location, "");
    }

    #[tokio::test]
    async fn test_create_service_failure_keeps_draft() {
        let (market, backend) = market();
        signed_in(&market, &backend).await;
        fill_draft(&market);
        let before = market.draft();
        backend.fail_next(Operation::Insert(Table::Services), "duplicate key");

        let notice = market.create_service().await;
        assert_eq!(notice, Some(Notice::error("Error: duplicate key")));
        assert_eq!(market.draft(), before);
        assert!(!market.draft().submitting);
        assert_eq!(backend.calls(), vec![Operation::Insert(Table::Services)]);
    }

    #[tokio::test]
    async fn test_create_service_ignores_submission_in_flight() {
        let (market, backend) = market();
        signed_in(&market, &backend).await;
        fill_draft(&market);
        market.draft.borrow_mut().submitting = true;

        assert!(market.create_service().await.is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mark_interest_without_session() {
        let (market, backend) = market();
        let notice = market.mark_interest(ServiceId::Int(1)).await;
        assert_eq!(notice, Notice::warning("Sign in to show interest"));
        assert!(backend.calls().is_empty());
        assert!(backend.rows(Table::Interests).is_empty());
    }

    #[tokio::test]
    async fn test_mark_interest_records_row_without_refetch() {
        let (market, backend) = market();
        let session = signed_in(&market, &backend).await;

        let notice = market.mark_interest(ServiceId::Int(5)).await;
        assert_eq!(notice, Notice::success("Interest recorded — owner can view it."));
        assert_eq!(backend.calls(), vec![Operation::Insert(Table::Interests)]);

        let rows = backend.rows(Table::Interests);
        assert_eq!(rows[0]["service_id"], json!(5));
        assert_eq!(rows[0]["user_id"], json!(session.user.id));
        assert_eq!(rows[0]["message"], json!("Interested via campus app"));
    }

    #[tokio::test]
    async fn test_mark_interest_failure() {
        let (market, backend) = market();
        signed_in(&market, &backend).await;
        backend.fail_next(Operation::Insert(Table::Interests), "violates row-level security");

        let notice = market.mark_interest(ServiceId::Int(5)).await;
        assert_eq!(notice, Notice::error("Error: violates row-level security"));
    }

    #[tokio::test]
    async fn test_observer_runs_on_changes() {
        let (market, _backend) = market();
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        market.set_observer(move || seen.set(seen.get() + 1));

        market.set_draft_field(DraftField::Title, "Laundry");
        assert_eq!(count.get(), 1);

        market.fetch_services().await;
        assert!(count.get() >= 3);
    }
}
