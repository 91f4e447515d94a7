//! Marketplace context and hooks for the UI.

use std::rc::Rc;

use dioxus::prelude::*;
use store::Marketplace;

use crate::activity_log::{use_activity_log, ActivityLog};
use crate::backend::{make_backend, AppBackend};

pub type AppMarketplace = Marketplace<AppBackend>;

/// Shared handle to the page's marketplace controller.
///
/// The controller calls back after every state change, which bumps
/// `revision` and re-renders every component that read through [`MarketHandle::read`].
#[derive(Clone)]
pub struct MarketHandle {
    market: Rc<AppMarketplace>,
    revision: Signal<u64>,
}

impl MarketHandle {
    /// Borrow the controller and subscribe the calling component to changes.
    pub fn read(&self) -> &AppMarketplace {
        let _ = self.revision.read();
        &self.market
    }

    /// An owned handle for event handlers and tasks. Does not subscribe.
    pub fn market(&self) -> Rc<AppMarketplace> {
        self.market.clone()
    }
}

/// Get the marketplace from context.
pub fn use_market() -> MarketHandle {
    use_context::<MarketHandle>()
}

/// Provider component that owns the marketplace for the lifetime of the page.
///
/// On mount it subscribes to auth changes, finishes a pending magic-link
/// sign-in if the URL carries one, then loads the session, profiles and
/// services. Unmounting cancels both tasks, which drops the subscription.
#[component]
pub fn MarketplaceProvider(children: Element) -> Element {
    let revision = use_signal(|| 0u64);
    let log = use_activity_log();

    let market = use_hook(move || {
        let market = Rc::new(Marketplace::new(make_backend()));
        market.set_observer(move || {
            let mut revision = revision;
            *revision.write() += 1;
        });
        market
    });

    use_hook({
        let market = market.clone();
        move || {
            let listener = market.clone();
            let subscription = listener.subscribe();
            spawn(async move { listener.listen(subscription).await });

            spawn(async move {
                redeem_magic_link(&market, log).await;
                market.load().await;
            });
        }
    });

    use_context_provider(|| MarketHandle { market, revision });

    rsx! {
        {children}
    }
}

#[cfg(target_arch = "wasm32")]
async fn redeem_magic_link(market: &AppMarketplace, mut log: Signal<ActivityLog>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let fragment = window.location().hash().unwrap_or_default();
    if fragment.is_empty() {
        return;
    }
    match market.backend().redeem_callback(&fragment).await {
        Ok(Some(session)) => {
            let who = session.user.email.unwrap_or(session.user.id);
            crate::activity_log::log_activity(&mut log, crate::LogLevel::Info, &format!("Signed in as {who}"));
            // drop the tokens from the address bar
            let path = window.location().pathname().unwrap_or_else(|_| "/".to_string());
            if let Ok(history) = window.history() {
                let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&path));
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "magic link sign-in failed");
            crate::activity_log::present_notice(&mut log, &store::Notice::error(e.to_string()));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn redeem_magic_link(market: &AppMarketplace, _log: Signal<ActivityLog>) {
    if market.backend().is_offline() {
        tracing::info!("offline marketplace: sign-in links confirm immediately");
    }
}
