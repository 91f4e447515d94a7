//! This crate contains all shared UI for the workspace.

use dioxus::prelude::*;

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod backend;
pub use backend::{make_backend, AppBackend};

mod market;
pub use market::{use_market, AppMarketplace, MarketHandle, MarketplaceProvider};

pub mod views;

pub const MARKETPLACE_CSS: Asset = asset!("/assets/styling/marketplace.css");

mod account;
pub use account::AccountBar;

mod search;
pub use search::SearchBar;

mod listing;
pub use listing::ServiceList;

mod post_form;
pub use post_form::PostServiceForm;

pub mod activity_log;
pub use activity_log::{log_activity, present_notice, use_activity_log, ActivityLog, LogLevel};

mod activity_log_panel;
pub use activity_log_panel::{ActivityLogPanel, ActivityLogToggle, NoticeBanner};
