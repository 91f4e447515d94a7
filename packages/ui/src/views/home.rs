use dioxus::prelude::*;

use crate::account::AccountBar;
use crate::activity_log_panel::{ActivityLogPanel, ActivityLogToggle, NoticeBanner};
use crate::listing::ServiceList;
use crate::post_form::PostServiceForm;
use crate::search::SearchBar;
use crate::MARKETPLACE_CSS;

/// The whole marketplace page: header, search, listings and the post form.
#[component]
pub fn Home() -> Element {
    let query = use_signal(String::new);

    rsx! {
        document::Stylesheet { href: MARKETPLACE_CSS }

        div {
            class: "marketplace",
            header {
                class: "marketplace-header",
                h1 { "CampusSkill — College Skill & Service Marketplace" }
                div {
                    class: "marketplace-header-actions",
                    AccountBar {}
                    ActivityLogToggle {}
                }
            }

            NoticeBanner {}

            SearchBar { query }

            main {
                class: "marketplace-body",
                ServiceList { query }
                aside {
                    class: "post-panel",
                    h3 { "Post a service" }
                    PostServiceForm {}
                    hr {}
                    p {
                        class: "post-tip",
                        "Tip: use UPI for payments and post a screenshot in chat for safety."
                    }
                }
            }

            ActivityLogPanel {}
        }
    }
}
