use dioxus::prelude::*;
use store::{ListingStatus, ServiceCard, EMPTY_LISTING_TEXT};

use crate::activity_log::{present_notice, use_activity_log};
use crate::icons::{FaLocationDot, FaUser};
use crate::market::use_market;
use crate::Icon;

/// The "Available Services" column, filtered by `query`.
#[component]
pub fn ServiceList(query: Signal<String>) -> Element {
    let handle = use_market();
    let view = handle.read().listing_view(&query());

    rsx! {
        section {
            class: "service-list",
            h2 { "Available Services" }
            match view.status {
                ListingStatus::Loading => rsx! {
                    p { class: "listing-status", "Loading..." }
                },
                ListingStatus::Empty => rsx! {
                    p { class: "listing-status", "{EMPTY_LISTING_TEXT}" }
                },
                ListingStatus::Ready => rsx! {},
            }
            for card in view.cards {
                ServiceCardView { key: "{card.id}", card }
            }
        }
    }
}

#[component]
fn ServiceCardView(card: ServiceCard) -> Element {
    let handle = use_market();
    let mut log = use_activity_log();
    let ServiceCard {
        id,
        title,
        price,
        description,
        category,
        location,
        owner,
    } = card;

    let on_interest = move |_| {
        let market = handle.market();
        let id = id.clone();
        async move {
            let notice = market.mark_interest(id).await;
            present_notice(&mut log, &notice);
        }
    };

    rsx! {
        article {
            class: "service-card",
            div {
                class: "service-card-head",
                h3 { "{title}" }
                span { class: "service-price", "{price}" }
            }
            p { class: "service-description", "{description}" }
            div {
                class: "service-meta",
                span { class: "service-category", "Category: {category}" }
                " • "
                span {
                    class: "service-location",
                    Icon { icon: FaLocationDot, width: 12, height: 12 }
                    " Location: {location}"
                }
            }
            div {
                class: "service-card-foot",
                span {
                    class: "service-owner",
                    Icon { icon: FaUser, width: 12, height: 12 }
                    " Owner: {owner}"
                }
                button {
                    class: "interest-button",
                    onclick: on_interest,
                    "I'M INTERESTED"
                }
            }
        }
    }
}
