//! Header controls: magic-link sign-in form, or the signed-in email with a
//! sign-out button.

use dioxus::prelude::*;

use crate::activity_log::{present_notice, use_activity_log};
use crate::market::use_market;

#[component]
pub fn AccountBar() -> Element {
    let handle = use_market();
    let mut log = use_activity_log();
    let market = handle.read();

    if market.session().is_some() {
        let email = market.signed_in_email().unwrap_or_default();
        let market = handle.market();
        return rsx! {
            div {
                class: "account-bar",
                span { class: "account-email", "{email}" }
                button {
                    onclick: move |_| {
                        let market = market.clone();
                        async move { market.sign_out().await }
                    },
                    "Sign out"
                }
            }
        };
    }

    let email = market.sign_in_email();
    let on_input = {
        let market = handle.market();
        move |evt: FormEvent| market.set_sign_in_email(evt.value())
    };
    let on_submit = {
        let market = handle.market();
        move |evt: FormEvent| {
            evt.prevent_default();
            let market = market.clone();
            async move {
                let notice = market.sign_in().await;
                present_notice(&mut log, &notice);
            }
        }
    };

    rsx! {
        form {
            class: "account-bar sign-in-form",
            onsubmit: on_submit,
            input {
                placeholder: "your.email@college.edu",
                value: "{email}",
                oninput: on_input,
            }
            button { r#type: "submit", "Sign in" }
        }
    }
}
