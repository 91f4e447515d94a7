use dioxus::prelude::*;
use store::DraftField;

use crate::activity_log::{present_notice, use_activity_log};
use crate::market::use_market;

/// The "Post a service" form. Only offered to signed-in users.
#[component]
pub fn PostServiceForm() -> Element {
    let handle = use_market();
    let mut log = use_activity_log();
    let market = handle.read();

    if market.session().is_none() {
        return rsx! {
            p { class: "post-hint", "Please sign in to post." }
        };
    }

    let draft = market.draft();
    let submitting = draft.submitting;

    let on_submit = {
        let market = handle.market();
        move |evt: FormEvent| {
            evt.prevent_default();
            let market = market.clone();
            async move {
                if let Some(notice) = market.create_service().await {
                    present_notice(&mut log, &notice);
                }
            }
        }
    };

    rsx! {
        form {
            class: "post-form",
            onsubmit: on_submit,
            DraftInput { field: DraftField::Title, value: draft.title, placeholder: "Title", required: true }
            DraftArea { value: draft.description }
            DraftInput { field: DraftField::Category, value: draft.category, placeholder: "Category (e.g. Tutoring)" }
            DraftInput { field: DraftField::Price, value: draft.price, placeholder: "Price (INR)" }
            DraftInput { field: DraftField::Location, value: draft.location, placeholder: "Pickup / Location" }
            button {
                r#type: "submit",
                disabled: submitting,
                if submitting { "Posting..." } else { "Post Service" }
            }
        }
    }
}

#[component]
fn DraftInput(
    field: DraftField,
    value: String,
    placeholder: &'static str,
    #[props(default)] required: bool,
) -> Element {
    let handle = use_market();

    rsx! {
        input {
            placeholder,
            required,
            value: "{value}",
            oninput: move |evt| handle.market().set_draft_field(field, evt.value()),
        }
    }
}

#[component]
fn DraftArea(value: String) -> Element {
    let handle = use_market();

    rsx! {
        textarea {
            placeholder: "Short description",
            required: true,
            value: "{value}",
            oninput: move |evt| handle.market().set_draft_field(DraftField::Description, evt.value()),
        }
    }
}
