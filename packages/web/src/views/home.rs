use dioxus::prelude::*;

/// Landing route. Magic links redirect back here with the tokens in the
/// URL fragment, which the marketplace provider redeems on mount.
#[component]
pub fn Home() -> Element {
    rsx! {
        ui::views::Home {}
    }
}
