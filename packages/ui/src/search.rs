use dioxus::prelude::*;

use crate::icons::FaMagnifyingGlass;
use crate::Icon;

/// Free-text filter over title, description and category.
#[component]
pub fn SearchBar(query: Signal<String>) -> Element {
    let mut query = query;

    rsx! {
        section {
            class: "search-bar",
            Icon { icon: FaMagnifyingGlass, width: 14, height: 14 }
            input {
                r#type: "search",
                placeholder: "Search services, categories, keywords",
                value: "{query}",
                oninput: move |evt| query.set(evt.value()),
            }
        }
    }
}
