use dioxus::prelude::*;

use views::Home;

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    Home {},
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    use_context_provider(|| Signal::new(ui::ActivityLog::default()));
    use_hook(|| tracing::info!("campusskill web started"));

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        ui::MarketplaceProvider {
            Router::<Route> {}
        }
    }
}
