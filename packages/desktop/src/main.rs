use dioxus::prelude::*;

fn main() {
    dioxus::launch(App);
}

/// Desktop shell. There is no address bar to carry a magic link back, so a
/// session is either restored from disk or, when no backend is configured,
/// confirmed immediately by the in-memory marketplace.
#[component]
fn App() -> Element {
    use_context_provider(|| Signal::new(ui::ActivityLog::default()));
    use_hook(|| tracing::info!("campusskill desktop started"));

    rsx! {
        ui::MarketplaceProvider {
            ui::views::Home {}
        }
    }
}
