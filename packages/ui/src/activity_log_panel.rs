use dioxus::prelude::*;

use crate::activity_log::{LogEntry, LogLevel, use_activity_log};

const ACTIVITY_LOG_CSS: Asset = asset!("/assets/styling/activity_log.css");

#[component]
pub fn ActivityLogPanel() -> Element {
    let mut log = use_activity_log();

    if !log().visible {
        return rsx! {};
    }

    let entries = log().entries.clone();

    rsx! {
        document::Stylesheet { href: ACTIVITY_LOG_CSS }

        div {
            class: "activity-log-panel",
            div {
                class: "activity-log-header",
                span { "Activity Log" }
                div {
                    class: "activity-log-header-actions",
                    button {
                        onclick: move |_| log.write().entries.clear(),
                        "Clear"
                    }
                    button {
                        onclick: move |_| log.write().visible = false,
                        "Close"
                    }
                }
            }
            div {
                class: "activity-log-entries",
                for entry in entries.iter().rev() {
                    div {
                        class: "activity-log-entry {entry.level.css_class()}",
                        span { class: "activity-log-time", "{entry.timestamp}" }
                        span { " {entry.message}" }
                    }
                }
            }
        }
    }
}

#[component]
pub fn ActivityLogToggle() -> Element {
    let mut log = use_activity_log();
    let count = log().entries.len();
    let has_errors = log().entries.iter().any(|e| e.level == LogLevel::Error);

    rsx! {
        button {
            class: if has_errors { "activity-log-toggle has-errors" } else { "activity-log-toggle" },
            onclick: move |_| {
                let visible = log().visible;
                log.write().visible = !visible;
            },
            title: "Activity log",
            if count > 0 {
                "{count}"
            } else {
                "Log"
            }
        }
    }
}

/// The notice waiting for acknowledgement, with an OK button.
#[component]
pub fn NoticeBanner() -> Element {
    let mut log = use_activity_log();
    let Some(LogEntry { level, message, .. }) = log().pending.clone() else {
        return rsx! {};
    };
    let level_class = level.css_class();

    rsx! {
        document::Stylesheet { href: ACTIVITY_LOG_CSS }

        div {
            class: "notice-banner {level_class}",
            role: "alert",
            span { "{message}" }
            button {
                onclick: move |_| log.write().pending = None,
                "OK"
            }
        }
    }
}
