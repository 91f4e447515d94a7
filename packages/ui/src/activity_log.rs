use dioxus::prelude::*;
use store::{Notice, NoticeLevel};

#[derive(Clone, Debug, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Success => "success",
            LogLevel::Info => "info",
        }
    }
}

impl From<NoticeLevel> for LogLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Success => LogLevel::Success,
            NoticeLevel::Warning => LogLevel::Warning,
            NoticeLevel::Error => LogLevel::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct ActivityLog {
    pub entries: Vec<LogEntry>,
    pub visible: bool,
    /// Notice waiting to be acknowledged, on platforms without `window.alert`.
    pub pending: Option<LogEntry>,
}

impl ActivityLog {
    pub fn push(&mut self, level: LogLevel, message: &str) -> LogEntry {
        let entry = LogEntry {
            timestamp: current_time(),
            level,
            message: message.to_string(),
        };
        self.entries.push(entry.clone());
        entry
    }
}

pub fn use_activity_log() -> Signal<ActivityLog> {
    use_context::<Signal<ActivityLog>>()
}

pub fn log_activity(log: &mut Signal<ActivityLog>, level: LogLevel, message: &str) {
    log.write().push(level, message);
}

/// Show a notice to the user and keep it in the activity log.
///
/// In the browser this is a blocking `window.alert`; elsewhere the notice
/// waits in [`ActivityLog::pending`] until dismissed.
pub fn present_notice(log: &mut Signal<ActivityLog>, notice: &Notice) {
    let entry = log.write().push(notice.level.into(), &notice.message);

    #[cfg(target_arch = "wasm32")]
    {
        let _ = entry;
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(&notice.message);
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        log.write().pending = Some(entry);
    }
}

#[cfg(target_arch = "wasm32")]
fn current_time() -> String {
    let date = js_sys::Date::new_0();
    let h = date.get_hours();
    let m = date.get_minutes();
    let s = date.get_seconds();
    format!("{h:02}:{m:02}:{s:02}")
}

#[cfg(not(target_arch = "wasm32"))]
fn current_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_records_entry() {
        let mut log = ActivityLog::default();
        let entry = log.push(NoticeLevel::Error.into(), "Error: duplicate key");
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(log.entries.len(), 1);
        assert_eq!(log.entries[0].message, "Error: duplicate key");
        assert_eq!(log.entries[0].timestamp.len(), 8);
    }
}
