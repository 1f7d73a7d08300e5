use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub message: String,
}

/// The user-facing progress stream of a run. Every message is also emitted as
/// a tracing event.
#[derive(Debug, Default)]
pub struct StatusLog {
    messages: Vec<StatusMessage>,
}

impl StatusLog {
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.push(StatusLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.push(StatusLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.push(StatusLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.push(StatusLevel::Error, message);
    }

    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<StatusMessage> {
        self.messages
    }

    fn push(&mut self, level: StatusLevel, message: String) {
        self.messages.push(StatusMessage { level, message });
    }
}
