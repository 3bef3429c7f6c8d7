//! Short, user-facing messages about how an action went.

use serde_json::Value;
use std::{error::Error, fmt::Debug};

/// Something that can be shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Message(String);

impl Message {
    pub fn as_str(&self) -> &str { &self.0 }

    /// Render an error using its display text.
    pub fn from_error(error: &dyn Error) -> Message {
        let text = error.to_string();

        if text.is_empty() {
            Message(String::from("unknown error"))
        } else {
            Message(text)
        }
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Message { Message(s.to_string()) }
}

impl From<String> for Message {
    fn from(s: String) -> Message { Message(s) }
}

impl From<&Value> for Message {
    fn from(value: &Value) -> Message {
        match value {
            Value::String(s) => Message(s.clone()),
            other => Message(other.to_string()),
        }
    }
}

impl From<&anyhow::Error> for Message {
    fn from(error: &anyhow::Error) -> Message {
        // include the causes, the top level is rarely enough
        let chain: Vec<String> = error.chain().map(|e| e.to_string()).collect();
        Message(chain.join(": "))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
    Info,
}

pub trait Notifier {
    fn notify(&mut self, level: Level, message: Message);

    /// Diagnostics that never reach the user.
    fn debug(&mut self, message: Message, detail: Option<&dyn Debug>) {
        log::debug!("{} {:?}", message.as_str(), detail);
    }

    fn success<M: Into<Message>>(&mut self, message: M)
    where
        Self: Sized,
    {
        self.notify(Level::Success, message.into());
    }

    fn warn<M: Into<Message>>(&mut self, message: M)
    where
        Self: Sized,
    {
        self.notify(Level::Warning, message.into());
    }

    fn info<M: Into<Message>>(&mut self, message: M)
    where
        Self: Sized,
    {
        self.notify(Level::Info, message.into());
    }

    /// Show an error, keeping any `detail` around for whoever is debugging.
    fn error<M: Into<Message>>(&mut self, message: M, detail: Option<&dyn Debug>)
    where
        Self: Sized,
    {
        let message = message.into();
        if let Some(detail) = detail {
            log::debug!("{}: {:?}", message.as_str(), detail);
        }
        self.notify(Level::Error, message);
    }
}

/// Sends every notification through the `log` facade.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, level: Level, message: Message) {
        match level {
            Level::Success => log::info!("{}", message.as_str()),
            Level::Warning => log::warn!("{}", message.as_str()),
            Level::Error => log::error!("{}", message.as_str()),
            Level::Info => log::info!("{}", message.as_str()),
        }
    }
}

/// Keeps every notification so it can be inspected later.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recorder {
    pub notifications: Vec<(Level, Message)>,
}

impl Notifier for Recorder {
    fn notify(&mut self, level: Level, message: Message) {
        self.notifications.push((level, message));
    }
}
