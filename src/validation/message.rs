//! Structured validation outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a message.
///
/// Only `Error` can block a record; the host treats the rest as advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Warning,
    Info,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Error => "error",
            MessageKind::Warning => "warning",
            MessageKind::Info => "info",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record-processing stage that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStage {
    #[default]
    Validate,
    Compute,
}

impl MessageStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStage::Validate => "validate",
            MessageStage::Compute => "compute",
        }
    }
}

/// A failed check's result: text, severity and stage.
///
/// Messages carry no identity; two messages with equal content are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
    pub stage: MessageStage,
}

impl Message {
    pub fn new(text: impl Into<String>, kind: MessageKind, stage: MessageStage) -> Self {
        Self {
            text: text.into(),
            kind,
            stage,
        }
    }

    /// Error-kind message at the validate stage.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, MessageKind::Error, MessageStage::Validate)
    }

    /// Warning-kind message at the validate stage.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, MessageKind::Warning, MessageStage::Validate)
    }

    /// Info-kind message at the validate stage.
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, MessageKind::Info, MessageStage::Validate)
    }

    /// Returns a copy tagged with a different stage.
    pub fn at_stage(mut self, stage: MessageStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.kind, self.stage.as_str(), self.text)
    }
}
