//! Outbound events emitted by an editor session.

use serde::{Deserialize, Serialize};

use crate::{ElementId, HistoryState};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Informational toast.
    Info,
    /// Something completed.
    Success,
    /// Recoverable problem the user should see.
    Warning,
    /// A rejected request.
    Error,
}

/// Something a host (renderer, autosave, UI) should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EditorEvent {
    /// The element set changed; re-render and mark the document dirty.
    ElementsChanged,

    /// The selection changed.
    SelectionChanged(Option<ElementId>),

    /// Undo/redo availability changed.
    HistoryChanged(HistoryState),

    /// A non-blocking message for the user.
    Notification {
        /// Severity.
        level: NotificationLevel,
        /// Message text.
        message: String,
    },
}

impl EditorEvent {
    /// Create an info notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::Notification {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// Create a success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Notification {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Create an error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Notification {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Whether this event means the document content changed.
    #[must_use]
    pub fn is_content_change(&self) -> bool {
        matches!(self, Self::ElementsChanged)
    }
}
