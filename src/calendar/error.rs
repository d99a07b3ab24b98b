use std::io;

use thiserror::Error;

use super::editor::DraftField;

/// Why a draft could not be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in: {}", field_list(.0))]
    MissingFields(Vec<DraftField>),

    #[error("Invalid {field}: {value:?}")]
    Malformed { field: DraftField, value: String },

    #[error("End must not be before start")]
    EndBeforeStart,
}

fn field_list(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A storage read or write that did not go through. The in-memory
/// collection stays authoritative; callers surface this to the user.
#[derive(Error, Debug)]
pub enum PersistenceWarning {
    #[error("Could not read stored events from '{slot}': {source}")]
    Read {
        slot: String,
        #[source]
        source: io::Error,
    },

    #[error("Stored events in '{slot}' are unreadable, starting empty: {source}")]
    Corrupt {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Skipped {count} unreadable stored event(s) in '{slot}'")]
    Skipped { slot: String, count: usize },

    #[error("Could not encode events for '{slot}': {source}")]
    Encode {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not save events to '{slot}': {source}")]
    Write {
        slot: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No event is being edited")]
    NoSession,

    #[error("An event form is already open")]
    SessionOpen,

    #[error("Only existing events can be deleted")]
    NotEditing,
}
