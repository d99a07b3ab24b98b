pub mod editor;
pub mod error;
pub mod event;
pub mod store;

pub use editor::{DraftField, EditorRules, EditorState, EventEditorController};
pub use error::PersistenceWarning;
pub use event::{Event, EventColor};
pub use store::{EventStore, FileStorage, Storage};
