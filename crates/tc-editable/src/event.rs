//! Editor events
//!
//! Notifications the runtime emits while it works. They are appended to
//! the editor's event log and drained with `Editor::take_events`.

use crate::{Mode, Signal};
use serde_json::Value;
use tc_dom::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Container, component or field changed mode
    Toggle { node: NodeId, mode: Mode },

    /// Container left edit mode without submitted data
    EditCancel { container: NodeId },

    /// `action-success:<action>`
    ActionSuccess {
        container: NodeId,
        action: String,
        payload: Value,
    },

    /// `action-error:<action>`
    ActionError {
        container: NodeId,
        action: String,
        error: Signal,
    },

    /// A trigger ran its action (`action:<name>`)
    Action { trigger: NodeId, action: String },

    /// Container exported its fields
    Export { container: NodeId, data: Value },

    RowAdd {
        container: NodeId,
        row: NodeId,
        id: Value,
        data: Value,
    },

    RowRemove { container: NodeId, row: NodeId, id: Value },

    RowSubmit {
        container: NodeId,
        row: NodeId,
        id: Value,
        data: Value,
    },

    /// Data set arrived in the store
    DataLoaded { id: String },

    /// Data set failed to load
    DataFailed { id: String },

    /// Page should navigate (redirects, advanced search)
    Navigate { url: String },

    /// Advanced search results rendered
    SearchResults {
        container: NodeId,
        reftag: String,
        count: usize,
    },

    /// Autocomplete suggestions for a field
    Suggestions { field: NodeId, choices: Vec<(String, String)> },

    /// Image field uploaded a file
    Uploaded { field: NodeId, url: String },

    /// Image field removed its file
    FileRemoved { field: NodeId },
}

impl Event {
    /// DOM-style event name (`action-success:submit`, `listing:row-add`)
    pub fn name(&self) -> String {
        match self {
            Event::Toggle { .. } => "toggle".into(),
            Event::EditCancel { .. } => "edit-cancel".into(),
            Event::ActionSuccess { action, .. } => format!("action-success:{}", action),
            Event::ActionError { action, .. } => format!("action-error:{}", action),
            Event::Action { action, .. } => format!("action:{}", action),
            Event::Export { .. } => "export".into(),
            Event::RowAdd { .. } => "listing:row-add".into(),
            Event::RowRemove { .. } => "listing:row-remove".into(),
            Event::RowSubmit { .. } => "listing:row-submit".into(),
            Event::DataLoaded { .. } => "load".into(),
            Event::DataFailed { .. } => "load-error".into(),
            Event::Navigate { .. } => "navigate".into(),
            Event::SearchResults { .. } => "search-results".into(),
            Event::Suggestions { .. } => "suggestions".into(),
            Event::Uploaded { .. } => "upload".into(),
            Event::FileRemoved { .. } => "file-removed".into(),
        }
    }
}
