//! Editable errors
//!
//! Tagged errors are user-correctable: they are signalled to the container
//! (error popin, `action-error` event) and never escape an action. Untagged
//! errors are programming errors and propagate to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tc_core::{ClsError, DataError};
use tc_dom::{DomError, NodeId};
use tc_net::NetError;

pub type EditResult<T> = Result<T, EditError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    /// One field failed validation
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// One or more fields failed; `data` holds the partial export including
    /// `_validationErrors`
    #[error("{}", humanize("ValidationErrors"))]
    Validations { data: Value },

    #[error("http error: {info}")]
    Http { info: String },

    #[error("forbidden: {info}")]
    Http403 { info: String },

    #[error("service unavailable: {info}")]
    Http503 { info: String },

    /// Server condition the page already communicates another way
    #[error("ignored server error")]
    Ignore,

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Cls(#[from] ClsError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("element {0} declares no target")]
    NoTarget(NodeId),

    #[error("element {0} declares no module")]
    NoModule(NodeId),

    #[error("module {module} has no action {action}")]
    UnknownModuleAction { module: String, action: String },

    #[error("target {0} does not support search")]
    SearchUnsupported(String),

    #[error("element {0} has no input instance")]
    NoInput(NodeId),

    #[error("element {0} is not in edit mode")]
    NotEditing(NodeId),
}

impl EditError {
    /// Type tag of user-correctable errors
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            EditError::Validation { .. } => Some("ValidationError"),
            EditError::Validations { .. } => Some("ValidationErrors"),
            EditError::Http { .. } => Some("HTTPError"),
            EditError::Http403 { .. } => Some("Http403"),
            EditError::Http503 { .. } => Some("Http503"),
            EditError::Ignore => Some("IgnoreError"),
            _ => None,
        }
    }

    pub fn is_tagged(&self) -> bool {
        self.reason().is_some()
    }

    /// Error payload for `action-error`; `None` for untagged errors
    pub fn signal(&self) -> Option<Signal> {
        let reason = self.reason()?.to_string();
        let (info, data) = match self {
            EditError::Validation { message, .. } => (message.clone(), Value::Null),
            EditError::Validations { data } => (String::new(), data.clone()),
            EditError::Http { info } | EditError::Http403 { info } | EditError::Http503 { info } => {
                (info.clone(), Value::Null)
            }
            _ => (String::new(), Value::Null),
        };
        Some(Signal { reason, info, data })
    }
}

/// Error payload carried by `action-error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub reason: String,
    pub info: String,
    pub data: Value,
}

/// Human readable text for an error type tag
pub fn humanize(reason: &str) -> &'static str {
    match reason {
        "ValidationErrors" => "Some of the fields contain invalid values - please correct and try again.",
        "Http403" => "Not Allowed",
        "Http400" => "Bad request",
        "Http404" => "Not found",
        "Http413" => "File too large",
        "Http500" => "Internal error",
        "IgnoreError" => "",
        _ => "Something went wrong.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagging() {
        let e = EditError::Http403 { info: "nope".into() };
        assert_eq!(e.reason(), Some("Http403"));
        assert_eq!(e.signal().unwrap().info, "nope");
        assert!(!EditError::UnknownRequestType("patch".into()).is_tagged());
        assert!(EditError::UnknownRequestType("patch".into()).signal().is_none());
    }

    #[test]
    fn test_validations_signal_carries_data() {
        let e = EditError::Validations {
            data: json!({"_valid": false}),
        };
        let s = e.signal().unwrap();
        assert_eq!(s.reason, "ValidationErrors");
        assert_eq!(s.data["_valid"], false);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("Http404"), "Not found");
        assert_eq!(humanize("IgnoreError"), "");
        assert_eq!(humanize("HTTPError"), "Something went wrong.");
    }
}
