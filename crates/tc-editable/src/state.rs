//! Per-element state records
//!
//! The runtime keeps mode and input instances in arenas keyed by node id
//! instead of on the elements themselves.

use crate::input::Input;
use serde::{Deserialize, Serialize};
use std::fmt;
use tc_dom::NodeId;

/// View / edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    View,
    Edit,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::View => "view",
            Mode::Edit => "edit",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Mode::View => Mode::Edit,
            Mode::Edit => Mode::View,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a container or component element
#[derive(Debug, Default)]
pub struct ContainerState {
    pub(crate) mode: Mode,
    /// Never leaves edit mode
    pub(crate) always: bool,
    pub(crate) initialized: bool,
    /// Forces the next submit of the main target
    pub(crate) changed: bool,
    pub(crate) error_popin: Option<NodeId>,
    pub(crate) loading_shim: Option<NodeId>,
}

impl ContainerState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_always(&self) -> bool {
        self.always
    }
}

/// State of an editable field element
#[derive(Debug, Default)]
pub struct FieldState {
    pub(crate) mode: Mode,
    /// Permanently managed by an always-edit container
    pub(crate) always: bool,
    /// Container that wired this field
    pub(crate) parent: Option<NodeId>,
    pub(crate) input: Option<Input>,
    /// Display children detached while editing
    pub(crate) backup: Vec<NodeId>,
}

impl FieldState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }
}
