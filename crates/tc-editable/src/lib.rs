//! tc Editable - inline view/edit runtime
//!
//! Pages declare what is editable through `data-edit-*` attributes:
//! containers bind a target (`data-edit-target`), fields declare an input
//! type (`data-edit-type`), triggers name an action (`data-edit-action`)
//! and composite behaviors attach as modules (`data-edit-module`). The
//! [`Editor`] discovers those elements, keeps their view/edit state and
//! runs the submit pipeline against the network.

/// Forward to the parent behavior, or run the base implementation
macro_rules! inherit {
    ($self:ident . $method:ident ( $($arg:expr),* ) or $base:expr) => {
        match $self.parent() {
            Some(parent) => parent.$method($($arg),*),
            None => $base,
        }
    };
}

mod action;
mod config;
mod container;
mod editor;
mod error;
mod event;
mod input;
mod module;
mod state;
mod target;

pub use action::{ActionBehavior, ActionRun, default_actions};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{EditError, EditResult, Signal, humanize};
pub use event::Event;
pub use input::{
    AutocompleteState, Input, InputBehavior, InputCx, UnitState, UploadState, default_inputs, loosely_equal,
    pretty_speed, value_text,
};
pub use module::{Module, ModuleBehavior, ModuleOp, ModuleRun, PendingRow, default_modules};
pub use state::{ContainerState, FieldState, Mode};
pub use target::{Dispatch, Target, TargetBehavior, default_targets};
