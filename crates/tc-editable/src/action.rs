//! Actions
//!
//! Triggers (`[data-edit-action]`) run an action against their closest
//! target container. Containers that are also modules hand every action
//! to the module through `module-action`.
//!
//! `submit` fans out to the container's main target, its grouped
//! containers and the pending rows of its modules, and fans back in
//! through a [`Join`]: the container toggles to view mode once every
//! sub-submission has reported and none failed.

use crate::editor::Then;
use crate::{EditError, EditResult, Editor, Event, Module, Signal, Target, humanize};
use serde_json::{Map, Value, json};
use std::rc::Rc;
use tc_core::{Arrival, ClsError, Join, Registry};
use tc_dom::{NodeId, Selector};

/// Submission in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RunId(pub(crate) u64);

/// Fan-in state of one `submit`
#[derive(Debug)]
pub(crate) struct SubmitRun {
    pub(crate) container: NodeId,
    pub(crate) join: Join,
    /// Exported data merged with the data each success returned
    pub(crate) data: Map<String, Value>,
    /// Grouped sub-submissions leave toggling to their parent
    pub(crate) no_toggle: bool,
    /// Run this one reports its main target to
    pub(crate) parent: Option<RunId>,
}

/// One execution of an action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRun {
    /// Action name as declared by the trigger
    pub name: String,
    pub trigger: NodeId,
    pub container: NodeId,
}

/// Action behavior
pub trait ActionBehavior {
    fn parent(&self) -> Option<&dyn ActionBehavior> {
        None
    }

    /// Show the container's loading shim while the action runs
    fn loading_shim(&self) -> bool {
        inherit!(self.loading_shim() or false)
    }

    fn execute(&self, ed: &mut Editor, run: &ActionRun) -> EditResult<Value> {
        inherit!(self.execute(ed, run) or Ok(Value::Null))
    }
}

struct Base;

impl ActionBehavior for Base {}

struct ToggleEdit {
    base: Rc<dyn ActionBehavior>,
}

impl ActionBehavior for ToggleEdit {
    fn parent(&self) -> Option<&dyn ActionBehavior> {
        Some(&*self.base)
    }

    fn execute(&self, ed: &mut Editor, run: &ActionRun) -> EditResult<Value> {
        self.base.execute(ed, run)?;
        ed.toggle(run.container, None)?;
        let mode = ed.container_state(run.container).map(|s| s.mode()).unwrap_or_default();
        let payload = json!({ "mode": mode.as_str() });
        ed.emit(Event::ActionSuccess {
            container: run.container,
            action: "toggle".into(),
            payload: payload.clone(),
        });
        Ok(payload)
    }
}

struct Reset {
    base: Rc<dyn ActionBehavior>,
}

impl ActionBehavior for Reset {
    fn parent(&self) -> Option<&dyn ActionBehavior> {
        Some(&*self.base)
    }

    fn execute(&self, ed: &mut Editor, run: &ActionRun) -> EditResult<Value> {
        ed.reset(run.container)?;
        ed.signal_success(run.container, "reset", json!({}), false)?;
        Ok(Value::Null)
    }
}

struct Submit {
    base: Rc<dyn ActionBehavior>,
}

impl ActionBehavior for Submit {
    fn parent(&self) -> Option<&dyn ActionBehavior> {
        Some(&*self.base)
    }

    fn loading_shim(&self) -> bool {
        true
    }

    fn execute(&self, ed: &mut Editor, run: &ActionRun) -> EditResult<Value> {
        ed.submit(run.trigger, run.container, false, None)?;
        Ok(Value::Null)
    }
}

/// Routes a trigger's action to the module attached to its container
struct ModuleAction {
    base: Rc<dyn ActionBehavior>,
}

impl ActionBehavior for ModuleAction {
    fn parent(&self) -> Option<&dyn ActionBehavior> {
        Some(&*self.base)
    }

    fn execute(&self, ed: &mut Editor, run: &ActionRun) -> EditResult<Value> {
        let module = ed.instantiate_module(run.container)?;
        ed.execute_module(module, run.trigger, &run.name, None)?;
        Ok(Value::Null)
    }
}

fn rc(behavior: impl ActionBehavior + 'static) -> Rc<dyn ActionBehavior> {
    Rc::new(behavior)
}

fn register(reg: &mut Registry<dyn ActionBehavior>) -> Result<(), ClsError> {
    reg.register("base", rc(Base))?;
    reg.extend("toggle-edit", "base", |base| rc(ToggleEdit { base }))?;
    reg.extend("reset", "base", |base| rc(Reset { base }))?;
    reg.extend("submit", "base", |base| rc(Submit { base }))?;
    reg.extend("module-action", "base", |base| rc(ModuleAction { base }))?;
    Ok(())
}

/// Registry holding every built-in action
pub fn default_actions() -> Registry<dyn ActionBehavior> {
    Registry::builtin("action", register)
}

impl Editor {
    /// Run the action declared by `trigger`
    pub(crate) fn run_trigger(&mut self, trigger: NodeId) -> EditResult<()> {
        let Some(name) = self.dom.attr(trigger, "data-edit-action").map(str::to_string) else {
            return Ok(());
        };
        let Some(container) = self.dom.closest(trigger, |e| e.attrs.has("data-edit-target")) else {
            tracing::warn!("action {} outside of any container", name);
            return Ok(());
        };
        let kind = if self.dom.has_attr(container, "data-edit-module") {
            "module-action"
        } else {
            name.as_str()
        };
        self.perform(
            kind,
            ActionRun {
                name: name.clone(),
                trigger,
                container,
            },
        )?;
        self.emit(Event::Action { trigger, action: name });
        Ok(())
    }

    /// Execute a registered action
    pub(crate) fn perform(&mut self, kind: &str, run: ActionRun) -> EditResult<Value> {
        let behavior = self.actions.get(kind).inspect_err(|_| {
            tracing::warn!("unknown action {} (trigger {})", kind, run.trigger);
        })?;
        tracing::debug!("action {} on {}", kind, run.container);
        if behavior.loading_shim() {
            self.loading_shim(run.container, true)?;
        }
        behavior.execute(self, &run)
    }

    /// `action-success:<action>`
    pub(crate) fn signal_success(&mut self, container: NodeId, action: &str, payload: Value, shim: bool) -> EditResult<()> {
        self.emit(Event::ActionSuccess {
            container,
            action: action.to_string(),
            payload,
        });
        if shim {
            self.loading_shim(container, false)?;
        }
        Ok(())
    }

    /// `action-error:<action>` for tagged errors; untagged errors are
    /// handed back to the caller
    pub(crate) fn signal_error(&mut self, container: NodeId, action: &str, error: EditError, shim: bool) -> EditResult<()> {
        let Some(signal) = error.signal() else {
            return Err(error);
        };
        tracing::debug!("{} failed on {}: {}", action, container, error);
        self.show_error_popin(container, &signal)?;
        self.emit(Event::ActionError {
            container,
            action: action.to_string(),
            error: signal,
        });
        if shim {
            self.loading_shim(container, false)?;
        }
        Ok(())
    }

    /// Render an error into the popin of the nearest container that has one
    fn show_error_popin(&mut self, container: NodeId, signal: &Signal) -> EditResult<()> {
        if signal.reason == "IgnoreError" {
            return Ok(());
        }
        let mut current = Some(container);
        let popin = loop {
            let Some(node) = current else {
                return Ok(());
            };
            if let Some(popin) = self.containers.get(&node).and_then(|s| s.error_popin) {
                break popin;
            }
            current = self.dom.parent(node);
        };
        if let Some(main) = self.dom.query_first(popin, &Selector::parse(".main")?) {
            self.dom.set_text(main, humanize(&signal.reason))?;
        }
        if let Some(extra) = self.dom.query_first(popin, &Selector::parse(".extra")?) {
            self.dom.set_text(extra, &signal.info)?;
        }
        self.dom.show(popin)?;
        Ok(())
    }

    /// Main target fires when something changed or submission is forced
    fn should_submit(&self, container: NodeId, target: &Target) -> bool {
        target.changed() > 0
            || self.dom.attr(container, "data-edit-always-submit") == Some("yes")
            || self.dom.attr(container, "data-edit-changed") == Some("yes")
            || self.containers.get(&container).is_some_and(|s| s.changed)
    }

    /// Export everything a submit needs; tagged errors abort the submit
    fn prepare_submit(&mut self, container: NodeId, trigger: NodeId) -> EditResult<(Target, Vec<Module>, Vec<(NodeId, Target)>)> {
        let target = self.instantiate_target(container, Some(trigger))?;

        let mut modules = Vec::new();
        for node in self.dom.query(container, &Selector::has_attr("data-edit-module")) {
            let mut module = self.instantiate_module(node)?;
            if module.has_action(&self.dom, "submit") {
                continue;
            }
            module.prepare(self)?;
            if !module.pending_submit.is_empty() {
                modules.push(module);
            }
        }

        let mut grouped = Vec::new();
        for node in self.grouped(container) {
            if self.dom.has_attr(node, "data-edit-module") {
                continue;
            }
            grouped.push((node, self.instantiate_target(node, Some(trigger))?));
        }
        Ok((target, modules, grouped))
    }

    /// Submit `container`; sub-submissions of grouped containers pass
    /// `no_toggle` and report to `parent`
    pub(crate) fn submit(&mut self, trigger: NodeId, container: NodeId, no_toggle: bool, parent: Option<RunId>) -> EditResult<()> {
        self.loading_shim(container, true)?;
        let (target, modules, grouped) = match self.prepare_submit(container, trigger) {
            Ok(parts) => parts,
            Err(error) => {
                self.signal_error(container, "submit", error, true)?;
                if let Some(parent) = parent {
                    self.arrive(parent, false, None)?;
                }
                return Ok(());
            }
        };

        let mut data = target.data.clone();
        let mut total = 1 + modules.iter().map(|m| m.pending_submit.len()).sum::<usize>();
        let mut counted = Vec::with_capacity(grouped.len());
        for (node, other) in &grouped {
            data.extend(other.data.clone());
            let submits = self.should_submit(*node, other);
            total += usize::from(submits);
            counted.push((*node, submits));
        }

        let fire = self.should_submit(container, &target);
        let run = RunId(self.next_run);
        self.next_run += 1;
        self.runs.insert(
            run,
            SubmitRun {
                container,
                join: Join::new(total),
                data,
                no_toggle,
                parent,
            },
        );
        tracing::debug!("submit {} on {}: {} pending", run.0, container, total);

        if fire {
            self.dispatch(target, None, Then::Submit(run))?;
        } else {
            self.arrive(run, true, None)?;
        }

        for (node, submits) in counted {
            self.submit(trigger, node, true, submits.then_some(run))?;
        }

        for module in modules {
            self.execute_module(module, trigger, "submit", Some(run))?;
        }
        Ok(())
    }

    /// One sub-submission of `run` finished
    pub(crate) fn arrive(&mut self, run: RunId, ok: bool, data: Option<Map<String, Value>>) -> EditResult<()> {
        let Some(state) = self.runs.get_mut(&run) else {
            return Ok(());
        };
        if let Some(data) = data {
            state.data.extend(data);
        }
        match state.join.arrive(ok) {
            Arrival::Complete { failed } => {
                let Some(state) = self.runs.remove(&run) else {
                    return Ok(());
                };
                tracing::debug!("submit {} complete (failed: {})", run.0, failed);
                if !failed && !state.no_toggle {
                    self.emit(Event::ActionSuccess {
                        container: state.container,
                        action: "toggle".into(),
                        payload: json!({ "mode": "view" }),
                    });
                    self.toggle(state.container, Some(&state.data))?;
                }
                self.loading_shim(state.container, false)?;
            }
            Arrival::Pending { remaining } => {
                tracing::trace!("submit {}: {} pending", run.0, remaining);
            }
            Arrival::Ignored => {}
        }
        Ok(())
    }

    /// The main target of `run` finished
    pub(crate) fn submit_target_done(&mut self, run: RunId, result: EditResult<Value>) -> EditResult<()> {
        let Some((container, parent)) = self.runs.get(&run).map(|r| (r.container, r.parent)) else {
            return Ok(());
        };
        match result {
            Ok(value) => {
                self.signal_success(container, "submit", value.clone(), false)?;
                if let Some(state) = self.containers.get_mut(&container) {
                    state.changed = false;
                }
                if self.dom.has_attr(container, "data-edit-changed") {
                    self.dom.remove_attr(container, "data-edit-changed")?;
                }
                let data = value.as_object().cloned();
                self.arrive(run, true, data.clone())?;
                if let Some(parent) = parent {
                    self.arrive(parent, true, data)?;
                }
            }
            Err(error) => {
                self.signal_error(container, "submit", error, false)?;
                self.arrive(run, false, None)?;
                if let Some(parent) = parent {
                    self.arrive(parent, false, None)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let reg = default_actions();
        assert_eq!(reg.lineage("submit"), ["submit", "base"]);
        assert!(reg.get("submit").unwrap().loading_shim());
        assert!(!reg.get("toggle-edit").unwrap().loading_shim());
        assert!(!reg.get("module-action").unwrap().loading_shim());
        assert!(reg.get("unknown").is_err());
    }
}
