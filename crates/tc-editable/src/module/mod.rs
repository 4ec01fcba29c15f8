//! Modules
//!
//! A module is a composite behavior attached to a container through
//! `data-edit-module="<name>"`. Its parts are the owned elements carrying
//! `data-edit-component`. Actions triggered inside such a container are
//! routed to the module (`<module>.<action>`), which may answer at once
//! or hand the container's target to the editor and finish when the
//! response arrives.

mod listing;

use crate::action::RunId;
use crate::{EditError, EditResult, Editor, Target};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{DomTree, NodeId, Selector};

/// Row waiting to be submitted by its module
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub row: NodeId,
    pub id: Value,
    pub data: Map<String, Value>,
}

/// One module action in progress
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRun {
    pub module: String,
    /// `<module>.<action>`
    pub action: String,
    pub trigger: NodeId,
    pub container: NodeId,
    pub loading_shim: bool,
    /// Submit this run reports to
    pub(crate) report: Option<RunId>,
}

/// Row operation a module target response belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleOp {
    Add,
    Update { row: NodeId, id: Value },
    Remove { row: NodeId, id: Value },
}

/// Module behavior
pub trait ModuleBehavior {
    fn parent(&self) -> Option<&dyn ModuleBehavior> {
        None
    }

    fn loading_shim(&self) -> bool {
        inherit!(self.loading_shim() or false)
    }

    /// Container initialized
    fn init(&self, ed: &mut Editor, m: &mut Module) -> EditResult<()> {
        inherit!(self.init(ed, m) or Ok(()))
    }

    /// Collect pending work before a submit
    fn prepare(&self, ed: &mut Editor, m: &mut Module) -> EditResult<()> {
        inherit!(self.prepare(ed, m) or {
            m.prepared = true;
            Ok(())
        })
    }

    /// Run `action`; `Some` finishes the action at once, `None` means a
    /// request is in flight and `finish` runs with its result
    fn execute_action(&self, ed: &mut Editor, m: &mut Module, action: &str, run: &ModuleRun, target: Target) -> EditResult<Option<Value>> {
        inherit!(self.execute_action(ed, m, action, run, target) or match action {
            "submit" => Ok(Some(Value::Null)),
            _ => Err(EditError::UnknownModuleAction {
                module: m.name().to_string(),
                action: action.to_string(),
            }),
        })
    }

    fn add_row(&self, ed: &mut Editor, m: &mut Module, run: &ModuleRun, target: &Target, data: Map<String, Value>) -> EditResult<Option<Value>> {
        inherit!(self.add_row(ed, m, run, target, data) or Ok(Some(Value::Object(data))))
    }

    /// Submit one pending row; `true` if it finished synchronously
    fn submit_row(&self, ed: &mut Editor, m: &mut Module, run: &ModuleRun, target: &Target, row: PendingRow) -> EditResult<bool> {
        inherit!(self.submit_row(ed, m, run, target, row) or Ok(true))
    }

    fn remove_row(&self, ed: &mut Editor, m: &mut Module, run: &ModuleRun, target: &Target, row: NodeId, id: Value) -> EditResult<Option<Value>> {
        inherit!(self.remove_row(ed, m, run, target, row, id) or Ok(Some(Value::Null)))
    }

    /// A row was added to the listing
    fn row_added(&self, ed: &mut Editor, m: &mut Module, row: NodeId, id: &Value, data: &Value) -> EditResult<()> {
        inherit!(self.row_added(ed, m, row, id, data) or Ok(()))
    }

    /// Response of a request started by this module arrived
    fn finish(&self, ed: &mut Editor, m: &mut Module, run: &ModuleRun, op: &ModuleOp, result: &EditResult<Value>) -> EditResult<()> {
        inherit!(self.finish(ed, m, run, op, result) or Ok(()))
    }
}

/// Module instance bound to one container
pub struct Module {
    name: String,
    behavior: Rc<dyn ModuleBehavior>,
    pub container: NodeId,
    /// Owned `[data-edit-component]` elements by component name
    pub components: HashMap<String, NodeId>,
    pub pending_submit: Vec<PendingRow>,
    pub(crate) prepared: bool,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("container", &self.container)
            .field("components", &self.components)
            .field("pending_submit", &self.pending_submit.len())
            .finish()
    }
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self, name: &str) -> Option<NodeId> {
        self.components.get(name).copied()
    }

    pub fn loading_shim(&self) -> bool {
        self.behavior.loading_shim()
    }

    /// Whether a trigger inside the container declares `action`
    pub fn has_action(&self, dom: &DomTree, action: &str) -> bool {
        dom.query_first(self.container, &Selector::attr_eq("data-edit-action", action)).is_some()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn init(&mut self, ed: &mut Editor) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.init(ed, self)
    }

    pub fn prepare(&mut self, ed: &mut Editor) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.prepare(ed, self)
    }

    pub fn execute_action(&mut self, ed: &mut Editor, action: &str, run: &ModuleRun, target: Target) -> EditResult<Option<Value>> {
        let b = Rc::clone(&self.behavior);
        b.execute_action(ed, self, action, run, target)
    }

    pub fn add_row(&mut self, ed: &mut Editor, run: &ModuleRun, target: &Target, data: Map<String, Value>) -> EditResult<Option<Value>> {
        let b = Rc::clone(&self.behavior);
        b.add_row(ed, self, run, target, data)
    }

    pub fn submit_row(&mut self, ed: &mut Editor, run: &ModuleRun, target: &Target, row: PendingRow) -> EditResult<bool> {
        let b = Rc::clone(&self.behavior);
        b.submit_row(ed, self, run, target, row)
    }

    pub fn remove_row(&mut self, ed: &mut Editor, run: &ModuleRun, target: &Target, row: NodeId, id: Value) -> EditResult<Option<Value>> {
        let b = Rc::clone(&self.behavior);
        b.remove_row(ed, self, run, target, row, id)
    }

    pub fn row_added(&mut self, ed: &mut Editor, row: NodeId, id: &Value, data: &Value) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.row_added(ed, self, row, id, data)
    }

    pub fn finish(&mut self, ed: &mut Editor, run: &ModuleRun, op: &ModuleOp, result: &EditResult<Value>) -> EditResult<()> {
        let b = Rc::clone(&self.behavior);
        b.finish(ed, self, run, op, result)
    }
}

impl Editor {
    /// Module declared by `container`
    pub fn instantiate_module(&mut self, container: NodeId) -> EditResult<Module> {
        let name = self
            .dom
            .attr(container, "data-edit-module")
            .filter(|n| !n.is_empty())
            .ok_or(EditError::NoModule(container))?
            .to_string();
        let behavior = self.modules.get(&name)?;

        let mut components = HashMap::new();
        for node in self.owned(container, &Selector::has_attr("data-edit-component")) {
            if let Some(component) = self.dom.attr(node, "data-edit-component") {
                components.insert(component.to_string(), node);
            }
        }
        Ok(Module {
            name,
            behavior,
            container,
            components,
            pending_submit: Vec::new(),
            prepared: false,
        })
    }

    /// Run `action` on `module`; `report` is the submit waiting for it
    pub(crate) fn execute_module(&mut self, mut module: Module, trigger: NodeId, action: &str, report: Option<RunId>) -> EditResult<()> {
        let container = module.container;
        let run = ModuleRun {
            module: module.name().to_string(),
            action: format!("{}.{}", module.name(), action),
            trigger,
            container,
            loading_shim: module.loading_shim(),
            report,
        };
        tracing::debug!("module action {} on {}", run.action, container);
        if run.loading_shim {
            self.loading_shim(container, true)?;
        }
        // a failure before any row went out still owes every row's report
        let owed = module.pending_submit.len().max(1);

        let target = match self.instantiate_target(container, Some(trigger)) {
            Ok(target) => target,
            Err(error) => return self.module_failed(&run, error, owed),
        };
        match module.execute_action(self, action, &run, target) {
            Ok(Some(payload)) => self.signal_success(container, &run.action, payload, run.loading_shim),
            Ok(None) => Ok(()),
            Err(error) => self.module_failed(&run, error, owed),
        }
    }

    pub(crate) fn module_failed(&mut self, run: &ModuleRun, error: EditError, owed: usize) -> EditResult<()> {
        self.signal_error(run.container, &run.action, error, run.loading_shim)?;
        if let Some(report) = run.report {
            for _ in 0..owed {
                self.arrive(report, false, None)?;
            }
        }
        Ok(())
    }

    /// A request started by a module action finished
    pub(crate) fn module_target_done(&mut self, run: ModuleRun, op: ModuleOp, result: EditResult<Value>) -> EditResult<()> {
        let ok = result.is_ok();
        match &result {
            Ok(payload) => self.signal_success(run.container, &run.action, payload.clone(), run.loading_shim)?,
            Err(error) => self.signal_error(run.container, &run.action, error.clone(), run.loading_shim)?,
        }
        let mut module = self.instantiate_module(run.container)?;
        module.finish(self, &run, &op, &result)?;
        if let Some(report) = run.report {
            self.arrive(report, ok, None)?;
        }
        Ok(())
    }
}

fn rc(behavior: impl ModuleBehavior + 'static) -> Rc<dyn ModuleBehavior> {
    Rc::new(behavior)
}

struct Base;

impl ModuleBehavior for Base {}

fn register(reg: &mut Registry<dyn ModuleBehavior>) -> Result<(), ClsError> {
    reg.register("base", rc(Base))?;
    listing::register(reg)?;
    Ok(())
}

/// Registry holding every built-in module
pub fn default_modules() -> Registry<dyn ModuleBehavior> {
    Registry::builtin("module", register)
}
