//! Listing modules
//!
//! `listing` maintains a list of rows (component `list`) with an optional
//! add form (component `add`). Rows are built from the list's
//! `data-edit-template`; changed rows are collected on submit. The plain
//! listing only updates the page. `api_listing` persists every add,
//! update and remove through the container's `api` target.

use super::{Module, ModuleBehavior, ModuleOp, ModuleRun, PendingRow, rc};
use crate::editor::Then;
use crate::input::value_text;
use crate::{EditError, EditResult, Editor, Event, Target};
use serde_json::{Map, Value};
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{NodeId, Selector};

fn list(m: &Module) -> EditResult<NodeId> {
    m.component("list").ok_or_else(|| EditError::UnknownModuleAction {
        module: m.name().to_string(),
        action: "list".into(),
    })
}

/// Row id as stored in `data-edit-id` (numeric when it parses)
fn row_id(raw: &str) -> Value {
    raw.parse::<i64>().map_or_else(|_| Value::String(raw.to_string()), Value::from)
}

/// Append a row for `data` to the list
pub(crate) fn listing_add(ed: &mut Editor, m: &mut Module, id: &Value, data: &Value) -> EditResult<NodeId> {
    let list = list(m)?;
    let template = ed.dom.attr(list, "data-edit-template").unwrap_or("").to_string();
    let row = ed.templates.copy(&mut ed.dom, &template)?;
    ed.dom.set_attr(row, "data-edit-id", &value_text(id))?;
    if let Some(fields) = data.as_object() {
        for (name, value) in fields {
            let text = value_text(value);
            for node in ed.dom.query(row, &Selector::attr_eq("data-edit-name", name)) {
                ed.dom.set_text(node, &text)?;
                ed.dom.set_attr(node, "data-edit-value", &text)?;
            }
        }
    }
    ed.dom.append_child(list, row)?;
    ed.dom.add_class(row, "newrow")?;
    ed.sync(m.container)?;
    ed.emit(Event::RowAdd {
        container: m.container,
        row,
        id: id.clone(),
        data: data.clone(),
    });
    m.row_added(ed, row, id, data)?;
    Ok(row)
}

pub(crate) fn listing_remove(ed: &mut Editor, m: &Module, row: NodeId, id: &Value) -> EditResult<()> {
    ed.dom.detach(row)?;
    ed.emit(Event::RowRemove {
        container: m.container,
        row,
        id: id.clone(),
    });
    Ok(())
}

pub(crate) fn listing_submit(ed: &mut Editor, m: &Module, row: &PendingRow) -> EditResult<()> {
    ed.emit(Event::RowSubmit {
        container: m.container,
        row: row.row,
        id: row.id.clone(),
        data: Value::Object(row.data.clone()),
    });
    if ed.dom.has_class(m.container, "always") {
        ed.accept_values(list(m)?)?;
    }
    Ok(())
}

struct Listing {
    base: Rc<dyn ModuleBehavior>,
}

impl ModuleBehavior for Listing {
    fn parent(&self) -> Option<&dyn ModuleBehavior> {
        Some(&*self.base)
    }

    fn init(&self, ed: &mut Editor, m: &mut Module) -> EditResult<()> {
        let Some(add) = m.component("add") else {
            return Ok(());
        };
        if let Some(template) = ed.dom.attr(add, "data-edit-template").map(str::to_string) {
            let form = ed.templates.copy(&mut ed.dom, &template)?;
            ed.dom.prepend_child(add, form)?;
        }
        Ok(())
    }

    fn prepare(&self, ed: &mut Editor, m: &mut Module) -> EditResult<()> {
        if m.prepared {
            return Ok(());
        }
        let list = list(m)?;
        let typed = Selector::has_attr("data-edit-type");
        let mut pending = Vec::new();
        for row in ed.dom.element_children(list) {
            let fields: Vec<NodeId> = ed
                .owned(list, &typed)
                .into_iter()
                .filter(|f| ed.dom.ancestors(*f).contains(&row))
                .collect();
            if !fields.iter().any(|f| ed.field_changed(*f)) {
                continue;
            }
            let mut data = Map::new();
            ed.export_fields(&fields, &mut data)?;
            ed.collect_payload(row, &mut data)?;
            let id = row_id(ed.dom.attr(row, "data-edit-id").unwrap_or(""));
            pending.push(PendingRow { row, id, data });
        }
        m.pending_submit = pending;
        self.base.prepare(ed, m)
    }

    fn execute_action(&self, ed: &mut Editor, m: &mut Module, action: &str, run: &ModuleRun, target: Target) -> EditResult<Option<Value>> {
        match action {
            "submit" => {
                m.prepare(ed)?;
                let rows = std::mem::take(&mut m.pending_submit);
                if rows.is_empty() {
                    return Ok(Some(Value::Null));
                }
                let mut in_flight = false;
                let mut failed = false;
                for row in rows {
                    match m.submit_row(ed, run, &target, row) {
                        Ok(true) => {
                            if let Some(report) = run.report {
                                ed.arrive(report, true, None)?;
                            }
                        }
                        Ok(false) => in_flight = true,
                        Err(error) => {
                            failed = true;
                            ed.module_failed(run, error, 1)?;
                        }
                    }
                }
                // a failed row was already signalled; never report success after it
                Ok((!in_flight && !failed).then_some(Value::Null))
            }
            "add" => {
                let mut data = Map::new();
                if let Some(add) = m.component("add") {
                    ed.export(add, &mut data)?;
                }
                m.add_row(ed, run, &target, data)
            }
            "remove" => {
                let Some(row) = ed.dom.closest(run.trigger, |e| e.attrs.has("data-edit-id")) else {
                    return Ok(Some(Value::Null));
                };
                let id = row_id(ed.dom.attr(row, "data-edit-id").unwrap_or(""));
                m.remove_row(ed, run, &target, row, id)
            }
            _ => self.base.execute_action(ed, m, action, run, target),
        }
    }

    fn add_row(&self, ed: &mut Editor, m: &mut Module, _run: &ModuleRun, _target: &Target, data: Map<String, Value>) -> EditResult<Option<Value>> {
        let data = Value::Object(data);
        listing_add(ed, m, &Value::Null, &data)?;
        Ok(Some(Value::Null))
    }

    fn submit_row(&self, ed: &mut Editor, m: &mut Module, _run: &ModuleRun, _target: &Target, row: PendingRow) -> EditResult<bool> {
        listing_submit(ed, m, &row)?;
        Ok(true)
    }

    fn remove_row(&self, ed: &mut Editor, m: &mut Module, _run: &ModuleRun, _target: &Target, row: NodeId, id: Value) -> EditResult<Option<Value>> {
        listing_remove(ed, m, row, &id)?;
        Ok(Some(id))
    }
}

/// Listing whose rows live behind the REST api
struct ApiListing {
    base: Rc<dyn ModuleBehavior>,
}

impl ModuleBehavior for ApiListing {
    fn parent(&self) -> Option<&dyn ModuleBehavior> {
        Some(&*self.base)
    }

    fn loading_shim(&self) -> bool {
        true
    }

    fn add_row(&self, ed: &mut Editor, m: &mut Module, run: &ModuleRun, target: &Target, data: Map<String, Value>) -> EditResult<Option<Value>> {
        let mut target = target.clone();
        target.data = data;
        target.set_arg(2, "update");
        target.context = Some(m.component("add").unwrap_or(m.container));
        ed.clear_error_popins(m.container)?;
        ed.dispatch(
            target,
            None,
            Then::Module {
                run: run.clone(),
                op: ModuleOp::Add,
            },
        )?;
        Ok(None)
    }

    fn submit_row(&self, ed: &mut Editor, _m: &mut Module, run: &ModuleRun, target: &Target, row: PendingRow) -> EditResult<bool> {
        let mut target = target.clone();
        target.data = row.data;
        target.data.insert("_id".into(), row.id.clone());
        target.set_arg(2, "update");
        target.context = Some(row.row);
        ed.dispatch(
            target,
            None,
            Then::Module {
                run: run.clone(),
                op: ModuleOp::Update { row: row.row, id: row.id },
            },
        )?;
        Ok(false)
    }

    fn remove_row(&self, ed: &mut Editor, _m: &mut Module, run: &ModuleRun, target: &Target, row: NodeId, id: Value) -> EditResult<Option<Value>> {
        let label = ed.dom.attr(row, "data-edit-label").unwrap_or("").to_string();
        if !ed.confirm(&format!("Remove {}", label)) {
            return Ok(Some(Value::String("Canceled".into())));
        }
        let mut target = target.clone();
        target.set_arg(2, "delete");
        target.data = Map::new();
        target.data.insert("_id".into(), id.clone());
        ed.dispatch(
            target,
            None,
            Then::Module {
                run: run.clone(),
                op: ModuleOp::Remove { row, id },
            },
        )?;
        Ok(None)
    }

    fn row_added(&self, ed: &mut Editor, m: &mut Module, row: NodeId, _id: &Value, data: &Value) -> EditResult<()> {
        for node in ed.dom.query(row, &Selector::parse("[data-sort-name], [data-filter-name]")?) {
            if let Some(name) = ed.dom.attr(node, "data-filter-name").map(str::to_string) {
                let value = data.get(&name).map(value_text).unwrap_or_default();
                ed.dom.set_attr(node, "data-filter-value", &value)?;
            }
            if let Some(name) = ed.dom.attr(node, "data-sort-name").map(str::to_string) {
                let value = data.get(&name).map(value_text).unwrap_or_default();
                ed.dom.set_attr(node, "data-sort-value", &value)?;
            }
        }
        ed.dom.show(row)?;
        let status = data.get("status").map(value_text).unwrap_or_default();
        ed.dom.add_class(row, &format!("status-{}", status))?;
        if let Some(add) = m.component("add") {
            ed.reset(add)?;
        }
        Ok(())
    }

    fn finish(&self, ed: &mut Editor, m: &mut Module, _run: &ModuleRun, op: &ModuleOp, result: &EditResult<Value>) -> EditResult<()> {
        let Ok(payload) = result else {
            return Ok(());
        };
        match op {
            ModuleOp::Add => {
                let id = payload.get("id").cloned().unwrap_or(Value::Null);
                listing_add(ed, m, &id, payload)?;
            }
            ModuleOp::Update { row, id } => {
                let data = payload.as_object().cloned().unwrap_or_default();
                listing_submit(
                    ed,
                    m,
                    &PendingRow {
                        row: *row,
                        id: id.clone(),
                        data,
                    },
                )?;
            }
            ModuleOp::Remove { row, id } => listing_remove(ed, m, *row, id)?,
        }
        Ok(())
    }
}

pub(super) fn register(reg: &mut Registry<dyn ModuleBehavior>) -> Result<(), ClsError> {
    reg.extend("listing", "base", |base| rc(Listing { base }))?;
    reg.extend("api_listing", "listing", |base| rc(ApiListing { base }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_id() {
        assert_eq!(row_id("12"), json!(12));
        assert_eq!(row_id("abc"), json!("abc"));
        assert_eq!(row_id(""), json!(""));
    }
}
