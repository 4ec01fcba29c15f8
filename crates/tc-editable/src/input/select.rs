//! Select inputs
//!
//! Options come from a data set named by `data-edit-data`. Setting the
//! input requests that set; once it is available `load` fills the options
//! and the current selection becomes the baseline for change detection.

use super::{Effect, Input, InputBehavior, InputCx, rc, value_text};
use crate::EditResult;
use serde_json::{Value, json};
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{DomTree, El, NodeId};

fn is_multiple(dom: &DomTree, inp: &Input) -> bool {
    dom.attr(inp.source, "data-edit-multiple") == Some("yes")
}

/// Labels of the selected options, comma separated
pub(super) fn value_to_label(dom: &DomTree, inp: &Input) -> String {
    dom.options(inp.element)
        .into_iter()
        .filter(|o| dom.selected(*o))
        .map(|o| dom.text_content(o))
        .collect::<Vec<_>>()
        .join(", ")
}

fn add_opt(cx: &mut InputCx<'_>, inp: &Input, id: &str, name: &str) -> EditResult<()> {
    let current = cx.dom.attr(inp.source, "data-edit-value").unwrap_or("").to_string();
    let selected = if is_multiple(cx.dom, inp) {
        !current.is_empty() && current.split(',').any(|v| v == id)
    } else {
        id == current
    };
    let opt = cx.dom.build(El::new("option").value(id).text(name).selected(selected));
    inp.finalize_opt(cx.dom, opt)?;
    cx.dom.append_child(inp.element, opt)?;
    Ok(())
}

/// `{id, name}` entries of a data set given as array or object
fn entries(data: &Value) -> Vec<(String, String)> {
    let items: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|v| {
            (
                v.get("id").map(value_text).unwrap_or_default(),
                v.get("name").map(value_text).unwrap_or_default(),
            )
        })
        .collect()
}

struct Select {
    base: Rc<dyn InputBehavior>,
}

impl InputBehavior for Select {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<NodeId> {
        let mut el = El::new("select");
        if is_multiple(cx.dom, inp) {
            el = el.attr("multiple", "multiple");
        }
        if let Some(data_id) = cx.dom.attr(inp.source, "data-edit-data") {
            el = el.attr("data-edit-data", data_id);
        }
        Ok(cx.dom.build(el))
    }

    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, _value: Option<&str>) -> EditResult<()> {
        if let Some(data_id) = cx.dom.attr(inp.source, "data-edit-data") {
            cx.effects.push(Effect::LoadOptions {
                field: inp.source,
                data_id: data_id.to_string(),
            });
        }
        Ok(())
    }

    fn get(&self, dom: &DomTree, inp: &Input) -> Value {
        let values = dom.selected_values(inp.element);
        if is_multiple(dom, inp) {
            Value::Array(values.into_iter().map(Value::String).collect())
        } else {
            Value::String(values.into_iter().next().unwrap_or_default())
        }
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, _value: &Value) -> EditResult<()> {
        let value = value_text(&inp.get(cx.dom));
        let label = value_to_label(cx.dom, inp);
        cx.dom.set_attr(inp.source, "data-edit-value", &value)?;
        cx.dom.set_text(inp.source, &label)?;
        Ok(())
    }

    fn load(&self, cx: &mut InputCx<'_>, inp: &mut Input, data: &Value) -> EditResult<()> {
        cx.dom.clear(inp.element)?;
        let all_entry = cx
            .dom
            .attr(inp.source, "data-edit-data-all-entry")
            .map(|e| match e.split_once(':') {
                Some((id, name)) => (id.to_string(), name.to_string()),
                None => (e.to_string(), String::new()),
            });
        if let Some((id, name)) = &all_entry {
            add_opt(cx, inp, id, name)?;
        }

        let mut items = entries(data);
        if cx.dom.attr(inp.source, "data-edit-sorted") == Some("yes") {
            items.sort_by(|a, b| a.1.cmp(&b.1));
        }
        for (id, name) in items {
            if all_entry.as_ref().is_some_and(|(all, _)| *all == id) {
                continue;
            }
            add_opt(cx, inp, &id, &name)?;
        }
        inp.changed_by_user(cx)
    }
}

/// Three way yes / no select that requires a choice
struct MandatoryBool {
    base: Rc<dyn InputBehavior>,
}

impl InputBehavior for MandatoryBool {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<NodeId> {
        let node = self.base.make(cx, inp)?;
        cx.dom.set_attr(inp.source, "data-edit-required", "yes")?;
        Ok(node)
    }

    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, _value: Option<&str>) -> EditResult<()> {
        inp.load(cx, &Value::Null)
    }

    fn load(&self, cx: &mut InputCx<'_>, inp: &mut Input, _data: &Value) -> EditResult<()> {
        let choices = json!([
            {"id": "", "name": "-"},
            {"id": "1", "name": "Yes"},
            {"id": "0", "name": "No"},
        ]);
        self.base.load(cx, inp, &choices)
    }
}

/// Select that forces the user away from values listed in
/// `data-edit-bad-values` (`;` separated)
struct DataQualitySelect {
    base: Rc<dyn InputBehavior>,
}

impl DataQualitySelect {
    fn bad_values(dom: &DomTree, inp: &Input) -> Vec<String> {
        dom.attr(inp.source, "data-edit-bad-values")
            .map(|v| v.split(';').filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn is_bad(dom: &DomTree, inp: &Input, value: &str) -> bool {
        Self::bad_values(dom, inp).iter().any(|b| b == value)
    }

    /// Flag the control while it holds a bad value
    fn mark(dom: &mut DomTree, inp: &Input) -> EditResult<bool> {
        let bad = Self::is_bad(dom, inp, &value_text(&inp.get(dom)));
        if bad {
            dom.add_class(inp.element, "invalid-choice")?;
        } else {
            dom.remove_class(inp.element, "invalid-choice")?;
        }
        Ok(bad)
    }
}

impl InputBehavior for DataQualitySelect {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn wire(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<()> {
        Self::mark(cx.dom, inp)?;
        Ok(())
    }

    fn changed_by_user(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<()> {
        Self::mark(cx.dom, inp)?;
        Ok(())
    }

    fn changed(&self, dom: &DomTree, inp: &Input) -> bool {
        Self::is_bad(dom, inp, &value_text(&inp.get(dom))) || self.base.changed(dom, inp)
    }

    fn finalize_opt(&self, dom: &mut DomTree, inp: &Input, opt: NodeId) -> EditResult<()> {
        if Self::is_bad(dom, inp, dom.value(opt)) {
            dom.add_class(opt, "invalid-choice")?;
        }
        Ok(())
    }

    fn load(&self, cx: &mut InputCx<'_>, inp: &mut Input, data: &Value) -> EditResult<()> {
        let bad = Self::bad_values(cx.dom, inp);
        let current = cx.dom.attr(inp.source, "data-edit-value").unwrap_or("");
        if bad.is_empty() || bad.iter().any(|b| b == current) {
            return self.base.load(cx, inp, data);
        }
        let kept: Vec<Value> = entries(data)
            .into_iter()
            .filter(|(id, _)| !bad.contains(id))
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect();
        self.base.load(cx, inp, &Value::Array(kept))
    }
}

pub(super) fn register(reg: &mut Registry<dyn InputBehavior>) -> Result<(), ClsError> {
    reg.extend("select", "base", |base| rc(Select { base }))?;
    reg.extend("mandatory_bool", "select", |base| rc(MandatoryBool { base }))?;
    reg.extend("data_quality_select", "select", |base| rc(DataQualitySelect { base }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_from_array_and_object() {
        let arr = json!([{"id": 1, "name": "Europe"}, {"id": "2", "name": "Asia"}]);
        assert_eq!(entries(&arr), vec![("1".into(), "Europe".into()), ("2".into(), "Asia".into())]);
        let obj = json!({"a": {"id": "x", "name": "X"}});
        assert_eq!(entries(&obj), vec![("x".into(), "X".into())]);
        assert!(entries(&json!(null)).is_empty());
    }
}
