//! Autocomplete input
//!
//! A text control whose value is the id of a remote choice. Typing arms a
//! debounce timer; when it fires the editor queries
//! `/autocomplete/<data-edit-autocomplete>?q=<text>` and offers the
//! results as suggestions. With `data-edit-multiple` the value is a comma
//! separated id list and each pick is shown as a removable chip.

use super::{Input, InputBehavior, InputCx, base, rc, value_text};
use crate::EditResult;
use serde_json::Value;
use std::rc::Rc;
use tc_core::{ClsError, Registry, SmartTimeout};
use tc_dom::{DomTree, El, NodeId, Selector};

/// Per-instance autocomplete state
#[derive(Debug, Default)]
pub struct AutocompleteState {
    /// Selected id (comma separated ids in multi mode)
    pub(crate) value: String,
    pub(crate) multi: bool,
    pub(crate) allow_nonexistent: bool,
    pub(crate) min_chars: usize,
    /// `.autocomplete-choices` holder in multi mode
    pub(crate) chips: Option<NodeId>,
    pub(crate) timeout: SmartTimeout,
    /// Last suggestions as `(id, text)`
    pub(crate) results: Vec<(String, String)>,
}

impl AutocompleteState {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn results(&self) -> &[(String, String)] {
        &self.results
    }

    pub fn chips(&self) -> Option<NodeId> {
        self.chips
    }
}

/// Reference tag queried for suggestions
pub(crate) fn reftag(dom: &DomTree, inp: &Input) -> String {
    dom.attr(inp.source, "data-edit-autocomplete").unwrap_or("").to_string()
}

/// Suggestions from an autocomplete response (`{"results": [{id, text}]}`)
pub(crate) fn parse_results(body: &Value) -> Vec<(String, String)> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|r| {
                    (
                        r.get("id").map(value_text).unwrap_or_default(),
                        r.get("text").map(value_text).unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// User typed into the control; returns whether the text is long enough
/// to query suggestions
pub(crate) fn typed(dom: &mut DomTree, inp: &mut Input, text: &str) -> EditResult<bool> {
    dom.set_value(inp.element, text)?;
    let Some(state) = inp.autocomplete.as_mut() else {
        return Ok(false);
    };
    if state.allow_nonexistent {
        state.value = text.to_string();
    }
    Ok(text.chars().count() >= state.min_chars)
}

/// User picked a suggestion
pub(crate) fn select_choice(dom: &mut DomTree, inp: &mut Input, id: &str, text: &str) -> EditResult<()> {
    let multi = inp.autocomplete.as_ref().is_some_and(|s| s.multi);
    if multi {
        return multi_add(dom, inp, id, text);
    }
    if let Some(state) = inp.autocomplete.as_mut() {
        state.value = id.to_string();
        state.results.clear();
    }
    dom.set_value(inp.element, text)?;
    dom.remove_class(inp.element, "invalid")?;
    dom.add_class(inp.element, "valid")?;
    Ok(())
}

fn multi_add(dom: &mut DomTree, inp: &mut Input, id: &str, text: &str) -> EditResult<()> {
    let Some(state) = inp.autocomplete.as_mut() else {
        return Ok(());
    };
    let mut selected: Vec<&str> = state.value.split(',').filter(|s| !s.is_empty()).collect();
    selected.push(id);
    state.value = selected.join(",");
    if let Some(chips) = state.chips {
        dom.build_into(
            chips,
            El::new("div")
                .class("alert autocomplete-choice alert-info")
                .attr("data-value", id)
                .attr("title", "Click to remove")
                .text(text),
        )?;
    }
    Ok(())
}

/// Drop one id from a multi selection (chip clicked)
pub(crate) fn remove_choice(dom: &mut DomTree, inp: &mut Input, id: &str) -> EditResult<()> {
    let Some(state) = inp.autocomplete.as_mut() else {
        return Ok(());
    };
    if state.value.is_empty() {
        return Ok(());
    }
    let mut selected: Vec<&str> = state.value.split(',').collect();
    if let Some(pos) = selected.iter().position(|v| *v == id) {
        selected.remove(pos);
    }
    state.value = selected.join(",");
    if let Some(chips) = state.chips {
        for chip in dom.query(chips, &Selector::attr_eq("data-value", id)) {
            dom.detach(chip)?;
        }
    }
    Ok(())
}

struct Autocomplete {
    base: Rc<dyn InputBehavior>,
}

impl InputBehavior for Autocomplete {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<NodeId> {
        let element = self.base.make(cx, inp)?;
        let multi = cx.dom.has_attr(inp.source, "data-edit-multiple");
        let min_chars = cx
            .dom
            .attr(inp.source, "data-edit-autocomplete-mincharacter")
            .and_then(|v| v.parse().ok())
            .unwrap_or(cx.config.autocomplete_min_chars);
        let chips = multi.then(|| cx.dom.build(El::new("div").class("autocomplete-choices")));
        inp.autocomplete = Some(AutocompleteState {
            multi,
            allow_nonexistent: cx.dom.has_attr(inp.source, "data-edit-autocomplete-allow-nonexistent"),
            min_chars,
            chips,
            ..Default::default()
        });
        Ok(element)
    }

    fn wire(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<()> {
        let chips = inp.autocomplete.as_ref().and_then(|s| s.chips);
        if let Some(chips) = chips {
            if cx.dom.parent(inp.element).is_some() {
                cx.dom.insert_after(inp.element, chips)?;
            }
        }
        let text = cx.dom.attr(inp.source, "data-edit-autocomplete-text").unwrap_or("").to_string();
        let value = cx.dom.attr(inp.source, "data-edit-value").unwrap_or("").to_string();
        if !text.is_empty() && !value.is_empty() {
            cx.dom.set_value(inp.element, &text)?;
            if let Some(state) = inp.autocomplete.as_mut() {
                state.value = value.clone();
            }
            inp.original_value = Value::String(value);
        }
        Ok(())
    }

    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: Option<&str>) -> EditResult<()> {
        let multi = inp.autocomplete.as_ref().is_some_and(|s| s.multi);
        let value = value.unwrap_or("");
        if multi && !value.is_empty() {
            for item in value.split(',') {
                let (id, text) = item.split_once(';').unwrap_or((item, ""));
                multi_add(cx.dom, inp, id, text)?;
            }
            return Ok(());
        }
        let (id, text) = match value.split_once(';') {
            Some((id, text)) => (id, text),
            None => ("", ""),
        };
        if let Some(state) = inp.autocomplete.as_mut() {
            state.value = id.to_string();
        }
        cx.dom.set_value(inp.element, text)?;
        inp.original_value = Value::String(id.to_string());
        Ok(())
    }

    fn get(&self, dom: &DomTree, inp: &Input) -> Value {
        let Some(state) = inp.autocomplete.as_ref() else {
            return self.base.get(dom, inp);
        };
        if state.value.is_empty() && state.allow_nonexistent {
            return Value::String(dom.value(inp.element).to_string());
        }
        Value::String(state.value.clone())
    }

    fn changed(&self, dom: &DomTree, inp: &Input) -> bool {
        inp.original_value != inp.get(dom)
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let Some(state) = inp.autocomplete.as_ref() else {
            return Ok(true);
        };
        if state.allow_nonexistent {
            return Ok(true);
        }
        let value = value_text(&inp.get(cx.dom));
        if value.is_empty() {
            return Ok(true);
        }
        let positive = |v: &str| v.trim().parse::<i64>().is_ok_and(|n| n > 0);
        Ok(if state.multi {
            value.split(',').all(positive)
        } else {
            value.trim().parse::<f64>().is_ok_and(|n| n > 0.0)
        })
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, _value: &Value) -> EditResult<()> {
        let text = cx.dom.value(inp.element).to_string();
        let value = value_text(&inp.get(cx.dom));
        cx.dom.set_attr(inp.source, "data-edit-autocomplete-text", &text)?;
        cx.dom.set_attr(inp.source, "data-edit-value", &value)?;
        cx.dom.set_text(inp.source, &text)?;
        Ok(())
    }

    fn reset(&self, cx: &mut InputCx<'_>, inp: &mut Input, reset_value: bool) -> EditResult<()> {
        if !reset_value {
            return Ok(());
        }
        base::reset(cx, inp, true)?;
        let chips = match inp.autocomplete.as_mut() {
            Some(state) => {
                state.value.clear();
                state.results.clear();
                if state.multi { state.chips } else { None }
            }
            None => None,
        };
        if let Some(chips) = chips {
            cx.dom.clear(chips)?;
        }
        Ok(())
    }
}

pub(super) fn register(reg: &mut Registry<dyn InputBehavior>) -> Result<(), ClsError> {
    reg.extend("autocomplete", "string", |base| rc(Autocomplete { base }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_results() {
        let body = json!({"results": [{"id": 20, "text": "Equinix FR5"}, {"id": "7", "text": "Telehouse"}]});
        assert_eq!(
            parse_results(&body),
            vec![("20".to_string(), "Equinix FR5".to_string()), ("7".to_string(), "Telehouse".to_string())]
        );
        assert!(parse_results(&json!({})).is_empty());
    }
}
